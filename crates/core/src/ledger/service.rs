//! Settlement transitions.
//!
//! Pure functions: each returns a [`Settlement`] describing the new
//! transaction row and the credit-limit delta to apply with it. A store
//! commits both as one unit (see [`LedgerStore::commit_settlement`]).
//!
//! [`LedgerStore::commit_settlement`]: super::store::LedgerStore::commit_settlement

use chrono::NaiveDate;
use cofre_shared::types::{Money, WalletId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::transaction::{Transaction, TransactionStatus};
use super::wallet::Wallet;
use crate::obligation::Flow;

/// Signed change to a wallet's `card_limit_used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitDelta {
    /// Credit-card wallet.
    pub wallet_id: WalletId,
    /// Positive draws, negative releases.
    pub amount: Money,
}

/// Outcome of a transition, ready to be committed atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// New transaction row, version already bumped.
    pub transaction: Transaction,
    /// Version the transition was computed from.
    pub expected_version: i64,
    /// Limit change to apply in the same unit.
    pub limit_delta: Option<LimitDelta>,
}

/// Stateless service for pay/receive transitions.
pub struct LedgerService;

impl LedgerService {
    /// Marks an expense transaction as paid.
    ///
    /// Pending (including overdue) only. When the wallet is a credit card the
    /// amount is drawn on its limit and recorded on the transaction so that
    /// `mark_unpaid` releases exactly the same amount.
    ///
    /// # Errors
    ///
    /// - `AlreadyPaid` if the transaction is already settled
    /// - `TransactionCancelled` if it was cancelled
    /// - `WrongFlow` for an income transaction, `WalletMismatch` for a foreign wallet
    pub fn mark_paid(
        transaction: &Transaction,
        wallet: &Wallet,
        paid_at: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Settlement, LedgerError> {
        Self::require_flow(transaction, Flow::Expense)?;
        if wallet.id != transaction.wallet_id {
            return Err(LedgerError::WalletMismatch {
                transaction_id: transaction.id,
                wallet_id: wallet.id,
            });
        }

        match transaction.status {
            TransactionStatus::Pending => {}
            TransactionStatus::Settled => return Err(LedgerError::AlreadyPaid(transaction.id)),
            TransactionStatus::Cancelled => {
                return Err(LedgerError::TransactionCancelled(transaction.id));
            }
        }

        let limit_drawn = wallet.is_credit_card().then_some(transaction.amount);
        let limit_delta = limit_drawn.map(|amount| LimitDelta {
            wallet_id: wallet.id,
            amount,
        });

        Ok(Self::settle(
            transaction,
            Some(paid_at.unwrap_or(today)),
            limit_drawn,
            limit_delta,
        ))
    }

    /// Reverts a paid expense transaction to pending.
    ///
    /// Releases exactly the amount drawn when it was paid, if any.
    ///
    /// # Errors
    ///
    /// - `NotPaid` if the transaction is pending
    /// - `TransactionCancelled` if it was cancelled
    /// - `WrongFlow` for an income transaction
    pub fn mark_unpaid(transaction: &Transaction) -> Result<Settlement, LedgerError> {
        Self::require_flow(transaction, Flow::Expense)?;

        match transaction.status {
            TransactionStatus::Settled => {}
            TransactionStatus::Pending => return Err(LedgerError::NotPaid(transaction.id)),
            TransactionStatus::Cancelled => {
                return Err(LedgerError::TransactionCancelled(transaction.id));
            }
        }

        let limit_delta = transaction.limit_drawn.map(|drawn| LimitDelta {
            wallet_id: transaction.wallet_id,
            amount: -drawn,
        });

        Ok(Self::reopen(transaction, limit_delta))
    }

    /// Marks an income transaction as received. Never touches a card limit.
    ///
    /// # Errors
    ///
    /// - `AlreadyReceived` if the transaction is already settled
    /// - `TransactionCancelled` if it was cancelled
    /// - `WrongFlow` for an expense transaction
    pub fn mark_received(
        transaction: &Transaction,
        received_at: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Settlement, LedgerError> {
        Self::require_flow(transaction, Flow::Income)?;

        match transaction.status {
            TransactionStatus::Pending => {}
            TransactionStatus::Settled => {
                return Err(LedgerError::AlreadyReceived(transaction.id));
            }
            TransactionStatus::Cancelled => {
                return Err(LedgerError::TransactionCancelled(transaction.id));
            }
        }

        Ok(Self::settle(
            transaction,
            Some(received_at.unwrap_or(today)),
            None,
            None,
        ))
    }

    /// Reverts a received income transaction to pending.
    ///
    /// # Errors
    ///
    /// - `NotReceived` if the transaction is pending
    /// - `TransactionCancelled` if it was cancelled
    /// - `WrongFlow` for an expense transaction
    pub fn mark_not_received(transaction: &Transaction) -> Result<Settlement, LedgerError> {
        Self::require_flow(transaction, Flow::Income)?;

        match transaction.status {
            TransactionStatus::Settled => Ok(Self::reopen(transaction, None)),
            TransactionStatus::Pending => Err(LedgerError::NotReceived(transaction.id)),
            TransactionStatus::Cancelled => Err(LedgerError::TransactionCancelled(transaction.id)),
        }
    }

    /// Cancels a pending transaction of either flow.
    ///
    /// # Errors
    ///
    /// - `AlreadyPaid` / `AlreadyReceived` if the transaction is settled
    /// - `TransactionCancelled` if it is already cancelled
    pub fn cancel(transaction: &Transaction) -> Result<Settlement, LedgerError> {
        match (transaction.status, transaction.flow()) {
            (TransactionStatus::Pending, _) => {
                let mut next = transaction.clone();
                next.status = TransactionStatus::Cancelled;
                next.version += 1;
                Ok(Settlement {
                    transaction: next,
                    expected_version: transaction.version,
                    limit_delta: None,
                })
            }
            (TransactionStatus::Settled, Flow::Expense) => {
                Err(LedgerError::AlreadyPaid(transaction.id))
            }
            (TransactionStatus::Settled, Flow::Income) => {
                Err(LedgerError::AlreadyReceived(transaction.id))
            }
            (TransactionStatus::Cancelled, _) => {
                Err(LedgerError::TransactionCancelled(transaction.id))
            }
        }
    }

    fn require_flow(transaction: &Transaction, expected: Flow) -> Result<(), LedgerError> {
        let actual = transaction.flow();
        if actual == expected {
            Ok(())
        } else {
            Err(LedgerError::WrongFlow {
                transaction_id: transaction.id,
                expected,
                actual,
            })
        }
    }

    fn settle(
        transaction: &Transaction,
        settled_at: Option<NaiveDate>,
        limit_drawn: Option<Money>,
        limit_delta: Option<LimitDelta>,
    ) -> Settlement {
        let mut next = transaction.clone();
        next.status = TransactionStatus::Settled;
        next.settled_at = settled_at;
        next.limit_drawn = limit_drawn;
        next.version += 1;

        Settlement {
            transaction: next,
            expected_version: transaction.version,
            limit_delta,
        }
    }

    fn reopen(transaction: &Transaction, limit_delta: Option<LimitDelta>) -> Settlement {
        let mut next = transaction.clone();
        next.status = TransactionStatus::Pending;
        next.settled_at = None;
        next.limit_drawn = None;
        next.version += 1;

        Settlement {
            transaction: next,
            expected_version: transaction.version,
            limit_delta,
        }
    }
}
