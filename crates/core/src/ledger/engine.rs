//! Settlement engine: transitions wired to a store.

use chrono::NaiveDate;
use cofre_shared::types::TransactionId;
use tracing::{info, warn};

use super::error::LedgerError;
use super::service::{LedgerService, Settlement};
use super::store::LedgerStore;
use super::transaction::Transaction;
use crate::clock::Clock;
use crate::obligation::{ObligationService, RecurringObligation};

/// Loads, validates and commits settlement transitions.
///
/// Never retries: a `ConcurrentModification` from the store is returned
/// unchanged so the caller decides whether to reload and try again.
pub struct SettlementEngine<S, C> {
    store: S,
    clock: C,
}

impl<S: LedgerStore, C: Clock> SettlementEngine<S, C> {
    /// Creates an engine over a store and a clock.
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Marks an expense transaction paid, on `paid_at` or today.
    ///
    /// # Errors
    ///
    /// Any [`LedgerService::mark_paid`] error, or a store error.
    pub fn pay(
        &self,
        id: TransactionId,
        paid_at: Option<NaiveDate>,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.store.load_transaction(id)?;
        let wallet = self.store.load_wallet(transaction.wallet_id)?;
        let settlement =
            LedgerService::mark_paid(&transaction, &wallet, paid_at, self.clock.today())?;
        self.commit(settlement, "paid")
    }

    /// Reverts a paid expense transaction.
    ///
    /// # Errors
    ///
    /// Any [`LedgerService::mark_unpaid`] error, or a store error.
    pub fn unpay(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        let transaction = self.store.load_transaction(id)?;
        let settlement = LedgerService::mark_unpaid(&transaction)?;
        self.commit(settlement, "unpaid")
    }

    /// Marks an income transaction received, on `received_at` or today.
    ///
    /// # Errors
    ///
    /// Any [`LedgerService::mark_received`] error, or a store error.
    pub fn receive(
        &self,
        id: TransactionId,
        received_at: Option<NaiveDate>,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.store.load_transaction(id)?;
        let settlement =
            LedgerService::mark_received(&transaction, received_at, self.clock.today())?;
        self.commit(settlement, "received")
    }

    /// Reverts a received income transaction.
    ///
    /// # Errors
    ///
    /// Any [`LedgerService::mark_not_received`] error, or a store error.
    pub fn unreceive(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        let transaction = self.store.load_transaction(id)?;
        let settlement = LedgerService::mark_not_received(&transaction)?;
        self.commit(settlement, "not_received")
    }

    /// Cancels every still-pending child of a parent being cancelled.
    /// Settled children are kept as history.
    ///
    /// Returns the number of cancelled transactions.
    ///
    /// # Errors
    ///
    /// The first store error; children cancelled before it stay cancelled.
    pub fn cancel_pending<O: RecurringObligation + ?Sized>(
        &self,
        parent: &O,
    ) -> Result<usize, LedgerError> {
        let children = self.store.load_children(parent.parent())?;
        let pending = ObligationService::pending_to_cancel(&children);

        for transaction in &pending {
            let settlement = LedgerService::cancel(transaction)?;
            self.commit(settlement, "cancelled")?;
        }
        Ok(pending.len())
    }

    fn commit(
        &self,
        settlement: Settlement,
        action: &'static str,
    ) -> Result<Transaction, LedgerError> {
        let transaction_id = settlement.transaction.id;
        if let Err(err) = self.store.commit_settlement(&settlement) {
            let err = LedgerError::from(err);
            if err.is_retryable() {
                warn!(%transaction_id, action, "settlement lost a concurrent update");
            }
            return Err(err);
        }

        info!(
            %transaction_id,
            wallet_id = %settlement.transaction.wallet_id,
            action,
            limit_delta = settlement.limit_delta.map(|d| d.amount.cents()),
            "transaction settled"
        );
        Ok(settlement.transaction)
    }
}
