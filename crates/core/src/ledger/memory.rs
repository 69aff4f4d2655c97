//! In-memory [`LedgerStore`].
//!
//! Rows live in `DashMap`s, so a write holds the entry lock for exactly the
//! row it touches. A settlement locks the transaction row, then the wallet
//! row; nothing locks them in the opposite order.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use cofre_shared::types::{Money, TransactionId, UserId, WalletId};
use dashmap::DashMap;

use super::error::StoreError;
use super::service::Settlement;
use super::store::LedgerStore;
use super::transaction::Transaction;
use super::wallet::Wallet;
use crate::generator::TransactionDraft;
use crate::obligation::ParentRef;

/// Thread-safe store backed by concurrent hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: DashMap<TransactionId, Transaction>,
    wallets: DashMap<WalletId, Wallet>,
    due_dates: DashMap<ParentRef, BTreeSet<NaiveDate>>,
    // Serializes batch inserts so the duplicate check and the insert are one step.
    insert_lock: Mutex<()>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a wallet.
    pub fn insert_wallet(&self, wallet: Wallet) {
        self.wallets.insert(wallet.id, wallet);
    }

    /// Adds or replaces a transaction as-is, bypassing draft validation.
    pub fn insert_transaction(&self, transaction: Transaction) {
        self.due_dates
            .entry(transaction.parent)
            .or_default()
            .insert(transaction.due_date);
        self.transactions.insert(transaction.id, transaction);
    }
}

impl LedgerStore for MemoryStore {
    fn load_children(&self, parent: ParentRef) -> Result<Vec<Transaction>, StoreError> {
        let mut children: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|row| row.parent == parent)
            .map(|row| row.value().clone())
            .collect();
        children.sort_by_key(|tx| tx.due_date);
        Ok(children)
    }

    fn save_drafts(&self, drafts: &[TransactionDraft]) -> Result<Vec<Transaction>, StoreError> {
        let _guard = self
            .insert_lock
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut seen: BTreeSet<(ParentRef, NaiveDate)> = BTreeSet::new();
        for draft in drafts {
            let taken = self
                .due_dates
                .get(&draft.parent)
                .is_some_and(|dates| dates.contains(&draft.due_date));
            if taken || !seen.insert((draft.parent, draft.due_date)) {
                return Err(StoreError::DuplicateDueDate {
                    parent: draft.parent,
                    due_date: draft.due_date,
                });
            }
        }

        let saved: Vec<Transaction> = drafts.iter().map(Transaction::from_draft).collect();
        for tx in &saved {
            self.insert_transaction(tx.clone());
        }
        Ok(saved)
    }

    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
        self.transactions
            .get(&id)
            .map(|row| row.value().clone())
            .ok_or(StoreError::transaction_not_found(id))
    }

    fn update_transaction(
        &self,
        transaction: &Transaction,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut row = self
            .transactions
            .get_mut(&transaction.id)
            .ok_or(StoreError::transaction_not_found(transaction.id))?;
        if row.version != expected_version {
            return Err(StoreError::ConcurrentModification {
                entity: "transaction",
                id: transaction.id.into_inner(),
            });
        }
        if let Some(field) = row.ledger_owned_change(transaction) {
            return Err(StoreError::LedgerOwnedField {
                id: transaction.id.into_inner(),
                field,
            });
        }

        let mut next = transaction.clone();
        next.version = expected_version + 1;
        *row = next;
        Ok(())
    }

    fn load_wallet(&self, id: WalletId) -> Result<Wallet, StoreError> {
        self.wallets
            .get(&id)
            .map(|row| row.value().clone())
            .ok_or(StoreError::wallet_not_found(id))
    }

    fn update_wallet_limit(&self, id: WalletId, new_used: Money) -> Result<(), StoreError> {
        let mut wallet = self
            .wallets
            .get_mut(&id)
            .ok_or(StoreError::wallet_not_found(id))?;
        let line = wallet
            .credit_line
            .as_mut()
            .ok_or(StoreError::NotCreditCard(id))?;
        line.used = new_used;
        Ok(())
    }

    fn commit_settlement(&self, settlement: &Settlement) -> Result<(), StoreError> {
        let id = settlement.transaction.id;
        let mut row = self
            .transactions
            .get_mut(&id)
            .ok_or(StoreError::transaction_not_found(id))?;
        if row.version != settlement.expected_version {
            return Err(StoreError::ConcurrentModification {
                entity: "transaction",
                id: id.into_inner(),
            });
        }

        if let Some(delta) = settlement.limit_delta {
            let mut wallet = self
                .wallets
                .get_mut(&delta.wallet_id)
                .ok_or(StoreError::wallet_not_found(delta.wallet_id))?;
            // A wallet that stopped being a card has no counter left to release.
            if let Some(line) = wallet.credit_line.as_mut() {
                line.used = line
                    .used
                    .checked_add(delta.amount)
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }

        *row = settlement.transaction.clone();
        Ok(())
    }

    fn load_wallets(&self, owner: UserId) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .wallets
            .iter()
            .filter(|row| row.owner_id == owner)
            .map(|row| row.value().clone())
            .collect())
    }

    fn load_transactions(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|row| row.owner_id == owner)
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by_key(|tx| (tx.due_date, tx.id));
        Ok(rows)
    }
}
