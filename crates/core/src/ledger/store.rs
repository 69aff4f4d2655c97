//! Persistence collaborator seam.

use std::sync::Arc;

use cofre_shared::types::{Money, TransactionId, UserId, WalletId};

use super::error::StoreError;
use super::service::Settlement;
use super::transaction::Transaction;
use super::wallet::Wallet;
use crate::generator::TransactionDraft;
use crate::obligation::ParentRef;

/// Key-addressed store for transactions and wallets.
///
/// Implementations must make [`commit_settlement`](Self::commit_settlement)
/// atomic: the version-checked transaction write and the limit delta either
/// both land or neither does. Limit deltas are applied as increments, never
/// as a read-then-write of the whole wallet.
pub trait LedgerStore: Send + Sync {
    /// Children of a parent, ordered by due date.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on storage failure.
    fn load_children(&self, parent: ParentRef) -> Result<Vec<Transaction>, StoreError>;

    /// Persists drafts as pending transactions.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDueDate` if any draft repeats a due date already
    /// materialized for its parent (or another draft in the batch); nothing
    /// is written in that case.
    fn save_drafts(&self, drafts: &[TransactionDraft]) -> Result<Vec<Transaction>, StoreError>;

    /// Loads one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError>;

    /// Overwrites a transaction if its stored version is `expected_version`.
    /// The stored row ends at `expected_version + 1`.
    ///
    /// Only descriptive fields may change. Parent, owner, wallet, amount, due
    /// date, installment labels and settlement state belong to the generator
    /// and to [`commit_settlement`](Self::commit_settlement).
    ///
    /// # Errors
    ///
    /// Returns `LedgerOwnedField` if a protected field differs,
    /// `ConcurrentModification` on a version mismatch, `NotFound` if missing.
    fn update_transaction(
        &self,
        transaction: &Transaction,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Loads one wallet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    fn load_wallet(&self, id: WalletId) -> Result<Wallet, StoreError>;

    /// Sets `card_limit_used` outright. Used for repair after an audit.
    ///
    /// # Errors
    ///
    /// Returns `NotCreditCard` for wallets without a credit line.
    fn update_wallet_limit(&self, id: WalletId, new_used: Money) -> Result<(), StoreError>;

    /// Applies a settlement atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the transaction moved on since the
    /// settlement was computed, `NotFound` for a missing row.
    fn commit_settlement(&self, settlement: &Settlement) -> Result<(), StoreError>;

    /// Wallets owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on storage failure.
    fn load_wallets(&self, owner: UserId) -> Result<Vec<Wallet>, StoreError>;

    /// Transactions owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on storage failure.
    fn load_transactions(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError>;
}

macro_rules! forward_store {
    ($($ty:ty),*) => {$(
        impl<T: LedgerStore + ?Sized> LedgerStore for $ty {
            fn load_children(&self, parent: ParentRef) -> Result<Vec<Transaction>, StoreError> {
                (**self).load_children(parent)
            }

            fn save_drafts(
                &self,
                drafts: &[TransactionDraft],
            ) -> Result<Vec<Transaction>, StoreError> {
                (**self).save_drafts(drafts)
            }

            fn load_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
                (**self).load_transaction(id)
            }

            fn update_transaction(
                &self,
                transaction: &Transaction,
                expected_version: i64,
            ) -> Result<(), StoreError> {
                (**self).update_transaction(transaction, expected_version)
            }

            fn load_wallet(&self, id: WalletId) -> Result<Wallet, StoreError> {
                (**self).load_wallet(id)
            }

            fn update_wallet_limit(&self, id: WalletId, new_used: Money) -> Result<(), StoreError> {
                (**self).update_wallet_limit(id, new_used)
            }

            fn commit_settlement(&self, settlement: &Settlement) -> Result<(), StoreError> {
                (**self).commit_settlement(settlement)
            }

            fn load_wallets(&self, owner: UserId) -> Result<Vec<Wallet>, StoreError> {
                (**self).load_wallets(owner)
            }

            fn load_transactions(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError> {
                (**self).load_transactions(owner)
            }
        }
    )*};
}

forward_store!(&T, Arc<T>);
