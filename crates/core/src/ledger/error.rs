//! Ledger error types for settlement transitions and persistence.

use chrono::NaiveDate;
use cofre_shared::types::{MoneyError, TransactionId, WalletId};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::obligation::{Flow, ParentRef};

/// Errors that can occur during ledger mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Transition Errors ==========
    /// Expense transaction is already paid.
    #[error("Transaction {0} is already paid")]
    AlreadyPaid(TransactionId),

    /// Expense transaction is not paid.
    #[error("Transaction {0} is not paid")]
    NotPaid(TransactionId),

    /// Income transaction is already received.
    #[error("Transaction {0} is already received")]
    AlreadyReceived(TransactionId),

    /// Income transaction is not received.
    #[error("Transaction {0} is not received")]
    NotReceived(TransactionId),

    /// Transaction was cancelled with its parent.
    #[error("Transaction {0} is cancelled")]
    TransactionCancelled(TransactionId),

    // ========== Validation Errors ==========
    /// Operation does not match the transaction flow (pay on income, receive on expense).
    #[error("Transaction {transaction_id} is {actual:?}, operation requires {expected:?}")]
    WrongFlow {
        /// The transaction.
        transaction_id: TransactionId,
        /// Flow the operation applies to.
        expected: Flow,
        /// Flow of the transaction.
        actual: Flow,
    },

    /// Wallet passed in is not the transaction's wallet.
    #[error("Transaction {transaction_id} does not settle against wallet {wallet_id}")]
    WalletMismatch {
        /// The transaction.
        transaction_id: TransactionId,
        /// The wallet supplied.
        wallet_id: WalletId,
    },

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Store Errors ==========
    /// Persistence collaborator failure other than a version conflict.
    #[error(transparent)]
    Store(StoreError),
}

impl LedgerError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyPaid(_) => ErrorKind::AlreadyPaid,
            Self::NotPaid(_) => ErrorKind::NotPaid,
            Self::AlreadyReceived(_) => ErrorKind::AlreadyReceived,
            Self::NotReceived(_) => ErrorKind::NotReceived,
            Self::TransactionCancelled(_) => ErrorKind::ParentNotActive,
            Self::WrongFlow { .. } | Self::WalletMismatch { .. } | Self::Money(_) => {
                ErrorKind::InvalidArgument
            }
            Self::ConcurrentModification => ErrorKind::ConcurrentModification,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns true if the caller may retry the whole operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyPaid(_) => "ALREADY_PAID",
            Self::NotPaid(_) => "NOT_PAID",
            Self::AlreadyReceived(_) => "ALREADY_RECEIVED",
            Self::NotReceived(_) => "NOT_RECEIVED",
            Self::TransactionCancelled(_) => "TRANSACTION_CANCELLED",
            Self::WrongFlow { .. } => "WRONG_FLOW",
            Self::WalletMismatch { .. } => "WALLET_MISMATCH",
            Self::Money(err) => err.error_code(),
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyPaid
            | ErrorKind::NotPaid
            | ErrorKind::AlreadyReceived
            | ErrorKind::NotReceived
            | ErrorKind::ParentNotActive
            | ErrorKind::ConcurrentModification => 409,
            ErrorKind::Storage => 500,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrentModification { .. } => Self::ConcurrentModification,
            other => Self::Store(other),
        }
    }
}

/// Errors reported by a [`LedgerStore`](super::store::LedgerStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record type.
        entity: &'static str,
        /// Record id.
        id: Uuid,
    },

    /// Stored version differs from the one the write was computed from.
    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification {
        /// Record type.
        entity: &'static str,
        /// Record id.
        id: Uuid,
    },

    /// A parent already has a transaction on that due date.
    #[error("Parent {parent} already has a transaction due on {due_date}")]
    DuplicateDueDate {
        /// The parent.
        parent: ParentRef,
        /// The conflicting date.
        due_date: NaiveDate,
    },

    /// Limit write against a wallet without a credit line.
    #[error("Wallet {0} is not a credit card")]
    NotCreditCard(WalletId),

    /// Plain update touching a field only generation or settlement may change.
    #[error("Transaction {id} field {field} cannot be changed by an update")]
    LedgerOwnedField {
        /// Transaction id.
        id: Uuid,
        /// First offending field.
        field: &'static str,
    },

    /// Backend failure (I/O, driver, poisoned lock).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a missing transaction.
    #[must_use]
    pub const fn transaction_not_found(id: TransactionId) -> Self {
        Self::NotFound {
            entity: "transaction",
            id: id.into_inner(),
        }
    }

    /// Shorthand for a missing wallet.
    #[must_use]
    pub const fn wallet_not_found(id: WalletId) -> Self {
        Self::NotFound {
            entity: "wallet",
            id: id.into_inner(),
        }
    }

    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::DuplicateDueDate { .. }
            | Self::NotCreditCard(_)
            | Self::LedgerOwnedField { .. } => ErrorKind::InvalidArgument,
            Self::Backend(_) => ErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::DuplicateDueDate { .. } => "DUPLICATE_DUE_DATE",
            Self::NotCreditCard(_) => "NOT_CREDIT_CARD",
            Self::LedgerOwnedField { .. } => "LEDGER_OWNED_FIELD",
            Self::Backend(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_modification_propagates_unchanged() {
        let store_err = StoreError::ConcurrentModification {
            entity: "transaction",
            id: Uuid::nil(),
        };
        let err: LedgerError = store_err.into();
        assert_eq!(err, LedgerError::ConcurrentModification);
        assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
        assert!(err.is_retryable());
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_store_errors_keep_their_kind() {
        let err: LedgerError = StoreError::wallet_not_found(WalletId::new()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.http_status_code(), 404);
        assert!(!err.is_retryable());

        let err: LedgerError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_transition_error_kinds() {
        let id = TransactionId::new();
        assert_eq!(LedgerError::AlreadyPaid(id).kind(), ErrorKind::AlreadyPaid);
        assert_eq!(LedgerError::NotReceived(id).kind(), ErrorKind::NotReceived);
        assert_eq!(LedgerError::TransactionCancelled(id).kind(), ErrorKind::ParentNotActive);
        assert_eq!(LedgerError::AlreadyPaid(id).error_code(), "ALREADY_PAID");
    }
}
