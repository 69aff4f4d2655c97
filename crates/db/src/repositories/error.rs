//! Repository error type.

use cofre_core::ErrorKind;
use cofre_core::budget::BudgetError;
use cofre_core::ledger::{LedgerError, StoreError};
use cofre_core::obligation::ObligationError;
use cofre_core::recurrence::RecurrenceError;
use cofre_shared::AppError;
use sea_orm::DbErr;

/// Errors returned by the repositories.
///
/// Domain rule violations keep their core error; storage outcomes use the
/// same [`StoreError`] the in-memory store reports.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Row missing, version conflict, duplicate due date or unreadable row.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Settlement transition rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Policy rejected or expansion failed.
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    /// Lifecycle change rejected.
    #[error(transparent)]
    Obligation(#[from] ObligationError),

    /// Budget rejected.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::Ledger(err) => err.kind(),
            Self::Recurrence(err) => err.kind(),
            Self::Obligation(err) => err.kind(),
            Self::Budget(err) => err.kind(),
            Self::Database(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if reloading and retrying may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Store(err) => err.error_code(),
            Self::Ledger(err) => err.error_code(),
            Self::Recurrence(err) => err.error_code(),
            Self::Obligation(err) => err.error_code(),
            Self::Budget(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    pub(crate) fn corrupt(entity: &str, id: uuid::Uuid, reason: impl std::fmt::Display) -> Self {
        Self::Store(StoreError::Backend(format!("corrupt {entity} row {id}: {reason}")))
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidArgument => Self::Validation(message),
            ErrorKind::AlreadyPaid
            | ErrorKind::NotPaid
            | ErrorKind::AlreadyReceived
            | ErrorKind::NotReceived
            | ErrorKind::ParentNotActive => Self::BusinessRule(message),
            ErrorKind::ConcurrentModification => Self::Conflict(message),
            ErrorKind::Storage => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cofre_shared::types::TransactionId;

    #[test]
    fn test_store_conflict_is_retryable() {
        let id = TransactionId::new();
        let err = RepositoryError::from(StoreError::ConcurrentModification {
            entity: "transaction",
            id: id.into_inner(),
        });

        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");
        assert_eq!(AppError::from(err).status_code(), 409);
    }

    #[test]
    fn test_domain_errors_map_to_app_errors() {
        let id = TransactionId::new();

        let err = RepositoryError::from(LedgerError::AlreadyPaid(id));
        assert_eq!(AppError::from(err).error_code(), "BUSINESS_RULE_VIOLATION");

        let err = RepositoryError::from(StoreError::transaction_not_found(id));
        assert_eq!(AppError::from(err).status_code(), 404);

        let err = RepositoryError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_retryable());
    }
}
