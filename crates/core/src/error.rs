//! Error taxonomy shared by every core module.
//!
//! Each module keeps its own error enum; `ErrorKind` is the coarse category
//! callers switch on (HTTP layer, scheduler, retry policy).

use serde::Serialize;

/// Coarse category of a core error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: bad counts, negative amounts, wrong flow.
    InvalidArgument,
    /// Expense transaction is already paid.
    AlreadyPaid,
    /// Expense transaction is not paid.
    NotPaid,
    /// Income transaction is already received.
    AlreadyReceived,
    /// Income transaction is not received.
    NotReceived,
    /// The parent (or the transaction itself) is cancelled or completed.
    ParentNotActive,
    /// Optimistic concurrency check failed; the caller may retry.
    ConcurrentModification,
    /// Referenced record does not exist.
    NotFound,
    /// Persistence backend failure.
    Storage,
}

impl ErrorKind {
    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
