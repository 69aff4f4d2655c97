//! Obligation lifecycle errors.

use thiserror::Error;

use super::types::ObligationStatus;
use crate::error::ErrorKind;

/// Errors raised by obligation lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObligationError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ObligationStatus,
        /// The attempted target status.
        to: ObligationStatus,
    },
}

impl ObligationError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}
