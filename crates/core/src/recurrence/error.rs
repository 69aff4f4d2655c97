//! Recurrence policy errors.

use chrono::NaiveDate;
use cofre_shared::types::MoneyError;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while validating or expanding a recurrence policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    // ========== Validation Errors ==========
    /// Installment plans need at least two installments.
    #[error("Installment count must be at least 2, got {0}")]
    InstallmentCountTooLow(u32),

    /// Amounts must not be negative.
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(String),

    /// The already-paid offset must leave at least one installment.
    #[error("Paid installments offset {offset} must be lower than installment count {count}")]
    OffsetOutOfRange {
        /// Installments settled before entry.
        offset: u32,
        /// Full installment count.
        count: u32,
    },

    /// Recurring horizon must cover at least one month.
    #[error("Horizon must be at least 1 month, got {0}")]
    InvalidHorizon(u32),

    /// Only recurring policies can be extended.
    #[error("Only recurring policies can be extended")]
    NotRecurring,

    /// A computed date fell outside the supported calendar.
    #[error("Date out of range: {0} plus {1} months")]
    DateOutOfRange(NaiveDate, u32),

    // ========== State Errors ==========
    /// The parent obligation is not active.
    #[error("Parent obligation is not active")]
    ParentNotActive,

    // ========== Arithmetic ==========
    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl RecurrenceError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ParentNotActive => ErrorKind::ParentNotActive,
            _ => ErrorKind::InvalidArgument,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InstallmentCountTooLow(_) => "INSTALLMENT_COUNT_TOO_LOW",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::OffsetOutOfRange { .. } => "OFFSET_OUT_OF_RANGE",
            Self::InvalidHorizon(_) => "INVALID_HORIZON",
            Self::NotRecurring => "NOT_RECURRING",
            Self::DateOutOfRange(..) => "DATE_OUT_OF_RANGE",
            Self::ParentNotActive => "PARENT_NOT_ACTIVE",
            Self::Money(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::ParentNotActive => 409,
            _ => 400,
        }
    }
}
