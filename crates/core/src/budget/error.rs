//! Budget error types.

use cofre_shared::types::{CategoryId, Money};
use thiserror::Error;

use crate::calendar::MonthPeriod;
use crate::error::ErrorKind;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Amount cannot be negative.
    #[error("Budget amount cannot be negative: {0}")]
    NegativeAmount(Money),

    /// A budget with the same category, month and recurrence exists.
    #[error("Budget already exists for category {category_id} in {period}")]
    DuplicateBudget {
        /// Category.
        category_id: CategoryId,
        /// Starting month.
        period: MonthPeriod,
    },
}

impl BudgetError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::DuplicateBudget { .. } => "DUPLICATE_BUDGET",
        }
    }
}
