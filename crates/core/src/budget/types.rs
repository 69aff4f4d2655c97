//! Budget data types.

use chrono::{DateTime, Utc};
use cofre_shared::types::{BudgetId, CategoryId, Money, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::MonthPeriod;

/// How long a budget applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetRecurrence {
    /// Every month from its starting month on.
    Monthly,
    /// Only its own month.
    Once,
}

/// A spending limit for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning user.
    pub owner_id: UserId,
    /// Category the limit applies to.
    pub category_id: CategoryId,
    /// Starting month.
    pub period: MonthPeriod,
    /// Limit.
    pub amount: Money,
    /// Monthly or once.
    pub recurrence: BudgetRecurrence,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Returns true if this budget covers `month`.
    #[must_use]
    pub fn applies_to(&self, month: MonthPeriod) -> bool {
        match self.recurrence {
            BudgetRecurrence::Monthly => month >= self.period,
            BudgetRecurrence::Once => month == self.period,
        }
    }
}

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Owning user.
    pub owner_id: UserId,
    /// Category.
    pub category_id: CategoryId,
    /// Starting month.
    pub period: MonthPeriod,
    /// Limit.
    pub amount: Money,
    /// Monthly or once.
    pub recurrence: BudgetRecurrence,
}

/// Variance calculation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceResult {
    /// Budgeted amount.
    pub budgeted: Money,
    /// Actual spend.
    pub actual: Money,
    /// `budgeted - actual`.
    pub variance: Money,
    /// Variance as a percentage of the budget.
    pub variance_percent: Decimal,
    /// Spend as a percentage of the budget.
    pub utilization_percent: Decimal,
    /// Variance status.
    pub status: VarianceStatus,
}

/// Variance status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Under budget.
    Favorable,
    /// Over budget.
    Unfavorable,
    /// Exactly on budget.
    OnBudget,
}

/// Budget compared with a month of actual spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVsActual {
    /// The budget applied.
    pub budget_id: BudgetId,
    /// Its category.
    pub category_id: CategoryId,
    /// The month compared.
    pub period: MonthPeriod,
    /// The comparison.
    pub result: VarianceResult,
}
