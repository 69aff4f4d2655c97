//! Aggregation output types.

use chrono::NaiveDate;
use cofre_shared::types::{AccountId, CategoryId, Money, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::MonthPeriod;
use crate::ledger::EffectiveStatus;

/// Totals for one month of the cash-flow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    /// The month.
    pub period: MonthPeriod,
    /// Paid expenses settled in the month.
    pub expenses: Money,
    /// Received income settled in the month.
    pub income: Money,
    /// `income - expenses`.
    pub net: Money,
}

/// Spend for one category in a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category; `None` groups uncategorized spend.
    pub category_id: Option<CategoryId>,
    /// Paid total.
    pub total: Money,
}

/// An installment plan whose last installment is due this month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingAccount {
    /// The account.
    pub account_id: AccountId,
    /// The final installment.
    pub transaction_id: TransactionId,
    /// Its due date.
    pub due_date: NaiveDate,
    /// Its amount.
    pub amount: Money,
    /// Its status as of today.
    pub status: EffectiveStatus,
}

/// Dashboard header for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The month.
    pub period: MonthPeriod,
    /// Received income.
    pub income: Money,
    /// Paid expenses.
    pub expenses: Money,
    /// `income - expenses`.
    pub net: Money,
    /// Income change vs the previous month, in percent.
    pub income_change: Decimal,
    /// Expense change vs the previous month, in percent.
    pub expenses_change: Decimal,
}
