//! Budget service for variance calculation and validation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cofre_shared::types::{BudgetId, Money};

use super::error::BudgetError;
use super::types::{
    Budget, BudgetRecurrence, BudgetVsActual, CreateBudgetInput, VarianceResult, VarianceStatus,
};
use crate::calendar::MonthPeriod;
use crate::ledger::Transaction;
use crate::obligation::Flow;

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Calculate variance between budgeted and actual spend.
    ///
    /// variance = budgeted - actual
    ///   - Positive variance (under budget) is favorable
    ///   - Negative variance (over budget) is unfavorable
    ///
    /// A zero budget reports 0% for both percentages.
    #[must_use]
    pub fn calculate_variance(budgeted: Money, actual: Money) -> VarianceResult {
        let variance = budgeted - actual;

        let status = match variance.cmp(&Money::ZERO) {
            std::cmp::Ordering::Greater => VarianceStatus::Favorable,
            std::cmp::Ordering::Less => VarianceStatus::Unfavorable,
            std::cmp::Ordering::Equal => VarianceStatus::OnBudget,
        };

        VarianceResult {
            budgeted,
            actual,
            variance,
            variance_percent: variance.percentage_of(budgeted),
            utilization_percent: actual.percentage_of(budgeted),
            status,
        }
    }

    /// Validate budget creation.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` if the amount is negative.
    /// Returns `BudgetError::DuplicateBudget` if `existing` already holds a
    /// budget for the same owner, category, month and recurrence.
    pub fn validate_budget(
        input: &CreateBudgetInput,
        existing: &[Budget],
    ) -> Result<(), BudgetError> {
        if input.amount.is_negative() {
            return Err(BudgetError::NegativeAmount(input.amount));
        }

        let duplicate = existing.iter().any(|b| {
            b.owner_id == input.owner_id
                && b.category_id == input.category_id
                && b.period == input.period
                && b.recurrence == input.recurrence
        });
        if duplicate {
            return Err(BudgetError::DuplicateBudget {
                category_id: input.category_id,
                period: input.period,
            });
        }

        Ok(())
    }

    /// Validates and builds a budget.
    ///
    /// # Errors
    ///
    /// Returns the `validate_budget` error.
    pub fn create(
        input: CreateBudgetInput,
        existing: &[Budget],
        created_at: DateTime<Utc>,
    ) -> Result<Budget, BudgetError> {
        Self::validate_budget(&input, existing)?;
        Ok(Budget {
            id: BudgetId::new(),
            owner_id: input.owner_id,
            category_id: input.category_id,
            period: input.period,
            amount: input.amount,
            recurrence: input.recurrence,
            created_at,
        })
    }

    /// Compares each category's budget for `month` with the paid expenses
    /// settled in that month.
    ///
    /// When several budgets cover the same owner and category, a one-off
    /// budget for the month wins over a monthly one, and among monthly
    /// budgets the most recently started wins. Output is sorted by category.
    #[must_use]
    pub fn budget_vs_actual(
        budgets: &[Budget],
        transactions: &[Transaction],
        month: MonthPeriod,
    ) -> Vec<BudgetVsActual> {
        let mut chosen: BTreeMap<_, &Budget> = BTreeMap::new();
        for budget in budgets.iter().filter(|b| b.applies_to(month)) {
            chosen
                .entry((budget.category_id, budget.owner_id))
                .and_modify(|current| {
                    if Self::precedence(budget) > Self::precedence(current) {
                        *current = budget;
                    }
                })
                .or_insert(budget);
        }

        chosen
            .into_values()
            .map(|budget| {
                let actual: Money = transactions
                    .iter()
                    .filter(|tx| {
                        tx.owner_id == budget.owner_id
                            && tx.category_id == Some(budget.category_id)
                            && tx.flow() == Flow::Expense
                            && tx.is_settled()
                            && tx.settled_at.is_some_and(|d| month.contains(d))
                    })
                    .map(|tx| tx.amount)
                    .sum();

                BudgetVsActual {
                    budget_id: budget.id,
                    category_id: budget.category_id,
                    period: month,
                    result: Self::calculate_variance(budget.amount, actual),
                }
            })
            .collect()
    }

    fn precedence(budget: &Budget) -> (bool, MonthPeriod) {
        (budget.recurrence == BudgetRecurrence::Once, budget.period)
    }
}
