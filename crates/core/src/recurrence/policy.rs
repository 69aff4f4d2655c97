//! Recurrence policy and its occurrence schedule.

use chrono::NaiveDate;
use cofre_shared::types::Money;
use serde::{Deserialize, Serialize};

use super::error::RecurrenceError;
use crate::calendar::add_months;

/// How an obligation repeats.
///
/// Monetary and schedule fields are immutable once the parent exists; the
/// only mutation a schedule ever sees is a `Recurring` horizon extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrencePolicy {
    /// A single occurrence.
    OneTime {
        /// Amount due.
        amount: Money,
        /// Due date.
        due_date: NaiveDate,
    },
    /// A fixed number of monthly installments splitting a total.
    Installments {
        /// Amount split across all installments, including already-paid ones.
        total_amount: Money,
        /// Full installment count, at least 2.
        installment_count: u32,
        /// Due date of installment 1.
        start_date: NaiveDate,
        /// Installments settled before the obligation was entered.
        #[serde(default)]
        paid_installments_offset: u32,
    },
    /// An open-ended monthly charge.
    Recurring {
        /// Amount due every month.
        amount_per_period: Money,
        /// Due date of the first period.
        start_date: NaiveDate,
        /// Months ahead of today that stay materialized.
        horizon_months: u32,
    },
}

/// One entry of a policy schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOccurrence {
    /// 1-based position in the full schedule.
    pub sequence_number: u32,
    /// Due date.
    pub due_date: NaiveDate,
    /// Amount due.
    pub amount: Money,
    /// Full installment count; `None` for one-time and recurring policies.
    pub total_occurrences: Option<u32>,
}

impl RecurrencePolicy {
    /// Checks the policy parameters.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument`-kind error for negative amounts, fewer
    /// than two installments, an offset that leaves nothing to generate, or a
    /// zero horizon.
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        match *self {
            Self::OneTime { amount, .. } => non_negative(amount),
            Self::Installments {
                total_amount,
                installment_count,
                paid_installments_offset,
                ..
            } => {
                non_negative(total_amount)?;
                if installment_count < 2 {
                    return Err(RecurrenceError::InstallmentCountTooLow(installment_count));
                }
                if paid_installments_offset >= installment_count {
                    return Err(RecurrenceError::OffsetOutOfRange {
                        offset: paid_installments_offset,
                        count: installment_count,
                    });
                }
                Ok(())
            }
            Self::Recurring {
                amount_per_period,
                horizon_months,
                ..
            } => {
                non_negative(amount_per_period)?;
                if horizon_months == 0 {
                    return Err(RecurrenceError::InvalidHorizon(horizon_months));
                }
                Ok(())
            }
        }
    }

    /// Amount carried by the parent: the one-time amount, the installment
    /// total, or the per-period amount.
    #[must_use]
    pub const fn total_amount(&self) -> Money {
        match *self {
            Self::OneTime { amount, .. } => amount,
            Self::Installments { total_amount, .. } => total_amount,
            Self::Recurring {
                amount_per_period, ..
            } => amount_per_period,
        }
    }

    /// Due date of the first occurrence in the full schedule.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        match *self {
            Self::OneTime { due_date, .. } => due_date,
            Self::Installments { start_date, .. } | Self::Recurring { start_date, .. } => {
                start_date
            }
        }
    }

    /// Returns true for open-ended policies.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        matches!(self, Self::Recurring { .. })
    }

    /// The rolling horizon as seen from `today`, for recurring policies.
    #[must_use]
    pub fn horizon_for(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Recurring { horizon_months, .. } => add_months(today, horizon_months),
            _ => None,
        }
    }

    /// Lazy schedule of occurrences to materialize.
    ///
    /// Installments skip the first `paid_installments_offset` entries but keep
    /// their numbering against the full count. Recurring schedules never end;
    /// bound them with `take_while`.
    ///
    /// # Errors
    ///
    /// Returns the `validate` error for a malformed policy.
    pub fn occurrences(&self) -> Result<Occurrences, RecurrenceError> {
        self.validate()?;

        let schedule = match *self {
            Self::OneTime { amount, due_date } => Occurrences {
                anchor: due_date,
                next_index: 0,
                end: Some(1),
                amounts: Amounts::Fixed(amount),
                total: None,
            },
            Self::Installments {
                total_amount,
                installment_count,
                start_date,
                paid_installments_offset,
            } => Occurrences {
                anchor: start_date,
                next_index: paid_installments_offset,
                end: Some(installment_count),
                amounts: Amounts::Split(total_amount.split_evenly(i64::from(installment_count))?),
                total: Some(installment_count),
            },
            Self::Recurring {
                amount_per_period,
                start_date,
                ..
            } => Occurrences {
                anchor: start_date,
                next_index: 0,
                end: None,
                amounts: Amounts::Fixed(amount_per_period),
                total: None,
            },
        };

        Ok(schedule)
    }

    /// New recurring occurrences after `materialized_through` up to `horizon`
    /// (inclusive).
    ///
    /// Idempotent: a horizon that has not advanced past the last materialized
    /// date yields nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotRecurring` for fixed schedules, or the `validate` error.
    pub fn extend_to(
        &self,
        materialized_through: Option<NaiveDate>,
        horizon: NaiveDate,
    ) -> Result<Vec<ScheduledOccurrence>, RecurrenceError> {
        if !self.is_recurring() {
            return Err(RecurrenceError::NotRecurring);
        }

        Ok(self
            .occurrences()?
            .take_while(|occ| occ.due_date <= horizon)
            .filter(|occ| materialized_through.is_none_or(|last| occ.due_date > last))
            .collect())
    }
}

fn non_negative(amount: Money) -> Result<(), RecurrenceError> {
    if amount.is_negative() {
        return Err(RecurrenceError::NegativeAmount(amount.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Amounts {
    Fixed(Money),
    Split(Vec<Money>),
}

/// Iterator over a policy schedule.
///
/// Every date is computed from the anchor (`anchor + k months`), never
/// chained from the previous one.
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: NaiveDate,
    next_index: u32,
    end: Option<u32>,
    amounts: Amounts,
    total: Option<u32>,
}

impl Iterator for Occurrences {
    type Item = ScheduledOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_index;
        if self.end.is_some_and(|end| index >= end) {
            return None;
        }

        let due_date = add_months(self.anchor, index)?;
        let amount = match &self.amounts {
            Amounts::Fixed(amount) => *amount,
            Amounts::Split(parts) => *parts.get(usize::try_from(index).ok()?)?,
        };

        self.next_index = index.checked_add(1)?;
        Some(ScheduledOccurrence {
            sequence_number: index + 1,
            due_date,
            amount,
            total_occurrences: self.total,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.end {
            Some(end) => {
                let left = usize::try_from(end.saturating_sub(self.next_index)).unwrap_or(0);
                (0, Some(left))
            }
            None => (0, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn installments(total: i64, count: u32, offset: u32) -> RecurrencePolicy {
        RecurrencePolicy::Installments {
            total_amount: Money::from_cents(total),
            installment_count: count,
            start_date: date(2024, 1, 31),
            paid_installments_offset: offset,
        }
    }

    #[test]
    fn test_one_time_single_occurrence() {
        let policy = RecurrencePolicy::OneTime {
            amount: Money::from_cents(4_990),
            due_date: date(2024, 5, 10),
        };
        let occ: Vec<_> = policy.occurrences().unwrap().collect();
        assert_eq!(occ.len(), 1);
        assert_eq!(occ[0].sequence_number, 1);
        assert_eq!(occ[0].due_date, date(2024, 5, 10));
        assert_eq!(occ[0].amount, Money::from_cents(4_990));
        assert_eq!(occ[0].total_occurrences, None);
    }

    #[test]
    fn test_installments_leap_year_clamping() {
        let occ: Vec<_> = installments(100_000, 3, 0).occurrences().unwrap().collect();
        let dates: Vec<_> = occ.iter().map(|o| o.due_date).collect();
        let cents: Vec<_> = occ.iter().map(|o| o.amount.cents()).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]);
        assert_eq!(cents, vec![33_334, 33_333, 33_333]);
        assert!(occ.iter().all(|o| o.total_occurrences == Some(3)));
    }

    #[test]
    fn test_installments_offset_keeps_numbering() {
        let occ: Vec<_> = installments(120_000, 12, 3).occurrences().unwrap().collect();
        assert_eq!(occ.len(), 9);
        assert_eq!(occ[0].sequence_number, 4);
        assert_eq!(occ[0].due_date, date(2024, 4, 30));
        assert_eq!(occ[8].sequence_number, 12);
        assert!(occ.iter().all(|o| o.total_occurrences == Some(12)));
    }

    #[test]
    fn test_rejects_low_installment_count() {
        for count in [0, 1] {
            let err = installments(1_000, count, 0).validate().unwrap_err();
            assert_eq!(err, RecurrenceError::InstallmentCountTooLow(count));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_rejects_negative_amount() {
        let policy = RecurrencePolicy::OneTime {
            amount: Money::from_cents(-1),
            due_date: date(2024, 1, 1),
        };
        let err = policy.occurrences().unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_AMOUNT");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rejects_offset_covering_everything() {
        let err = installments(1_000, 4, 4).validate().unwrap_err();
        assert!(matches!(err, RecurrenceError::OffsetOutOfRange { offset: 4, count: 4 }));
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let policy = RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(5_000),
            start_date: date(2024, 1, 1),
            horizon_months: 0,
        };
        assert_eq!(policy.validate(), Err(RecurrenceError::InvalidHorizon(0)));
    }

    #[test]
    fn test_past_start_date_allowed() {
        let policy = installments(30_000, 3, 0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_extend_to_is_idempotent() {
        let policy = RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(5_000),
            start_date: date(2024, 1, 15),
            horizon_months: 12,
        };
        let first = policy.extend_to(None, date(2024, 4, 15)).unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first[3].sequence_number, 4);

        let last = first.last().map(|o| o.due_date);
        assert!(policy.extend_to(last, date(2024, 4, 15)).unwrap().is_empty());

        let more = policy.extend_to(last, date(2024, 6, 20)).unwrap();
        let dates: Vec<_> = more.iter().map(|o| o.due_date).collect();
        assert_eq!(dates, vec![date(2024, 5, 15), date(2024, 6, 15)]);
        assert_eq!(more[0].sequence_number, 5);
    }

    #[test]
    fn test_extend_to_rejects_fixed_schedules() {
        let err = installments(1_000, 2, 0)
            .extend_to(None, date(2030, 1, 1))
            .unwrap_err();
        assert_eq!(err, RecurrenceError::NotRecurring);
    }

    #[test]
    fn test_recurring_from_month_end_does_not_drift() {
        let policy = RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(1_000),
            start_date: date(2023, 1, 31),
            horizon_months: 12,
        };
        let dates: Vec<_> = policy
            .extend_to(None, date(2023, 4, 30))
            .unwrap()
            .into_iter()
            .map(|o| o.due_date)
            .collect();
        assert_eq!(
            dates,
            vec![date(2023, 1, 31), date(2023, 2, 28), date(2023, 3, 31), date(2023, 4, 30)]
        );
    }

    #[test]
    fn test_horizon_for() {
        let policy = RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(1_000),
            start_date: date(2024, 1, 1),
            horizon_months: 12,
        };
        assert_eq!(policy.horizon_for(date(2024, 3, 10)), Some(date(2025, 3, 10)));
        assert_eq!(installments(1_000, 2, 0).horizon_for(date(2024, 3, 10)), None);
    }

    #[test]
    fn test_policy_serde_tagging() {
        let json = serde_json::to_value(installments(1_000, 2, 0)).unwrap();
        assert_eq!(json["type"], "installments");
        assert_eq!(json["total_amount"], 1_000);

        let back: RecurrencePolicy = serde_json::from_value(serde_json::json!({
            "type": "installments",
            "total_amount": 1000,
            "installment_count": 2,
            "start_date": "2024-01-31"
        }))
        .unwrap();
        assert_eq!(back, installments(1_000, 2, 0));
    }
}
