//! Property-based tests for recurrence schedules.
//!
//! - Installment amounts always sum to the total, offset or not
//! - Installment numbering is absolute against the full count
//! - Due dates are strictly increasing and stay on the anchor day when possible
//! - Horizon extension never repeats a date

use chrono::{Datelike, NaiveDate};
use cofre_shared::types::Money;
use proptest::prelude::*;

use super::policy::RecurrencePolicy;

/// Strategy for start dates across leap and non-leap years, including month ends.
fn start_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=31).prop_map(|(y, m, d)| {
        (0..4)
            .find_map(|back| NaiveDate::from_ymd_opt(y, m, d - back))
            .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_installments_sum_to_total(
        total in 0i64..100_000_000,
        count in 2u32..60,
        start in start_date(),
    ) {
        let policy = RecurrencePolicy::Installments {
            total_amount: Money::from_cents(total),
            installment_count: count,
            start_date: start,
            paid_installments_offset: 0,
        };
        let occ: Vec<_> = policy.occurrences().unwrap().collect();

        prop_assert_eq!(occ.len(), count as usize);
        let sum: Money = occ.iter().map(|o| o.amount).sum();
        prop_assert_eq!(sum.cents(), total);
    }

    #[test]
    fn prop_offset_preserves_labels(
        count in 2u32..48,
        offset_seed in 0u32..48,
        start in start_date(),
    ) {
        let offset = offset_seed % count;
        let policy = RecurrencePolicy::Installments {
            total_amount: Money::from_cents(i64::from(count) * 1_000),
            installment_count: count,
            start_date: start,
            paid_installments_offset: offset,
        };
        let occ: Vec<_> = policy.occurrences().unwrap().collect();

        prop_assert_eq!(occ.len(), (count - offset) as usize);
        for (i, o) in occ.iter().enumerate() {
            prop_assert_eq!(o.sequence_number, offset + 1 + i as u32);
            prop_assert_eq!(o.total_occurrences, Some(count));
        }
    }

    #[test]
    fn prop_due_dates_strictly_increasing(
        count in 2u32..60,
        start in start_date(),
    ) {
        let policy = RecurrencePolicy::Installments {
            total_amount: Money::from_cents(10_000),
            installment_count: count,
            start_date: start,
            paid_installments_offset: 0,
        };
        let occ: Vec<_> = policy.occurrences().unwrap().collect();

        for pair in occ.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
        }
        for o in &occ {
            prop_assert!(o.due_date.day() <= start.day());
        }
    }

    #[test]
    fn prop_extension_never_repeats(
        start in start_date(),
        first_months in 1u32..24,
        extra_months in 0u32..24,
    ) {
        let policy = RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(2_500),
            start_date: start,
            horizon_months: 12,
        };
        let first_horizon = crate::calendar::add_months(start, first_months).unwrap();
        let second_horizon =
            crate::calendar::add_months(start, first_months + extra_months).unwrap();

        let first = policy.extend_to(None, first_horizon).unwrap();
        let last = first.last().map(|o| o.due_date);
        let second = policy.extend_to(last, second_horizon).unwrap();

        prop_assert_eq!(first.len() + second.len(), (first_months + extra_months + 1) as usize);
        if let (Some(last), Some(next)) = (last, second.first()) {
            prop_assert!(next.due_date > last);
        }
        prop_assert!(policy.extend_to(second.last().map(|o| o.due_date).or(last), second_horizon)
            .unwrap()
            .is_empty());
    }
}
