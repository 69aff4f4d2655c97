//! Property-based tests for the transaction generator.
//!
//! - Installment offset: `count - offset` drafts numbered `offset+1..=count`
//! - Top-up idempotence: a repeated horizon yields nothing
//! - Materialized due dates stay strictly increasing across generate + top-ups

use chrono::{NaiveDate, Utc};
use cofre_shared::types::{Money, UserId, WalletId};
use proptest::prelude::*;

use super::service::TransactionGenerator;
use crate::calendar::add_months;
use crate::obligation::{Account, ObligationInput};
use crate::recurrence::RecurrencePolicy;

fn account(policy: RecurrencePolicy) -> Account {
    Account::create(
        ObligationInput {
            owner_id: UserId::new(),
            wallet_id: WalletId::new(),
            category_id: None,
            name: "Plano de saúde".to_string(),
            note: None,
            policy,
        },
        Utc::now(),
    )
    .unwrap()
}

fn day_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_offset_drafts_keep_absolute_numbers(
        count in 2u32..36,
        offset_seed in 0u32..36,
        per_installment in 1i64..100_000,
        start in day_strategy(),
    ) {
        let offset = offset_seed % count;
        let parent = account(RecurrencePolicy::Installments {
            total_amount: Money::from_cents(per_installment * i64::from(count)),
            installment_count: count,
            start_date: start,
            paid_installments_offset: offset,
        });

        let drafts = TransactionGenerator::generate(&parent, start).unwrap();

        prop_assert_eq!(drafts.len() as u32, count - offset);
        let numbers: Vec<u32> = drafts.iter().map(|d| d.installment_number).collect();
        prop_assert_eq!(numbers, ((offset + 1)..=count).collect::<Vec<_>>());
        prop_assert!(drafts.iter().all(|d| d.total_installments == Some(count)));
        prop_assert!(drafts.iter().all(|d| d.amount == Money::from_cents(per_installment)));
    }

    #[test]
    fn prop_top_up_twice_is_empty(
        start in day_strategy(),
        today_offset in 0u32..36,
        horizon_months in 1u32..24,
    ) {
        let parent = account(RecurrencePolicy::Recurring {
            amount_per_period: Money::from_cents(9_990),
            start_date: start,
            horizon_months,
        });
        let today = add_months(start, today_offset).unwrap();
        let horizon = add_months(today, horizon_months).unwrap();

        let initial = TransactionGenerator::generate(&parent, start).unwrap();
        let existing = initial.iter().map(|d| d.due_date).max();

        let first = TransactionGenerator::top_up(&parent, existing, horizon).unwrap();
        let after_first = first.iter().map(|d| d.due_date).max().or(existing);
        let second = TransactionGenerator::top_up(&parent, after_first, horizon).unwrap();

        prop_assert!(second.is_empty());

        let mut all: Vec<NaiveDate> = initial.iter().chain(&first).map(|d| d.due_date).collect();
        let len = all.len();
        prop_assert!(all.windows(2).all(|w| w[0] < w[1]));
        all.dedup();
        prop_assert_eq!(all.len(), len);
    }
}
