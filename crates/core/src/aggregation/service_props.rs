//! Property-based tests for the aggregation engine.
//!
//! - Balance identity: `total_balance(user) == sum(wallet_balance(w))`
//! - Zero-previous rule: `percentage_change(x, 0) == 0`
//! - Cash-flow nets add up to the settled delta inside the window

use chrono::NaiveDate;
use cofre_shared::types::{AccountId, IncomeId, Money, TransactionId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::AggregationService;
use crate::ledger::{Transaction, TransactionStatus, Wallet};
use crate::obligation::ParentRef;

/// (wallet index, is income, cents, settled, day offset)
type Row = (prop::sample::Index, bool, i64, bool, u32);

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (any::<prop::sample::Index>(), any::<bool>(), 0i64..1_000_000, any::<bool>(), 0u32..180),
        0..40,
    )
}

fn build(owner: UserId, wallets: &[Wallet], rows: &[Row]) -> Vec<Transaction> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    rows.iter()
        .map(|(pick, income, cents, settled, day)| {
            let wallet = &wallets[pick.index(wallets.len())];
            let date = base + chrono::Days::new(u64::from(*day));
            Transaction {
                id: TransactionId::new(),
                parent: if *income {
                    ParentRef::Income(IncomeId::new())
                } else {
                    ParentRef::Account(AccountId::new())
                },
                owner_id: owner,
                wallet_id: wallet.id,
                category_id: None,
                amount: Money::from_cents(*cents),
                due_date: date,
                settled_at: settled.then_some(date),
                installment_number: 1,
                total_installments: None,
                status: if *settled {
                    TransactionStatus::Settled
                } else {
                    TransactionStatus::Pending
                },
                limit_drawn: None,
                version: 0,
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_total_balance_identity(
        initials in prop::collection::vec(-1_000_000i64..1_000_000, 1..5),
        rows in rows(),
    ) {
        let owner = UserId::new();
        let wallets: Vec<Wallet> = initials
            .iter()
            .enumerate()
            .map(|(i, cents)| Wallet::checking(owner, format!("w{i}"), Money::from_cents(*cents)))
            .collect();
        let transactions = build(owner, &wallets, &rows);

        let per_wallet: Money = wallets
            .iter()
            .map(|w| AggregationService::wallet_balance(w, &transactions).unwrap())
            .sum();

        prop_assert_eq!(
            AggregationService::total_balance(owner, &wallets, &transactions).unwrap(),
            per_wallet
        );
    }

    #[test]
    fn prop_percentage_change_zero_previous(current in any::<i64>()) {
        prop_assert_eq!(
            AggregationService::percentage_change(Money::from_cents(current), Money::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn prop_cashflow_net_matches_balance_delta(rows in rows()) {
        let owner = UserId::new();
        let wallets = vec![Wallet::checking(owner, "Conta", Money::ZERO)];
        let transactions = build(owner, &wallets, &rows);
        // 2024-01-01 + 179 days lands in June; seven months cover everything.
        let today = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();

        let series = AggregationService::cashflow_series(owner, &transactions, today, 7);
        let net: Money = series.iter().map(|p| p.net).sum();

        prop_assert_eq!(series.len(), 7);
        prop_assert_eq!(
            net,
            AggregationService::wallet_balance(&wallets[0], &transactions).unwrap()
        );
    }
}
