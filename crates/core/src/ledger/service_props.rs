//! Property-based tests for settlement transitions.
//!
//! - `mark_unpaid(mark_paid(t))` restores the card counter and the status exactly
//! - After any sequence of pay/unpay, `card_limit_used` equals the draws of
//!   the currently paid transactions

use chrono::NaiveDate;
use cofre_shared::types::{AccountId, Money, UserId};
use proptest::prelude::*;

use super::memory::MemoryStore;
use super::service::LedgerService;
use super::store::LedgerStore;
use super::transaction::TransactionStatus;
use super::wallet::Wallet;
use crate::aggregation::AggregationService;
use crate::generator::TransactionDraft;
use crate::obligation::ParentRef;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn drafts_for(wallet: &Wallet, amounts: &[i64]) -> Vec<TransactionDraft> {
    let parent = ParentRef::Account(AccountId::new());
    amounts
        .iter()
        .enumerate()
        .map(|(i, cents)| TransactionDraft {
            parent,
            owner_id: wallet.owner_id,
            wallet_id: wallet.id,
            category_id: None,
            amount: Money::from_cents(*cents),
            due_date: today() + chrono::Days::new(i as u64),
            installment_number: i as u32 + 1,
            total_installments: None,
            status: TransactionStatus::Pending,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_pay_unpay_is_exact_inverse(
        cents in 0i64..10_000_000,
        used_before in 0i64..10_000_000,
    ) {
        let store = MemoryStore::new();
        let mut card = Wallet::credit_card(UserId::new(), "Visa", Money::from_cents(50_000_000));
        if let Some(line) = card.credit_line.as_mut() {
            line.used = Money::from_cents(used_before);
        }
        store.insert_wallet(card.clone());
        let tx = store.save_drafts(&drafts_for(&card, &[cents])).unwrap().remove(0);

        let paid = LedgerService::mark_paid(&tx, &card, None, today()).unwrap();
        store.commit_settlement(&paid).unwrap();
        let unpaid = LedgerService::mark_unpaid(&paid.transaction).unwrap();
        store.commit_settlement(&unpaid).unwrap();

        let after = store.load_transaction(tx.id).unwrap();
        prop_assert_eq!(after.status, TransactionStatus::Pending);
        prop_assert_eq!(after.settled_at, None);
        prop_assert_eq!(
            store.load_wallet(card.id).unwrap().limit_used(),
            Some(Money::from_cents(used_before))
        );
    }

    #[test]
    fn prop_limit_used_tracks_paid_set(
        amounts in prop::collection::vec(1i64..500_000, 1..12),
        toggles in prop::collection::vec(any::<prop::sample::Index>(), 0..40),
    ) {
        let store = MemoryStore::new();
        let card = Wallet::credit_card(UserId::new(), "Visa", Money::from_cents(100_000_000));
        store.insert_wallet(card.clone());
        let children = store.save_drafts(&drafts_for(&card, &amounts)).unwrap();

        for pick in toggles {
            let id = children[pick.index(children.len())].id;
            let current = store.load_transaction(id).unwrap();
            let wallet = store.load_wallet(card.id).unwrap();
            let settlement = if current.is_settled() {
                LedgerService::mark_unpaid(&current).unwrap()
            } else {
                LedgerService::mark_paid(&current, &wallet, None, today()).unwrap()
            };
            store.commit_settlement(&settlement).unwrap();
        }

        let wallet = store.load_wallet(card.id).unwrap();
        let transactions = store.load_transactions(card.owner_id).unwrap();
        prop_assert_eq!(
            wallet.limit_used(),
            Some(AggregationService::recompute_limit_used(&wallet, &transactions))
        );
    }
}
