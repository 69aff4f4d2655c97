//! Property-based tests for money arithmetic.
//!
//! - Split exactness: parts sum to the total, count matches, spread <= 1 cent
//! - Display conversion round-trips whole cents

use proptest::prelude::*;

use super::money::Money;

/// Strategy for non-negative totals (0.00 to 10,000,000.00).
fn total_strategy() -> impl Strategy<Value = i64> {
    0i64..1_000_000_000i64
}

/// Strategy for split counts.
fn parts_strategy() -> impl Strategy<Value = i64> {
    1i64..500
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* total >= 0 and n >= 1, the split sums to the total exactly.
    #[test]
    fn prop_split_sums_to_total(total in total_strategy(), parts in parts_strategy()) {
        let split = Money::from_cents(total).split_evenly(parts).unwrap();
        prop_assert_eq!(split.iter().sum::<Money>(), Money::from_cents(total));
    }

    /// *For any* split, exactly n parts are produced.
    #[test]
    fn prop_split_has_n_parts(total in total_strategy(), parts in parts_strategy()) {
        let split = Money::from_cents(total).split_evenly(parts).unwrap();
        prop_assert_eq!(split.len() as i64, parts);
    }

    /// *For any* split, no two parts differ by more than one cent and larger
    /// parts come first.
    #[test]
    fn prop_split_is_even_and_front_loaded(total in total_strategy(), parts in parts_strategy()) {
        let split = Money::from_cents(total).split_evenly(parts).unwrap();
        let max = split.iter().max().copied().unwrap_or_default();
        let min = split.iter().min().copied().unwrap_or_default();
        prop_assert!((max - min).cents() <= 1);
        prop_assert!(split.iter().all(|p| !p.is_negative()));
        prop_assert!(split.windows(2).all(|w| w[0] >= w[1]));
    }

    /// *For any* cents value, display conversion is lossless.
    #[test]
    fn prop_display_round_trip(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
        let money = Money::from_cents(cents);
        prop_assert_eq!(Money::from_display(money.to_display()).unwrap(), money);
    }
}
