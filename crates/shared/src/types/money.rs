//! Money type backed by integer cents.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a whole number of cents (`i64`). `Decimal` only shows up at
//! the presentation edge through [`Money::to_display`] and [`Money::from_display`].

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places carried by the display representation.
pub const DISPLAY_SCALE: u32 = 2;

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// An argument was outside the accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The result does not fit in 64-bit cents.
    #[error("Money arithmetic overflow")]
    Overflow,

    /// A display amount carried more precision than cents can hold.
    #[error("Amount {0} has more than 2 decimal places")]
    PrecisionLoss(Decimal),
}

impl MoneyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Overflow => "MONEY_OVERFLOW",
            Self::PrecisionLoss(_) => "PRECISION_LOSS",
        }
    }
}

/// A monetary amount in cents.
///
/// Signed so that deltas and negative balances are representable; operations
/// that only make sense for non-negative totals validate their input.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Converts a display amount (e.g. `333.34`) into cents.
    ///
    /// # Errors
    ///
    /// Returns `PrecisionLoss` if the amount has more than two decimal places
    /// and `Overflow` if it does not fit in 64-bit cents.
    pub fn from_display(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > DISPLAY_SCALE {
            return Err(MoneyError::PrecisionLoss(amount));
        }

        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Converts to a two-decimal display amount.
    #[must_use]
    pub fn to_display(self) -> Decimal {
        Decimal::new(self.0, DISPLAY_SCALE)
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the difference does not fit.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Sums amounts, failing instead of wrapping.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if a partial sum does not fit.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Result<Self, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Multiplies by an integer factor.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the product does not fit.
    pub fn multiply_by_scalar(self, factor: i64) -> Result<Self, MoneyError> {
        self.0.checked_mul(factor).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Share of `whole` represented by `self`, as a percentage with two decimals.
    ///
    /// A zero `whole` yields zero rather than an error.
    #[must_use]
    pub fn percentage_of(self, whole: Self) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }

        (Decimal::from(self.0) * Decimal::ONE_HUNDRED / Decimal::from(whole.0))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Splits a non-negative total into `parts` amounts that sum to it exactly.
    ///
    /// Remainder cents go to the earliest parts, one cent each, so
    /// `100_000` over 3 becomes `[33_334, 33_333, 33_333]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `parts < 1` or the total is negative.
    pub fn split_evenly(self, parts: i64) -> Result<Vec<Self>, MoneyError> {
        if parts < 1 {
            return Err(MoneyError::InvalidArgument(format!(
                "cannot split into {parts} parts"
            )));
        }
        if self.is_negative() {
            return Err(MoneyError::InvalidArgument(format!(
                "cannot split negative amount {self}"
            )));
        }

        let count = usize::try_from(parts)
            .map_err(|_| MoneyError::InvalidArgument(format!("too many parts: {parts}")))?;
        let base = self.0 / parts;
        let remainder = usize::try_from(self.0 % parts).unwrap_or(0);

        Ok((0..count)
            .map(|i| if i < remainder { Self(base + 1) } else { Self(base) })
            .collect())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
