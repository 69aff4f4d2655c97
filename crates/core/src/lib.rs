//! Core ledger logic for Cofre.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Recurrence scheduling, transaction generation, settlement transitions and
//! balance aggregation all live here; persistence is reached through the
//! [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `clock` - Injectable source of "now" and "today"
//! - `calendar` - Month arithmetic and month periods
//! - `obligation` - Accounts (bills) and incomes behind one recurring-obligation trait
//! - `recurrence` - One-time, installment and open-ended recurrence policies
//! - `generator` - Materializing policies into transaction drafts, horizon top-ups
//! - `ledger` - Transactions, wallets, pay/receive transitions and the store seam
//! - `aggregation` - Balances, monthly totals, cash-flow series, dashboard queries
//! - `budget` - Budget vs actual per category

pub mod aggregation;
pub mod budget;
pub mod calendar;
pub mod clock;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod obligation;
pub mod recurrence;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ErrorKind;
