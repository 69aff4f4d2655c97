//! Recurrence policies.
//!
//! A policy turns a handful of parameters into a lazy schedule of
//! `(sequence_number, due_date, amount)` occurrences:
//! - `OneTime` - a single occurrence
//! - `Installments` - a fixed count, total split to the cent
//! - `Recurring` - open-ended, kept populated up to a rolling horizon

pub mod error;
pub mod policy;

#[cfg(test)]
mod policy_props;

pub use error::RecurrenceError;
pub use policy::{Occurrences, RecurrencePolicy, ScheduledOccurrence};
