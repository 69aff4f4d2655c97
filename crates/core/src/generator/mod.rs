//! Transaction generation.
//!
//! The generator is the only component that creates child transactions:
//! full schedules for one-time and installment parents, a rolling window
//! for recurring ones, and incremental top-ups as the window moves.

pub mod draft;
pub mod horizon;
pub mod service;

#[cfg(test)]
mod service_props;

pub use draft::TransactionDraft;
pub use horizon::{HorizonFailure, HorizonJob, HorizonReport};
pub use service::TransactionGenerator;
