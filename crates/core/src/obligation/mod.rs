//! Recurring obligations: accounts (bills) and incomes.
//!
//! Both parents share one generation and settlement path through the
//! [`RecurringObligation`] trait. The only differences are vocabulary
//! (paid vs received) and the direction money moves in a wallet, which
//! [`Flow`] carries.

pub mod error;
pub mod service;
pub mod types;

pub use error::ObligationError;
pub use service::ObligationService;
pub use types::{
    Account, Flow, Income, ObligationInput, ObligationStatus, ParentRef, RecurringObligation,
};
