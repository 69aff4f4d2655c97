//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

mod convert;

pub mod budget;
pub mod error;
pub mod ledger;
pub mod obligation;

pub use budget::BudgetRepository;
pub use error::RepositoryError;
pub use ledger::LedgerRepository;
pub use obligation::{Obligation, ObligationRepository, StatusChange};
