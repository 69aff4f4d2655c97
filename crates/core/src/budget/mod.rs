//! Budgets and budget-vs-actual per category.

pub mod error;
pub mod service;
pub mod types;


pub use error::BudgetError;
pub use service::BudgetService;
pub use types::{
    Budget, BudgetRecurrence, BudgetVsActual, CreateBudgetInput, VarianceResult, VarianceStatus,
};
