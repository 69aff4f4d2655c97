//! Common types used across the application.

pub mod id;
pub mod money;

#[cfg(test)]
mod money_props;

pub use id::*;
pub use money::{Money, MoneyError};
