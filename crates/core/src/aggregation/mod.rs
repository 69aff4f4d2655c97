//! Balance and aggregation engine.
//!
//! Read-only figures computed by summing over the transaction set: wallet
//! and total balances, monthly totals, percentage deltas, cash-flow series
//! and the dashboard queries notification and report consumers poll.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::AggregationService;
pub use types::{CashFlowPoint, CategoryTotal, EndingAccount, MonthlySummary};
