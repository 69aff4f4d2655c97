//! Ledger mutation engine.
//!
//! This module implements the settlement side of the ledger:
//! - Transactions and their stored/derived statuses
//! - Wallets and credit lines
//! - Pay/unpay and receive/not-receive transitions with limit side effects
//! - The persistence seam (`LedgerStore`) and an in-memory implementation
//! - `SettlementEngine`, which commits transitions through a store

pub mod engine;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod transaction;
pub mod wallet;

#[cfg(test)]
mod service_props;

pub use engine::SettlementEngine;
pub use error::{LedgerError, StoreError};
pub use memory::MemoryStore;
pub use service::{LedgerService, LimitDelta, Settlement};
pub use store::LedgerStore;
pub use transaction::{EffectiveStatus, Transaction, TransactionStatus};
pub use wallet::{CreditLine, Wallet, WalletKind};
