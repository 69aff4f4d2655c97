//! Wallets and credit lines.

use cofre_shared::types::{Money, UserId, WalletId};
use serde::{Deserialize, Serialize};

/// Wallet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// Checking account, cash or anything balance-like.
    Checking,
    /// Credit card with a limit.
    CreditCard,
}

/// Credit-card limit and how much of it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLine {
    /// Card limit.
    pub limit: Money,
    /// Portion of the limit consumed by paid charges.
    pub used: Money,
}

/// A balance-holding container.
///
/// The balance itself is never stored; see
/// [`AggregationService::wallet_balance`](crate::aggregation::AggregationService::wallet_balance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier.
    pub id: WalletId,
    /// Owning user.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Opening balance.
    pub initial_balance: Money,
    /// Present only for credit cards.
    pub credit_line: Option<CreditLine>,
}

impl Wallet {
    /// A checking-style wallet.
    #[must_use]
    pub fn checking(owner_id: UserId, name: impl Into<String>, initial_balance: Money) -> Self {
        Self {
            id: WalletId::new(),
            owner_id,
            name: name.into(),
            initial_balance,
            credit_line: None,
        }
    }

    /// A credit-card wallet with nothing drawn.
    #[must_use]
    pub fn credit_card(owner_id: UserId, name: impl Into<String>, limit: Money) -> Self {
        Self {
            id: WalletId::new(),
            owner_id,
            name: name.into(),
            initial_balance: Money::ZERO,
            credit_line: Some(CreditLine {
                limit,
                used: Money::ZERO,
            }),
        }
    }

    /// Wallet type, derived from the credit line.
    #[must_use]
    pub const fn kind(&self) -> WalletKind {
        match self.credit_line {
            Some(_) => WalletKind::CreditCard,
            None => WalletKind::Checking,
        }
    }

    /// Returns true for credit cards.
    #[must_use]
    pub const fn is_credit_card(&self) -> bool {
        self.credit_line.is_some()
    }

    /// Limit used; `None` for non-card wallets.
    #[must_use]
    pub fn limit_used(&self) -> Option<Money> {
        self.credit_line.map(|line| line.used)
    }

    /// Remaining limit (`limit - used`); `None` for non-card wallets.
    #[must_use]
    pub fn available_limit(&self) -> Option<Money> {
        self.credit_line.map(|line| line.limit - line.used)
    }
}
