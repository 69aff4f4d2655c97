//! Obligation domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use cofre_shared::types::{AccountId, CategoryId, IncomeId, Money, UserId, WalletId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::{RecurrenceError, RecurrencePolicy};

/// Direction money moves when an obligation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// A bill: settling it takes money out of the wallet.
    Expense,
    /// An income: settling it puts money into the wallet.
    Income,
}

impl Flow {
    /// Word used for a settled occurrence.
    #[must_use]
    pub const fn settled_label(self) -> &'static str {
        match self {
            Self::Expense => "paid",
            Self::Income => "received",
        }
    }

    /// Signed effect of a settled amount on a wallet balance.
    #[must_use]
    pub const fn signed(self, amount: Money) -> Money {
        match self {
            Self::Expense => Money::from_cents(-amount.cents()),
            Self::Income => amount,
        }
    }
}

/// Lifecycle status of an account or income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    /// Still generating and accepting settlements.
    Active,
    /// Every occurrence has been settled.
    Completed,
    /// Abandoned; never grows new occurrences.
    Cancelled,
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Reference from a transaction to the obligation that generated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// Generated by a bill.
    Account(AccountId),
    /// Generated by an income.
    Income(IncomeId),
}

impl ParentRef {
    /// Flow of the referenced parent.
    #[must_use]
    pub const fn flow(self) -> Flow {
        match self {
            Self::Account(_) => Flow::Expense,
            Self::Income(_) => Flow::Income,
        }
    }

    /// Raw identifier.
    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Account(id) => id.into_inner(),
            Self::Income(id) => id.into_inner(),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account:{id}"),
            Self::Income(id) => write!(f, "income:{id}"),
        }
    }
}

/// An obligation that generates dated transactions from a recurrence policy.
pub trait RecurringObligation {
    /// Reference used by generated transactions.
    fn parent(&self) -> ParentRef;
    /// Owning user.
    fn owner_id(&self) -> UserId;
    /// Wallet that settles the generated transactions.
    fn wallet_id(&self) -> WalletId;
    /// Category copied onto generated transactions.
    fn category_id(&self) -> Option<CategoryId>;
    /// Display name.
    fn name(&self) -> &str;
    /// Lifecycle status.
    fn status(&self) -> ObligationStatus;
    /// Recurrence policy.
    fn policy(&self) -> &RecurrencePolicy;

    /// Expense or income.
    fn flow(&self) -> Flow {
        self.parent().flow()
    }

    /// Returns true if the obligation can still grow and settle.
    fn is_active(&self) -> bool {
        self.status() == ObligationStatus::Active
    }
}

/// Fields shared by account and income creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationInput {
    /// Owning user.
    pub owner_id: UserId,
    /// Settling wallet.
    pub wallet_id: WalletId,
    /// Optional category.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Free-text note.
    pub note: Option<String>,
    /// Recurrence policy.
    pub policy: RecurrencePolicy,
}

macro_rules! obligation {
    ($name:ident, $id:ident, $variant:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Unique identifier.
            pub id: $id,
            /// Owning user.
            pub owner_id: UserId,
            /// Settling wallet.
            pub wallet_id: WalletId,
            /// Optional category.
            pub category_id: Option<CategoryId>,
            /// Display name.
            pub name: String,
            /// Free-text note.
            pub note: Option<String>,
            /// Recurrence policy; immutable after creation.
            pub policy: RecurrencePolicy,
            /// Lifecycle status.
            pub status: ObligationStatus,
            /// Creation timestamp.
            pub created_at: DateTime<Utc>,
        }

        impl $name {
            /// Validates the policy and creates an active obligation.
            ///
            /// # Errors
            ///
            /// Returns the policy validation error.
            pub fn create(
                input: ObligationInput,
                created_at: DateTime<Utc>,
            ) -> Result<Self, RecurrenceError> {
                input.policy.validate()?;
                Ok(Self {
                    id: $id::new(),
                    owner_id: input.owner_id,
                    wallet_id: input.wallet_id,
                    category_id: input.category_id,
                    name: input.name,
                    note: input.note,
                    policy: input.policy,
                    status: ObligationStatus::Active,
                    created_at,
                })
            }

            /// Total amount (installment total, one-time amount or per-period amount).
            #[must_use]
            pub const fn total_amount(&self) -> Money {
                self.policy.total_amount()
            }

            /// Date of the first occurrence.
            #[must_use]
            pub const fn start_date(&self) -> NaiveDate {
                self.policy.start_date()
            }
        }

        impl RecurringObligation for $name {
            fn parent(&self) -> ParentRef {
                ParentRef::$variant(self.id)
            }

            fn owner_id(&self) -> UserId {
                self.owner_id
            }

            fn wallet_id(&self) -> WalletId {
                self.wallet_id
            }

            fn category_id(&self) -> Option<CategoryId> {
                self.category_id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn status(&self) -> ObligationStatus {
                self.status
            }

            fn policy(&self) -> &RecurrencePolicy {
                &self.policy
            }
        }
    };
}

obligation!(Account, AccountId, Account, "A bill: money owed on one or more dates.");
obligation!(Income, IncomeId, Income, "An income: money expected on one or more dates.");
