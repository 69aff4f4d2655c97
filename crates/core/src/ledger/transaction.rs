//! Transaction aggregate.

use chrono::NaiveDate;
use cofre_shared::types::{CategoryId, Money, TransactionId, UserId, WalletId};
use serde::{Deserialize, Serialize};

use crate::generator::TransactionDraft;
use crate::obligation::{Flow, ParentRef};

/// Stored transaction status.
///
/// There is no stored "overdue": it is derived at read time by
/// [`Transaction::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting to be paid or received.
    Pending,
    /// Paid (expense) or received (income).
    Settled,
    /// Voided together with its parent.
    Cancelled,
}

/// Status as shown to readers, with overdue derived from the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveStatus {
    /// Pending and not yet due.
    Pending,
    /// Pending with a due date in the past.
    Overdue,
    /// Settled expense.
    Paid,
    /// Settled income.
    Received,
    /// Cancelled.
    Cancelled,
}

/// One dated occurrence generated from an account or income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Obligation that generated this transaction.
    pub parent: ParentRef,
    /// Owning user.
    pub owner_id: UserId,
    /// Wallet it settles against.
    pub wallet_id: WalletId,
    /// Category, copied from the parent at generation time.
    pub category_id: Option<CategoryId>,
    /// Amount due.
    pub amount: Money,
    /// Due (or expected) date.
    pub due_date: NaiveDate,
    /// Paid or received date.
    pub settled_at: Option<NaiveDate>,
    /// 1-based position against the full schedule.
    pub installment_number: u32,
    /// Full installment count; `None` unless the parent has installments.
    pub total_installments: Option<u32>,
    /// Stored status.
    pub status: TransactionStatus,
    /// Amount drawn on a credit-card limit when this was paid.
    pub limit_drawn: Option<Money>,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl Transaction {
    /// Materializes a draft into a pending transaction at version 0.
    #[must_use]
    pub fn from_draft(draft: &TransactionDraft) -> Self {
        Self {
            id: TransactionId::new(),
            parent: draft.parent,
            owner_id: draft.owner_id,
            wallet_id: draft.wallet_id,
            category_id: draft.category_id,
            amount: draft.amount,
            due_date: draft.due_date,
            settled_at: None,
            installment_number: draft.installment_number,
            total_installments: draft.total_installments,
            status: draft.status,
            limit_drawn: None,
            version: 0,
        }
    }

    /// Expense or income.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        self.parent.flow()
    }

    /// Returns true if paid or received.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == TransactionStatus::Settled
    }

    /// Returns true if still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// Returns true if pending with a due date before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }

    /// Reader-facing status as of `today`.
    #[must_use]
    pub fn effective_status(&self, today: NaiveDate) -> EffectiveStatus {
        match (self.status, self.flow()) {
            (TransactionStatus::Pending, _) if self.due_date < today => EffectiveStatus::Overdue,
            (TransactionStatus::Pending, _) => EffectiveStatus::Pending,
            (TransactionStatus::Settled, Flow::Expense) => EffectiveStatus::Paid,
            (TransactionStatus::Settled, Flow::Income) => EffectiveStatus::Received,
            (TransactionStatus::Cancelled, _) => EffectiveStatus::Cancelled,
        }
    }

    /// Returns true for the last installment of an installment plan.
    #[must_use]
    pub fn is_final_installment(&self) -> bool {
        self.total_installments == Some(self.installment_number)
    }

    /// Signed effect on the wallet balance: zero unless settled.
    #[must_use]
    pub const fn balance_effect(&self) -> Money {
        match self.status {
            TransactionStatus::Settled => self.flow().signed(self.amount),
            TransactionStatus::Pending | TransactionStatus::Cancelled => Money::ZERO,
        }
    }

    /// First field that `next` changes among those only the generator or a
    /// settlement may write.
    #[must_use]
    pub fn ledger_owned_change(&self, next: &Self) -> Option<&'static str> {
        [
            ("parent", self.parent != next.parent),
            ("owner_id", self.owner_id != next.owner_id),
            ("wallet_id", self.wallet_id != next.wallet_id),
            ("amount", self.amount != next.amount),
            ("due_date", self.due_date != next.due_date),
            ("installment_number", self.installment_number != next.installment_number),
            ("total_installments", self.total_installments != next.total_installments),
            ("status", self.status != next.status),
            ("settled_at", self.settled_at != next.settled_at),
            ("limit_drawn", self.limit_drawn != next.limit_drawn),
        ]
        .into_iter()
        .find_map(|(field, changed)| changed.then_some(field))
    }
}
