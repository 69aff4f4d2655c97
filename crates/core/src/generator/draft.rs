//! Unsaved transaction.

use chrono::NaiveDate;
use cofre_shared::types::{CategoryId, Money, UserId, WalletId};
use serde::{Deserialize, Serialize};

use crate::ledger::TransactionStatus;
use crate::obligation::{ParentRef, RecurringObligation};
use crate::recurrence::ScheduledOccurrence;

/// A child transaction not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Generating obligation.
    pub parent: ParentRef,
    /// Owning user.
    pub owner_id: UserId,
    /// Settling wallet.
    pub wallet_id: WalletId,
    /// Category copied from the parent.
    pub category_id: Option<CategoryId>,
    /// Amount due.
    pub amount: Money,
    /// Due date.
    pub due_date: NaiveDate,
    /// 1-based position against the full schedule.
    pub installment_number: u32,
    /// Full installment count; `None` unless the parent has installments.
    pub total_installments: Option<u32>,
    /// Always `Pending`.
    pub status: TransactionStatus,
}

impl TransactionDraft {
    /// Builds a pending draft for one scheduled occurrence of `parent`.
    #[must_use]
    pub fn for_occurrence<O: RecurringObligation + ?Sized>(
        parent: &O,
        occurrence: &ScheduledOccurrence,
    ) -> Self {
        Self {
            parent: parent.parent(),
            owner_id: parent.owner_id(),
            wallet_id: parent.wallet_id(),
            category_id: parent.category_id(),
            amount: occurrence.amount,
            due_date: occurrence.due_date,
            installment_number: occurrence.sequence_number,
            total_installments: occurrence.total_occurrences,
            status: TransactionStatus::Pending,
        }
    }

    /// Installment label such as `"4/12"`, or `None` outside installment plans.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.total_installments
            .map(|total| format!("{}/{total}", self.installment_number))
    }
}
