//! Materializing recurrence policies into drafts.

use chrono::NaiveDate;
use tracing::debug;

use super::draft::TransactionDraft;
use crate::calendar::add_months;
use crate::ledger::Transaction;
use crate::obligation::RecurringObligation;
use crate::recurrence::{RecurrenceError, RecurrencePolicy};

/// Stateless generator of child transactions.
pub struct TransactionGenerator;

impl TransactionGenerator {
    /// Drafts for a newly created parent.
    ///
    /// One-time and installment parents get their whole schedule (minus any
    /// already-paid installments). Recurring parents get the window from
    /// their start up to `horizon_months` past `today`, or past the start
    /// date when the parent begins later than today.
    ///
    /// # Errors
    ///
    /// Returns `ParentNotActive` for a cancelled or completed parent, or the
    /// policy validation error.
    pub fn generate<O: RecurringObligation + ?Sized>(
        parent: &O,
        today: NaiveDate,
    ) -> Result<Vec<TransactionDraft>, RecurrenceError> {
        if !parent.is_active() {
            return Err(RecurrenceError::ParentNotActive);
        }

        let policy = parent.policy();
        let drafts: Vec<TransactionDraft> = match *policy {
            RecurrencePolicy::Recurring {
                start_date,
                horizon_months,
                ..
            } => {
                let anchor = today.max(start_date);
                let horizon = add_months(anchor, horizon_months)
                    .ok_or(RecurrenceError::DateOutOfRange(anchor, horizon_months))?;
                policy
                    .extend_to(None, horizon)?
                    .iter()
                    .map(|occ| TransactionDraft::for_occurrence(parent, occ))
                    .collect()
            }
            RecurrencePolicy::OneTime { .. } | RecurrencePolicy::Installments { .. } => policy
                .occurrences()?
                .map(|occ| TransactionDraft::for_occurrence(parent, &occ))
                .collect(),
        };

        debug!(
            parent = %parent.parent(),
            drafts = drafts.len(),
            "generated transaction drafts"
        );
        Ok(drafts)
    }

    /// Incremental drafts for a recurring parent: due dates after
    /// `existing_max_due_date` up to `horizon_date` (inclusive).
    ///
    /// A cancelled or completed parent yields no drafts. Calling again with
    /// the same horizon after saving the result yields nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotRecurring` for fixed schedules, or the policy validation error.
    pub fn top_up<O: RecurringObligation + ?Sized>(
        parent: &O,
        existing_max_due_date: Option<NaiveDate>,
        horizon_date: NaiveDate,
    ) -> Result<Vec<TransactionDraft>, RecurrenceError> {
        if !parent.is_active() {
            debug!(parent = %parent.parent(), status = %parent.status(), "skipping top-up");
            return Ok(Vec::new());
        }

        let drafts: Vec<TransactionDraft> = parent
            .policy()
            .extend_to(existing_max_due_date, horizon_date)?
            .iter()
            .map(|occ| TransactionDraft::for_occurrence(parent, occ))
            .collect();

        debug!(
            parent = %parent.parent(),
            horizon = %horizon_date,
            drafts = drafts.len(),
            "topped up recurring horizon"
        );
        Ok(drafts)
    }

    /// Latest due date among materialized children, cancelled ones included.
    #[must_use]
    pub fn max_due_date(children: &[Transaction]) -> Option<NaiveDate> {
        children.iter().map(|tx| tx.due_date).max()
    }
}
