//! Obligation lifecycle rules.

use super::error::ObligationError;
use super::types::{ObligationStatus, RecurringObligation};
use crate::ledger::{Transaction, TransactionStatus};

/// Stateless service for account/income lifecycle decisions.
pub struct ObligationService;

impl ObligationService {
    /// Validates a status change.
    ///
    /// Allowed: active to completed, active to cancelled, completed back to
    /// active. Everything else (including staying put) is rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any other pair.
    pub fn transition(
        from: ObligationStatus,
        to: ObligationStatus,
    ) -> Result<ObligationStatus, ObligationError> {
        match (from, to) {
            (ObligationStatus::Active, ObligationStatus::Completed | ObligationStatus::Cancelled)
            | (ObligationStatus::Completed, ObligationStatus::Active) => Ok(to),
            _ => Err(ObligationError::InvalidTransition { from, to }),
        }
    }

    /// Children a cancellation should void: the pending ones, due-date order.
    #[must_use]
    pub fn pending_to_cancel(children: &[Transaction]) -> Vec<&Transaction> {
        let mut pending: Vec<&Transaction> = children
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Pending)
            .collect();
        pending.sort_by_key(|tx| tx.due_date);
        pending
    }

    /// Returns true when a fixed-schedule parent has nothing left to settle
    /// and may be marked completed. Recurring parents never complete on
    /// their own.
    #[must_use]
    pub fn is_fully_settled<O: RecurringObligation + ?Sized>(
        parent: &O,
        children: &[Transaction],
    ) -> bool {
        !parent.policy().is_recurring()
            && children.iter().any(Transaction::is_settled)
            && children.iter().all(|tx| !tx.is_pending())
    }
}
