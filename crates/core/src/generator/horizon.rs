//! Periodic horizon top-up over a store.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::service::TransactionGenerator;
use crate::ledger::LedgerStore;
use crate::obligation::{ParentRef, RecurringObligation};

/// A parent that could not be topped up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HorizonFailure {
    /// The parent.
    pub parent: ParentRef,
    /// Error code of the failure.
    pub error_code: &'static str,
    /// Rendered error.
    pub message: String,
}

/// Outcome of one [`HorizonJob::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HorizonReport {
    /// Parents that received at least one new transaction.
    pub parents_extended: usize,
    /// Parents skipped (inactive or not recurring).
    pub parents_skipped: usize,
    /// Transactions created.
    pub drafts_created: usize,
    /// Parents whose top-up failed; the rest of the batch still runs.
    pub failures: Vec<HorizonFailure>,
}

/// Keeps recurring parents materialized up to their rolling horizon.
///
/// Meant to be triggered by an external scheduler; running it twice on the
/// same day creates nothing the second time.
pub struct HorizonJob;

impl HorizonJob {
    /// Tops up every active recurring parent in `parents` as of `today`.
    pub fn run<S: LedgerStore + ?Sized>(
        store: &S,
        parents: &[&dyn RecurringObligation],
        today: NaiveDate,
    ) -> HorizonReport {
        let mut report = HorizonReport::default();

        for parent in parents {
            let Some(horizon) = parent
                .is_active()
                .then(|| parent.policy().horizon_for(today))
                .flatten()
            else {
                report.parents_skipped += 1;
                continue;
            };

            match Self::top_up_one(store, *parent, horizon) {
                Ok(0) => {}
                Ok(created) => {
                    report.parents_extended += 1;
                    report.drafts_created += created;
                }
                Err((error_code, message)) => {
                    warn!(parent = %parent.parent(), error_code, %message, "horizon top-up failed");
                    report.failures.push(HorizonFailure {
                        parent: parent.parent(),
                        error_code,
                        message,
                    });
                }
            }
        }

        info!(
            extended = report.parents_extended,
            skipped = report.parents_skipped,
            created = report.drafts_created,
            failed = report.failures.len(),
            "horizon top-up finished"
        );
        report
    }

    fn top_up_one<S: LedgerStore + ?Sized>(
        store: &S,
        parent: &dyn RecurringObligation,
        horizon: NaiveDate,
    ) -> Result<usize, (&'static str, String)> {
        let children = store
            .load_children(parent.parent())
            .map_err(|e| (e.error_code(), e.to_string()))?;
        let existing = TransactionGenerator::max_due_date(&children);

        let drafts = TransactionGenerator::top_up(parent, existing, horizon)
            .map_err(|e| (e.error_code(), e.to_string()))?;
        if drafts.is_empty() {
            return Ok(0);
        }

        let saved = store
            .save_drafts(&drafts)
            .map_err(|e| (e.error_code(), e.to_string()))?;
        Ok(saved.len())
    }
}
