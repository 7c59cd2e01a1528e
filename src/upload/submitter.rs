//! Batch submission and per-cell outcome inspection.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::FailureReport;
use crate::error::AppError;
use crate::grid::{CellOutcome, CellStatus, GridServiceOps};
use crate::upload::batch::BatchUnit;

/// A per-cell failure taken from a batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub batch_id: String,
    pub code: u16,
    pub reason: String,
    pub content: Option<String>,
}

/// What one submission produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Mutations sent.
    pub submitted: usize,
    /// Outcomes looked at before inspection stopped.
    pub inspected: usize,
    pub failures: Vec<CellFailure>,
}

/// Sends batch units to one worksheet's batch link.
#[derive(Clone)]
pub struct BatchSubmitter {
    service: Arc<dyn GridServiceOps>,
    batch_link: String,
    failure_report: FailureReport,
}

impl BatchSubmitter {
    pub fn new(
        service: Arc<dyn GridServiceOps>,
        batch_link: impl Into<String>,
        failure_report: FailureReport,
    ) -> Self {
        Self {
            service,
            batch_link: batch_link.into(),
            failure_report,
        }
    }

    /// Submits the whole unit and inspects the per-cell outcomes.
    ///
    /// The unit is consumed either way. A transport or protocol failure is
    /// returned as `Err` and the unit is not retried.
    pub async fn submit(&self, unit: BatchUnit) -> Result<BatchReport, AppError> {
        let start = Instant::now();
        let outcome = self
            .service
            .submit_batch(&self.batch_link, &unit.mutations)
            .await?;

        let mut report = BatchReport {
            submitted: unit.len(),
            ..BatchReport::default()
        };
        for result in outcome.results {
            report.inspected += 1;
            let Some(failure) = into_failure(result) else {
                continue;
            };
            warn!(
                "[BATCH] Error: {} failed ({}) {}",
                failure.batch_id,
                failure.reason,
                failure.content.as_deref().unwrap_or("")
            );
            report.failures.push(failure);
            if self.failure_report == FailureReport::FirstFailure {
                break;
            }
        }

        info!(
            "[BATCH] Rows {}..{} submitted: {} mutations, {} failed ({}ms)",
            unit.rows.start + 1,
            unit.rows.end,
            report.submitted,
            report.failures.len(),
            start.elapsed().as_millis()
        );
        Ok(report)
    }
}

fn into_failure(outcome: CellOutcome) -> Option<CellFailure> {
    match outcome.status {
        CellStatus::Success => None,
        CellStatus::Failure {
            code,
            reason,
            content,
        } => Some(CellFailure {
            batch_id: outcome.batch_id,
            code,
            reason,
            content,
        }),
    }
}
