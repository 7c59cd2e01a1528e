//! Row sink that turns exported rows into batched cell mutations.

use std::num::NonZeroUsize;

use tracing::{debug, error, info};

use crate::error::AppError;
use crate::export::{Row, RowSink};
use crate::grid::{BoxFuture, Mutation};
use crate::upload::batch::BatchAccumulator;
use crate::upload::cell_index::CellIndex;
use crate::upload::submitter::BatchSubmitter;

/// Running totals of one streaming pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub rows: usize,
    pub mutations: usize,
    pub batches_submitted: usize,
    pub batches_failed: usize,
    pub cell_failures: usize,
}

/// Consumes exported rows and writes them into the indexed worksheet.
pub struct GridRowSink {
    index: CellIndex,
    submitter: BatchSubmitter,
    accumulator: BatchAccumulator,
    row: usize,
    stats: SinkStats,
}

impl GridRowSink {
    pub fn new(index: CellIndex, submitter: BatchSubmitter, threshold: NonZeroUsize) -> Self {
        Self {
            index,
            submitter,
            accumulator: BatchAccumulator::new(threshold),
            row: 0,
            stats: SinkStats::default(),
        }
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Builds the mutations of one row without touching the accumulator, so
    /// an out-of-range row leaves no partial state behind.
    fn row_mutations(&self, cells: Row) -> Result<Vec<Mutation>, AppError> {
        let mut mutations = Vec::new();
        for (col, cell) in cells.into_iter().enumerate() {
            let Some(cell) = cell else { continue };
            let Some(value) = cell.text else { continue };

            let identity = self.index.lookup(self.row, col).ok_or(AppError::CellOutOfRange {
                row: self.row + 1,
                col: col + 1,
                rows: self.index.rows(),
                cols: self.index.cols(),
            })?;

            mutations.push(Mutation {
                cell: identity.clone(),
                value,
                link: cell.link,
                batch_id: Mutation::batch_id_for(self.row, col),
            });
        }
        Ok(mutations)
    }

    /// Submits the open unit. A failed submission is logged and counted, and
    /// streaming goes on with the next rows.
    async fn flush(&mut self) {
        let unit = self.accumulator.take_and_reset();
        if unit.is_empty() {
            debug!("[SINK] Nothing to submit for rows {:?}", unit.rows);
            return;
        }

        let rows = unit.rows.clone();
        match self.submitter.submit(unit).await {
            Ok(report) => {
                self.stats.batches_submitted += 1;
                self.stats.cell_failures += report.failures.len();
            }
            Err(e) => {
                self.stats.batches_failed += 1;
                error!(
                    "[SINK] Batch for rows {}..{} failed and was not applied: {}",
                    rows.start + 1,
                    rows.end,
                    e
                );
            }
        }
    }
}

impl RowSink for GridRowSink {
    fn start_file(&mut self) -> BoxFuture<'_, Result<(), AppError>> {
        Box::pin(async move {
            info!(
                "[SINK] Streaming into {}x{} worksheet",
                self.index.rows(),
                self.index.cols()
            );
            Ok(())
        })
    }

    fn add_row(&mut self, cells: Row, _is_header: bool) -> BoxFuture<'_, Result<(), AppError>> {
        Box::pin(async move {
            let mutations = self.row_mutations(cells)?;
            self.stats.mutations += mutations.len();
            for mutation in mutations {
                self.accumulator.add(mutation);
            }

            self.accumulator.finish_row();
            self.row += 1;
            self.stats.rows += 1;

            if self.accumulator.should_flush() {
                self.flush().await;
            }
            Ok(())
        })
    }

    fn end_file(&mut self) -> BoxFuture<'_, Result<(), AppError>> {
        Box::pin(async move {
            if !self.accumulator.is_empty() {
                self.flush().await;
            }
            info!(
                "[SINK] Finished {} rows: {} mutations in {} batches ({} failed, {} cell failures)",
                self.stats.rows,
                self.stats.mutations,
                self.stats.batches_submitted,
                self.stats.batches_failed,
                self.stats.cell_failures
            );
            Ok(())
        })
    }
}
