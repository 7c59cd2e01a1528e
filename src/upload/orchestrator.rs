//! Upload orchestration.
//!
//! The foreground part creates and sizes the destination and builds the cell
//! index. It then spawns one background task that streams the export into
//! the worksheet, and returns the document reference without waiting for it.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::export::ExportSource;
use crate::grid::client::redact_id;
use crate::grid::{GridDocument, GridServiceOps, Worksheet};
use crate::upload::cell_index::CellIndex;
use crate::upload::sink::{GridRowSink, SinkStats};
use crate::upload::submitter::BatchSubmitter;

// ─────────────────────────────────────────────────────────────────────────────
// Upload state
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of one upload. Transitions are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Created,
    Sized,
    WorksheetReady,
    IndexBuilt,
    Streaming,
    Completed,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Completed | UploadPhase::Failed)
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadPhase::Created => "created",
            UploadPhase::Sized => "sized",
            UploadPhase::WorksheetReady => "worksheet_ready",
            UploadPhase::IndexBuilt => "index_built",
            UploadPhase::Streaming => "streaming",
            UploadPhase::Completed => "completed",
            UploadPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Final state of the background streaming task.
#[derive(Debug)]
pub struct UploadReport {
    pub upload_id: String,
    pub phase: UploadPhase,
    pub stats: SinkStats,
    /// Error that ended streaming early, if any.
    pub error: Option<AppError>,
}

/// Returned to the caller as soon as the destination exists and is sized.
#[derive(Debug)]
pub struct UploadHandle {
    pub upload_id: String,
    pub document: GridDocument,
    pub worksheet: Worksheet,
    task: JoinHandle<UploadReport>,
}

impl UploadHandle {
    /// Public reference of the new document.
    pub fn url(&self) -> &str {
        &self.document.url
    }

    /// Waits for the background task to finish. Dropping the handle instead
    /// leaves the upload running.
    pub async fn wait(self) -> UploadReport {
        let upload_id = self.upload_id;
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                error!("[UPLOAD] {} background task panicked: {}", redact_id(&upload_id), e);
                UploadReport {
                    upload_id,
                    phase: UploadPhase::Failed,
                    stats: SinkStats::default(),
                    error: Some(AppError::Internal(format!("Task join error: {}", e))),
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UploadOrchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Publishes export sources into new grid documents.
#[derive(Clone)]
pub struct UploadOrchestrator {
    service: Arc<dyn GridServiceOps>,
    config: UploadConfig,
}

impl UploadOrchestrator {
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if `config` does not validate.
    pub fn new(service: Arc<dyn GridServiceOps>, config: UploadConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { service, config })
    }

    /// Creates the destination, spawns the streaming task and returns at once.
    ///
    /// Must be called within a tokio runtime. Any error before streaming
    /// starts is returned here; later errors only reach the logs and the
    /// [`UploadReport`].
    pub async fn start(
        &self,
        source: Arc<dyn ExportSource>,
        title: &str,
    ) -> Result<UploadHandle, AppError> {
        let upload_id = Uuid::new_v4().to_string();
        let short_id = redact_id(&upload_id);
        let threshold = self.config.flush_threshold()?;

        // Sizing is read up front so an empty dataset leaves nothing behind.
        let extents = source.extents().await?;
        if extents.is_empty() {
            warn!("[UPLOAD] {} dataset is empty, nothing to upload", short_id);
            return Err(AppError::EmptyDataset);
        }

        // Document
        let created = self.service.create_document(title).await?;
        let document = created.document;
        log_phase(&short_id, UploadPhase::Created);
        log_phase(&short_id, UploadPhase::Sized);

        // Worksheet of exactly that size
        let worksheet = self
            .service
            .create_worksheet(
                &document,
                &self.config.worksheet_title,
                extents.rows,
                extents.cols,
            )
            .await?;
        if worksheet.dimensions() != (extents.rows, extents.cols) {
            return Err(AppError::WorksheetSizeMismatch {
                requested: (extents.rows, extents.cols),
                created: worksheet.dimensions(),
            });
        }

        // Default worksheet goes away
        if let Some(default_worksheet) = created.default_worksheet {
            self.service.delete_worksheet(&default_worksheet).await?;
        }
        log_phase(&short_id, UploadPhase::WorksheetReady);

        // Index is complete before anything reads it
        let index = CellIndex::build(self.service.as_ref(), &worksheet).await?;
        log_phase(&short_id, UploadPhase::IndexBuilt);

        // Streaming runs in the background
        let submitter = BatchSubmitter::new(
            self.service.clone(),
            index.batch_link(),
            self.config.failure_report,
        );
        let sink = GridRowSink::new(index, submitter, threshold);
        let task = tokio::spawn(stream_upload(upload_id.clone(), source, sink));

        info!(
            "[UPLOAD] {} started: {} rows x {} cols into document {}",
            short_id,
            extents.rows,
            extents.cols,
            redact_id(&document.id)
        );

        // No waiting on the task
        Ok(UploadHandle {
            upload_id,
            document,
            worksheet,
            task,
        })
    }
}

/// Background path: runs the export into the sink to completion.
async fn stream_upload(
    upload_id: String,
    source: Arc<dyn ExportSource>,
    mut sink: GridRowSink,
) -> UploadReport {
    let short_id = redact_id(&upload_id);
    log_phase(&short_id, UploadPhase::Streaming);

    let result = source.export_rows(&mut sink).await;
    let stats = sink.stats();

    match result {
        Ok(()) => {
            log_phase(&short_id, UploadPhase::Completed);
            UploadReport {
                upload_id,
                phase: UploadPhase::Completed,
                stats,
                error: None,
            }
        }
        Err(e) => {
            error!("[UPLOAD] {} error uploading data to grid: {}", short_id, e);
            log_phase(&short_id, UploadPhase::Failed);
            UploadReport {
                upload_id,
                phase: UploadPhase::Failed,
                stats,
                error: Some(e),
            }
        }
    }
}

fn log_phase(short_id: &str, phase: UploadPhase) {
    info!("[UPLOAD] {} -> {}", short_id, phase);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
