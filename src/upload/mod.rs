//! Upload pipeline: cell index, batch accumulation, submission and the
//! orchestration that ties them to an export source.

pub mod batch;
pub mod cell_index;
pub mod orchestrator;
pub mod sink;
pub mod submitter;

pub use batch::{BatchAccumulator, BatchUnit};
pub use cell_index::CellIndex;
pub use orchestrator::{UploadHandle, UploadOrchestrator, UploadPhase, UploadReport};
pub use sink::{GridRowSink, SinkStats};
pub use submitter::{BatchReport, BatchSubmitter, CellFailure};
