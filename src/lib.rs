pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod upload;

pub use commands::{UploadFormat, UploadReply, UploadRequest};
pub use config::{FailureReport, UploadConfig};
pub use error::AppError;
pub use upload::{UploadHandle, UploadOrchestrator, UploadReport};
