//! Upload command.
//!
//! Dispatches an upload request on its format and answers with a
//! serialisable reply. Only the grid spreadsheet format exists today.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::export::ExportSource;
use crate::grid::{GridClient, GridCredentials, GridServiceOps};
use crate::upload::{UploadHandle, UploadOrchestrator};

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Destination format of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFormat {
    #[serde(rename = "grid/spreadsheet")]
    GridSpreadsheet,
    /// Any format string this build does not know.
    #[serde(other)]
    Unsupported,
}

/// Request to publish an export under a new document title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub format: UploadFormat,
    /// Title of the new document.
    pub name: String,
}

/// Reply sent back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadReply {
    Ok { url: String },
    Error { message: String },
}

impl UploadReply {
    fn error(message: impl Into<String>) -> Self {
        UploadReply::Error {
            message: message.into(),
        }
    }
}

impl From<&AppError> for UploadReply {
    fn from(err: &AppError) -> Self {
        UploadReply::error(err.to_presentation().message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Starts an upload against the configured grid service.
///
/// The reply is sent once the document exists; rows keep streaming in the
/// background. A missing token is refused before any remote call.
pub async fn upload(
    request: UploadRequest,
    source: Arc<dyn ExportSource>,
    credentials: Option<GridCredentials>,
    config: &UploadConfig,
) -> UploadReply {
    let credentials = match credentials {
        Some(creds) if !creds.is_empty() => creds,
        _ => return UploadReply::error("Not authorized"),
    };

    let client = match GridClient::new(config, credentials) {
        Ok(client) => client,
        Err(e) => return UploadReply::from(&e),
    };

    upload_with(Arc::new(client), request, source, config)
        .await
        .0
}

/// Same as [`upload`] with an explicit service. Also returns the handle of
/// the background task when one was started.
pub async fn upload_with(
    service: Arc<dyn GridServiceOps>,
    request: UploadRequest,
    source: Arc<dyn ExportSource>,
    config: &UploadConfig,
) -> (UploadReply, Option<UploadHandle>) {
    match request.format {
        UploadFormat::GridSpreadsheet => {}
        UploadFormat::Unsupported => return (UploadReply::error("No such format"), None),
    }

    match start_spreadsheet(service, &request.name, source, config).await {
        Ok(handle) => {
            info!("[UPLOAD] Document for '{}' available", request.name);
            let reply = UploadReply::Ok {
                url: handle.url().to_string(),
            };
            (reply, Some(handle))
        }
        Err(e) => {
            error!("[UPLOAD] Upload of '{}' failed: {}", request.name, e);
            (UploadReply::from(&e), None)
        }
    }
}

async fn start_spreadsheet(
    service: Arc<dyn GridServiceOps>,
    name: &str,
    source: Arc<dyn ExportSource>,
    config: &UploadConfig,
) -> Result<UploadHandle, AppError> {
    let orchestrator = UploadOrchestrator::new(service, config.clone())?;
    orchestrator.start(source, name).await
}
