//! Upload configuration.
//!
//! Every field has a default, so a partial JSON document is enough to
//! override only what differs from the defaults.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::AppError;

/// Default API base for the grid service.
pub const DEFAULT_API_BASE: &str = "https://grid.example.com/api/v1/";

/// Rows of produced mutations per batch submission.
pub const DEFAULT_FLUSH_THRESHOLD_ROWS: usize = 20;

/// Title given to the single worksheet an upload writes into.
pub const DEFAULT_WORKSHEET_TITLE: &str = "Uploaded Data";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// FailureReport
// ─────────────────────────────────────────────────────────────────────────────

/// How many per-cell failures of one batch are inspected and logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReport {
    /// Log the first failed cell and stop inspecting the rest of the batch.
    #[default]
    FirstFailure,
    /// Log every failed cell in the batch.
    All,
}

// ─────────────────────────────────────────────────────────────────────────────
// UploadConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one or more uploads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Base URL that relative API paths are joined onto.
    pub api_base: String,
    /// Rows processed between batch submissions. Must be greater than 0.
    pub flush_threshold_rows: usize,
    /// Title of the worksheet created on the new document.
    pub worksheet_title: String,
    /// Per-request timeout for the HTTP client.
    pub request_timeout_secs: u64,
    /// Per-cell failure inspection policy.
    pub failure_report: FailureReport,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            flush_threshold_rows: DEFAULT_FLUSH_THRESHOLD_ROWS,
            worksheet_title: DEFAULT_WORKSHEET_TITLE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            failure_report: FailureReport::default(),
        }
    }
}

impl UploadConfig {
    /// Parses a JSON configuration document and validates it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the JSON is malformed or a value
    /// is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let config: UploadConfig = serde_json::from_str(json)
            .map_err(|e| AppError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the API base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the flush threshold in rows.
    pub fn flush_threshold_rows(mut self, rows: usize) -> Self {
        self.flush_threshold_rows = rows;
        self
    }

    /// Sets the worksheet title.
    pub fn worksheet_title(mut self, title: impl Into<String>) -> Self {
        self.worksheet_title = title.into();
        self
    }

    /// Sets the per-cell failure inspection policy.
    pub fn failure_report(mut self, report: FailureReport) -> Self {
        self.failure_report = report;
        self
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.flush_threshold_rows == 0 {
            return Err(AppError::InvalidConfig(
                "flush_threshold_rows must be greater than 0".to_string(),
            ));
        }
        if self.worksheet_title.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "worksheet_title must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.api_base_url()?;
        Ok(())
    }

    /// Returns the flush threshold as a non-zero count.
    pub fn flush_threshold(&self) -> Result<NonZeroUsize, AppError> {
        NonZeroUsize::new(self.flush_threshold_rows).ok_or_else(|| {
            AppError::InvalidConfig("flush_threshold_rows must be greater than 0".to_string())
        })
    }

    /// Parses the API base. A trailing slash is added so relative joins keep
    /// the last path segment.
    pub fn api_base_url(&self) -> Result<Url, AppError> {
        let mut base = self.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .map_err(|e| AppError::InvalidConfig(format!("Invalid api_base: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
