use serde::Serialize;
use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for UI display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "bearer ",
    "access_token",
    "authorization:",
    "token=",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for UI display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// User-friendly error presentation for the caller's reply.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Auth ──────────────────────────────────────────────────────────────────
    #[error("Not authenticated")]
    NotAuthenticated,

    // ── Grid API ──────────────────────────────────────────────────────────────
    #[error("Grid service error: {0}")]
    GridServiceError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    // ── Upload ────────────────────────────────────────────────────────────────
    #[error("Cell index incomplete: expected {expected} cells, found {found}")]
    IndexIncomplete { expected: usize, found: usize },

    #[error("Cell R{row}C{col} is outside the {rows}x{cols} worksheet")]
    CellOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Worksheet size mismatch: requested {requested:?}, created {created:?}")]
    WorksheetSizeMismatch {
        requested: (usize, usize),
        created: (usize, usize),
    },

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Export ────────────────────────────────────────────────────────────────
    #[error("Export failed: {0}")]
    ExportFailed(String),

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a user-friendly presentation suitable for a reply.
    /// Never leaks tokens or sensitive URL parameters.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            AppError::NotAuthenticated => ErrorPresentation {
                title: "Not Authorized".into(),
                message: "A valid grid service token is required to upload.".into(),
                action: Some("Log in and try again".into()),
            },

            AppError::GridServiceError(msg) => ErrorPresentation {
                title: "Grid Service Error".into(),
                message: sanitize_message(msg, "The grid service reported an error."),
                action: None,
            },

            AppError::NotFound(msg) => ErrorPresentation {
                title: "Not Found".into(),
                message: sanitize_message(msg, "The requested resource was not found."),
                action: None,
            },

            AppError::RateLimited { retry_after_secs } => {
                let wait_msg = match retry_after_secs {
                    Some(secs) => format!("Please wait {} seconds before trying again.", secs),
                    None => "Please wait a moment before trying again.".into(),
                };
                ErrorPresentation {
                    title: "Too Many Requests".into(),
                    message: format!("The grid service is limiting requests. {}", wait_msg),
                    action: Some("Wait and retry".into()),
                }
            }

            AppError::IndexIncomplete { expected, found } => ErrorPresentation {
                title: "Upload Failed".into(),
                message: format!(
                    "The new worksheet reported {} of {} cells.",
                    found, expected
                ),
                action: Some("Try the upload again".into()),
            },

            AppError::CellOutOfRange { .. } => ErrorPresentation {
                title: "Upload Failed".into(),
                message: "The export produced more data than the worksheet was sized for.".into(),
                action: Some("Try the upload again".into()),
            },

            AppError::WorksheetSizeMismatch { .. } => ErrorPresentation {
                title: "Upload Failed".into(),
                message: "The worksheet was not created with the requested size.".into(),
                action: Some("Try the upload again".into()),
            },

            AppError::EmptyDataset => ErrorPresentation {
                title: "Nothing to Upload".into(),
                message: "The selected rows and columns contain no data.".into(),
                action: Some("Change the row filter or column selection".into()),
            },

            AppError::InvalidConfig(msg) => ErrorPresentation {
                title: "Invalid Configuration".into(),
                message: sanitize_message(msg, "The upload configuration is invalid."),
                action: Some("Fix the configuration and try again".into()),
            },

            AppError::ExportFailed(msg) => ErrorPresentation {
                title: "Export Failed".into(),
                message: sanitize_message(msg, "The rows could not be exported."),
                action: None,
            },

            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not connect to the grid service. Please check your internet connection.".into(),
                action: Some("Check network and retry".into()),
            },

            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}
