//! Grid service data model and transport capability.
//!
//! The grid service exposes documents → worksheets → addressable cells. This
//! module holds flat records for those entities plus the narrow
//! `GridServiceOps` trait the upload pipeline talks to. `client` provides the
//! HTTP implementation.

pub mod client;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use client::{sanitize_url_for_logs, GridClient, GridCredentials, LoggingMode};

/// Boxed future returned by the capability traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// A grid document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDocument {
    pub id: String,
    pub title: String,
    /// Public link to the document, returned to the caller.
    pub url: String,
    /// Feed that new worksheets are posted to.
    pub worksheets_url: String,
}

/// A worksheet of fixed size belonging to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub row_count: usize,
    pub col_count: usize,
    /// Cell listing feed for this worksheet.
    pub cells_url: String,
}

impl Worksheet {
    pub fn dimensions(&self) -> (usize, usize) {
        (self.row_count, self.col_count)
    }
}

/// Result of document creation.
#[derive(Debug, Clone)]
pub struct CreatedDocument {
    pub document: GridDocument,
    /// Worksheet the service created alongside the document, if any.
    pub default_worksheet: Option<Worksheet>,
}

/// Remote handle for one cell position.
///
/// `row` and `col` are 1-based, exactly as the service reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellIdentity {
    pub id: String,
    pub row: usize,
    pub col: usize,
    pub edit_url: String,
}

/// Cell listing of a worksheet plus the feed's batch link.
#[derive(Debug, Clone, Default)]
pub struct CellFeed {
    pub entries: Vec<CellIdentity>,
    pub batch_link: Option<String>,
}

/// A pending update of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub cell: CellIdentity,
    pub value: String,
    pub link: Option<String>,
    /// Correlation id, `R{row}C{col}` in 1-based coordinates.
    pub batch_id: String,
}

impl Mutation {
    /// Builds the correlation id for a 0-based position.
    pub fn batch_id_for(row: usize, col: usize) -> String {
        format!("R{}C{}", row + 1, col + 1)
    }
}

/// Outcome of one submitted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellStatus {
    Success,
    Failure {
        code: u16,
        reason: String,
        content: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOutcome {
    pub batch_id: String,
    pub status: CellStatus,
}

impl CellOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, CellStatus::Success)
    }
}

/// Per-mutation results of one batch submission, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub results: Vec<CellOutcome>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Operations the upload pipeline needs from the grid service.
pub trait GridServiceOps: Send + Sync {
    /// Creates a new document with the given title.
    fn create_document<'a>(&'a self, title: &'a str)
        -> BoxFuture<'a, Result<CreatedDocument, AppError>>;

    /// Creates a worksheet of an explicit size on `document`.
    fn create_worksheet<'a>(
        &'a self,
        document: &'a GridDocument,
        title: &'a str,
        rows: usize,
        cols: usize,
    ) -> BoxFuture<'a, Result<Worksheet, AppError>>;

    /// Deletes a worksheet.
    fn delete_worksheet<'a>(&'a self, worksheet: &'a Worksheet)
        -> BoxFuture<'a, Result<(), AppError>>;

    /// Lists the worksheet's cells. `return_empty` asks the service to include
    /// blank cells, which are omitted otherwise.
    fn fetch_cells<'a>(
        &'a self,
        worksheet: &'a Worksheet,
        return_empty: bool,
    ) -> BoxFuture<'a, Result<CellFeed, AppError>>;

    /// Submits mutations to a batch link and returns per-mutation outcomes.
    fn submit_batch<'a>(
        &'a self,
        batch_link: &'a str,
        mutations: &'a [Mutation],
    ) -> BoxFuture<'a, Result<BatchOutcome, AppError>>;
}
