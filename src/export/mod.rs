//! Row-production contract between a tabular export and its consumer.
//!
//! An [`ExportSource`] sizes its dataset up front and then pushes rows, in
//! increasing order, into a [`RowSink`]: `start_file`, one `add_row` per row,
//! then `end_file`.

mod csv_source;
mod table;

use crate::error::AppError;
use crate::grid::BoxFuture;

pub use csv_source::CsvSource;
pub use table::TableSource;

/// One exported cell: display text plus an optional link target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    pub text: Option<String>,
    pub link: Option<String>,
}

impl CellData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            link: None,
        }
    }

    pub fn with_link(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            link: Some(link.into()),
        }
    }
}

/// An exported row. `None` and text-less cells are empty.
pub type Row = Vec<Option<CellData>>;

/// Row and column extents of an export, including any header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extents {
    pub rows: usize,
    pub cols: usize,
}

impl Extents {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Push-based row consumer driven by an export.
pub trait RowSink: Send {
    fn start_file(&mut self) -> BoxFuture<'_, Result<(), AppError>>;

    /// Receives the next row. Rows arrive in increasing order starting at 0.
    fn add_row(&mut self, cells: Row, is_header: bool) -> BoxFuture<'_, Result<(), AppError>>;

    fn end_file(&mut self) -> BoxFuture<'_, Result<(), AppError>>;
}

/// A dataset that can be sized and then streamed into a [`RowSink`].
pub trait ExportSource: Send + Sync {
    /// Counts the rows and columns `export_rows` will produce.
    fn extents(&self) -> BoxFuture<'_, Result<Extents, AppError>>;

    /// Streams every row into `sink`, followed by a single `end_file`.
    fn export_rows<'a>(&'a self, sink: &'a mut dyn RowSink) -> BoxFuture<'a, Result<(), AppError>>;
}

#[cfg(test)]
pub(crate) mod recording {
    //! Sink that keeps everything it receives.

    use super::*;

    #[derive(Default)]
    pub struct RecordingSink {
        pub started: bool,
        pub ended: bool,
        pub rows: Vec<(Row, bool)>,
    }

    impl RowSink for RecordingSink {
        fn start_file(&mut self) -> BoxFuture<'_, Result<(), AppError>> {
            Box::pin(async move {
                self.started = true;
                Ok(())
            })
        }

        fn add_row(&mut self, cells: Row, is_header: bool) -> BoxFuture<'_, Result<(), AppError>> {
            Box::pin(async move {
                self.rows.push((cells, is_header));
                Ok(())
            })
        }

        fn end_file(&mut self) -> BoxFuture<'_, Result<(), AppError>> {
            Box::pin(async move {
                self.ended = true;
                Ok(())
            })
        }
    }
}
