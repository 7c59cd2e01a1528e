//! CSV file export source.
//!
//! Uses the `csv` crate so quoted fields with embedded commas and newlines
//! stay intact. Records are read on a blocking thread and handed to the async
//! side through a bounded channel, one row at a time.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::export::{CellData, ExportSource, Extents, Row, RowSink};
use crate::grid::BoxFuture;

/// Rows buffered between the reader thread and the sink.
const ROW_CHANNEL_CAPACITY: usize = 64;

/// Streams a CSV file. Empty fields become empty cells.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    has_headers: bool,
}

impl CsvSource {
    /// Creates a source whose first record is a header row.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            has_headers: true,
        }
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::ExportFailed(format!("Failed to open CSV file: {}", e)))?;
    // Headers are read as ordinary records so they flow through the sink too.
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file)))
}

fn record_to_row(record: &StringRecord) -> Row {
    record
        .iter()
        .map(|field| (!field.is_empty()).then(|| CellData::text(field)))
        .collect()
}

/// Blocking pre-pass that counts records and the widest record.
fn count_extents_blocking(path: &Path) -> Result<Extents, AppError> {
    let mut reader = open_reader(path)?;
    let mut extents = Extents { rows: 0, cols: 0 };
    let mut record = StringRecord::new();

    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|e| AppError::ExportFailed(format!("Failed to read CSV record: {}", e)))?;
        if !more {
            break;
        }
        extents.rows += 1;
        extents.cols = extents.cols.max(record.len());
    }

    Ok(extents)
}

/// Blocking reader loop. Stops early when the receiving side is gone.
fn read_rows_blocking(
    path: &Path,
    has_headers: bool,
    tx: mpsc::Sender<Result<(Row, bool), AppError>>,
) {
    let mut reader = match open_reader(path) {
        Ok(reader) => reader,
        Err(e) => {
            let _ = tx.blocking_send(Err(e));
            return;
        }
    };

    for (index, result) in reader.records().enumerate() {
        let item = result
            .map(|record| (record_to_row(&record), has_headers && index == 0))
            .map_err(|e| AppError::ExportFailed(format!("Failed to read CSV record: {}", e)));
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() || failed {
            return;
        }
    }
}

impl ExportSource for CsvSource {
    fn extents(&self) -> BoxFuture<'_, Result<Extents, AppError>> {
        let path = self.path.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || count_extents_blocking(&path))
                .await
                .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        })
    }

    fn export_rows<'a>(&'a self, sink: &'a mut dyn RowSink) -> BoxFuture<'a, Result<(), AppError>> {
        let path = self.path.clone();
        let has_headers = self.has_headers;
        Box::pin(async move {
            let (tx, mut rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);
            let reader = tokio::task::spawn_blocking(move || read_rows_blocking(&path, has_headers, tx));

            sink.start_file().await?;
            while let Some(item) = rx.recv().await {
                let (row, is_header) = item?;
                sink.add_row(row, is_header).await?;
            }
            reader
                .await
                .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;
            sink.end_file().await
        })
    }
}
