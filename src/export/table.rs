use crate::error::AppError;
use crate::export::{CellData, ExportSource, Extents, Row, RowSink};
use crate::grid::BoxFuture;

/// In-memory dataset with an optional header row.
#[derive(Debug, Clone, Default)]
pub struct TableSource {
    header: Option<Vec<String>>,
    rows: Vec<Row>,
}

impl TableSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { header: None, rows }
    }

    /// Adds a header row that is exported ahead of the data rows.
    pub fn with_header<S: Into<String>>(mut self, header: impl IntoIterator<Item = S>) -> Self {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    /// Builds a table of plain text cells. Empty strings become empty cells.
    pub fn from_text_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|s| {
                        let s = s.as_ref();
                        (!s.is_empty()).then(|| CellData::text(s))
                    })
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    fn header_row(&self) -> Option<Row> {
        self.header
            .as_ref()
            .map(|names| names.iter().map(|n| Some(CellData::text(n.as_str()))).collect())
    }
}

impl ExportSource for TableSource {
    fn extents(&self) -> BoxFuture<'_, Result<Extents, AppError>> {
        Box::pin(async move {
            let header_cols = self.header.as_ref().map_or(0, Vec::len);
            let cols = self
                .rows
                .iter()
                .map(Vec::len)
                .chain(std::iter::once(header_cols))
                .max()
                .unwrap_or(0);
            let rows = self.rows.len() + usize::from(self.header.is_some());
            Ok(Extents { rows, cols })
        })
    }

    fn export_rows<'a>(&'a self, sink: &'a mut dyn RowSink) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            sink.start_file().await?;
            if let Some(header) = self.header_row() {
                sink.add_row(header, true).await?;
            }
            for row in &self.rows {
                sink.add_row(row.clone(), false).await?;
            }
            sink.end_file().await
        })
    }
}
