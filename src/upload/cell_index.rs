//! Dense row-major lookup of a worksheet's remote cell identities.

use tracing::{info, warn};

use crate::error::AppError;
use crate::grid::{CellFeed, CellIdentity, GridServiceOps, Worksheet};

/// Every cell identity of one worksheet, indexed by 0-based position.
///
/// Built once before streaming starts and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CellIndex {
    cells: Vec<CellIdentity>,
    rows: usize,
    cols: usize,
    batch_link: String,
}

impl CellIndex {
    /// Fetches the full cell listing of `worksheet`, empty cells included, and
    /// indexes it.
    ///
    /// # Errors
    ///
    /// - `AppError::IndexIncomplete` - the listing does not cover the grid
    /// - `AppError::GridServiceError` - the feed has no batch link
    /// - any error of the fetch itself
    pub async fn build(
        service: &dyn GridServiceOps,
        worksheet: &Worksheet,
    ) -> Result<Self, AppError> {
        let feed = service.fetch_cells(worksheet, true).await?;
        let index = Self::from_feed(feed, worksheet.row_count, worksheet.col_count)?;
        info!(
            "[CELL-INDEX] Indexed {} cells ({}x{})",
            index.len(),
            index.rows,
            index.cols
        );
        Ok(index)
    }

    /// Indexes an already fetched feed for a `rows × cols` worksheet.
    pub fn from_feed(feed: CellFeed, rows: usize, cols: usize) -> Result<Self, AppError> {
        let expected = rows * cols;
        let found = feed.entries.len();
        let mut slots: Vec<Option<CellIdentity>> = vec![None; expected];

        for cell in feed.entries {
            // The wire is 1-based.
            if cell.row == 0 || cell.col == 0 || cell.row > rows || cell.col > cols {
                warn!(
                    "[CELL-INDEX] Cell R{}C{} is outside the {}x{} worksheet",
                    cell.row, cell.col, rows, cols
                );
                return Err(AppError::IndexIncomplete { expected, found });
            }
            let slot = &mut slots[(cell.row - 1) * cols + (cell.col - 1)];
            if slot.is_some() {
                warn!("[CELL-INDEX] Cell R{}C{} listed twice", cell.row, cell.col);
                return Err(AppError::IndexIncomplete { expected, found });
            }
            *slot = Some(cell);
        }

        let cells: Vec<CellIdentity> = slots.into_iter().flatten().collect();
        if cells.len() != expected {
            return Err(AppError::IndexIncomplete {
                expected,
                found: cells.len(),
            });
        }

        let batch_link = feed.batch_link.ok_or_else(|| {
            AppError::GridServiceError("Cell feed has no batch link".to_string())
        })?;

        Ok(Self {
            cells,
            rows,
            cols,
            batch_link,
        })
    }

    /// Returns the identity at a 0-based position, `None` only out of bounds.
    pub fn lookup(&self, row: usize, col: usize) -> Option<&CellIdentity> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Batch endpoint of the worksheet's cell feed.
    pub fn batch_link(&self) -> &str {
        &self.batch_link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::fake::{cell, full_listing, worksheet, FakeGridService, FAKE_BATCH_LINK};

    fn feed(entries: Vec<CellIdentity>) -> CellFeed {
        CellFeed {
            entries,
            batch_link: Some(FAKE_BATCH_LINK.to_string()),
        }
    }

    #[test]
    fn every_in_bounds_position_resolves() {
        for (rows, cols) in [(1, 1), (3, 2), (2, 5), (25, 3)] {
            let index = CellIndex::from_feed(feed(full_listing(rows, cols)), rows, cols).unwrap();
            assert_eq!(index.len(), rows * cols);
            for r in 0..rows {
                for c in 0..cols {
                    let identity = index.lookup(r, c).expect("in-bounds lookup");
                    assert_eq!((identity.row, identity.col), (r + 1, c + 1));
                }
            }
        }
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let index = CellIndex::from_feed(feed(full_listing(2, 2)), 2, 2).unwrap();
        assert!(index.lookup(2, 0).is_none());
        assert!(index.lookup(0, 2).is_none());
    }

    #[test]
    fn partial_listing_is_rejected() {
        let mut entries = full_listing(2, 2);
        entries.pop();

        let result = CellIndex::from_feed(feed(entries), 2, 2);

        assert!(matches!(
            result,
            Err(AppError::IndexIncomplete { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn duplicate_or_stray_cells_are_rejected() {
        let mut duplicated = full_listing(1, 2);
        duplicated[1] = cell(1, 1);
        assert!(CellIndex::from_feed(feed(duplicated), 1, 2).is_err());

        let mut stray = full_listing(1, 2);
        stray.push(cell(2, 1));
        assert!(CellIndex::from_feed(feed(stray), 1, 2).is_err());

        let zero_based = vec![cell(0, 1)];
        assert!(CellIndex::from_feed(feed(zero_based), 1, 1).is_err());
    }

    #[test]
    fn missing_batch_link_is_rejected() {
        let entries = CellFeed {
            entries: full_listing(1, 1),
            batch_link: None,
        };
        assert!(matches!(
            CellIndex::from_feed(entries, 1, 1),
            Err(AppError::GridServiceError(_))
        ));
    }

    #[tokio::test]
    async fn build_requests_empty_cells() {
        let service = FakeGridService::new();

        let index = CellIndex::build(&service, &worksheet(3, 2)).await.unwrap();

        assert_eq!(index.len(), 6);
        assert_eq!(index.batch_link(), FAKE_BATCH_LINK);
        assert_eq!(service.calls(), vec!["fetch_cells:return_empty=true"]);
    }
}
