//! Accumulation of cell mutations into batch units.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::grid::Mutation;

/// Mutations collected for one submission, in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUnit {
    pub mutations: Vec<Mutation>,
    /// 0-based rows whose mutations this unit holds.
    pub rows: Range<usize>,
}

impl BatchUnit {
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Collects mutations until the row threshold is reached.
#[derive(Debug)]
pub struct BatchAccumulator {
    threshold: NonZeroUsize,
    current: Option<BatchUnit>,
    rows_since_flush: usize,
    next_row: usize,
}

impl BatchAccumulator {
    pub fn new(threshold: NonZeroUsize) -> Self {
        Self {
            threshold,
            current: None,
            rows_since_flush: 0,
            next_row: 0,
        }
    }

    /// Appends a mutation, opening a unit if none is open.
    pub fn add(&mut self, mutation: Mutation) {
        self.open().mutations.push(mutation);
    }

    /// Marks the current row as processed.
    pub fn finish_row(&mut self) {
        self.open();
        self.next_row += 1;
        self.rows_since_flush += 1;
        if let Some(unit) = self.current.as_mut() {
            unit.rows.end = self.next_row;
        }
    }

    pub fn should_flush(&self) -> bool {
        self.rows_since_flush >= self.threshold.get()
    }

    /// True when the open unit holds no mutations (or none is open).
    pub fn is_empty(&self) -> bool {
        self.current.as_ref().map_or(true, BatchUnit::is_empty)
    }

    pub fn rows_since_flush(&self) -> usize {
        self.rows_since_flush
    }

    /// Returns the open unit, possibly empty, and starts over.
    pub fn take_and_reset(&mut self) -> BatchUnit {
        self.rows_since_flush = 0;
        self.current.take().unwrap_or(BatchUnit {
            mutations: Vec::new(),
            rows: self.next_row..self.next_row,
        })
    }

    fn open(&mut self) -> &mut BatchUnit {
        let start = self.next_row;
        self.current.get_or_insert_with(|| BatchUnit {
            mutations: Vec::new(),
            rows: start..start,
        })
    }
}
