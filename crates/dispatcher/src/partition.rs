//! Batch Partitioner
//!
//! Splits an ordered record sequence into fixed-size contiguous batches.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use contracts::Record;

/// Contiguous, non-empty slice of one record sequence
///
/// Batches share the sequence; cloning a batch never copies records.
#[derive(Debug, Clone)]
pub struct Batch {
    index: usize,
    source: Arc<[Record]>,
    range: Range<usize>,
}

impl Batch {
    /// Position of this batch in emission order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Records of this batch, in source order
    pub fn records(&self) -> &[Record] {
        &self.source[self.range.clone()]
    }

    /// Source positions covered by this batch
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Always false for batches produced by [`partition`]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Partition `records` into `ceil(len / batch_size)` batches
///
/// Batch `i` covers `[i * batch_size, min((i + 1) * batch_size, len))`.
/// An empty sequence yields no batches.
pub fn partition(records: impl Into<Arc<[Record]>>, batch_size: NonZeroUsize) -> Vec<Batch> {
    let source: Arc<[Record]> = records.into();
    let total = source.len();
    let size = batch_size.get();

    (0..total)
        .step_by(size)
        .enumerate()
        .map(|(index, start)| Batch {
            index,
            source: Arc::clone(&source),
            range: start..total.min(start + size),
        })
        .collect()
}
