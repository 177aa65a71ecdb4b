// src/core/indexing/kdtree/error.rs

use std::io;

use thiserror::Error;

/// Custom error types for KD-Tree operations.
#[derive(Debug, Error)]
pub enum KdTreeError {
    /// Error when trying to build a tree from empty input.
    #[error("KD-Tree Empty Input: {0}")]
    EmptyInput(String),

    /// Error when vector dimensions are inconsistent.
    #[error("KD-Tree Dimension Mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Error when a split axis is out of bounds for the table dimension.
    #[error("KD-Tree Axis Out Of Bounds: axis {axis} for dimension {dimension}")]
    AxisOutOfBounds { axis: usize, dimension: usize },

    /// Error when a row index does not exist in the backing table.
    #[error("KD-Tree Index Out Of Bounds: row {index} for a table of {size} rows")]
    IndexOutOfBounds { index: usize, size: usize },

    /// The same row index appears twice where every row must be unique.
    #[error("KD-Tree Duplicate Index: row {0} appears more than once")]
    DuplicateIndex(usize),

    #[error("KD-Tree Invalid Bound: {0} (must be >= 0 and not NaN)")]
    InvalidBound(f64),

    #[error("KD-Tree Non-Finite Query: coordinate {axis} is {value}")]
    NonFiniteQuery { axis: usize, value: f64 },

    /// A model record could not be parsed or violates the format.
    #[error("KD-Tree Malformed Model at line {line}: {reason}")]
    MalformedModel { line: usize, reason: String },

    /// The model ended before every announced child was read.
    #[error("KD-Tree Truncated Model: {missing} node(s) missing")]
    TruncatedModel { missing: usize },

    /// Records remain after the tree described by the model is complete.
    #[error("KD-Tree Trailing Records: unexpected record at line {line}")]
    TrailingRecords { line: usize },

    #[error("KD-Tree Node Count Mismatch: header declares {declared}, model holds {actual}")]
    NodeCountMismatch { declared: usize, actual: usize },

    #[error("KD-Tree IO Error: {0}")]
    Io(#[from] io::Error),
}

impl KdTreeError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedModel {
            line,
            reason: reason.into(),
        }
    }
}
