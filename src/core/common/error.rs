use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::indexing::kdtree::KdTreeError;

/// Crate-level error covering table loading, configuration and file handling.
///
/// Errors raised by the index itself are wrapped in [`KdError::Tree`] so callers
/// can still match on the precise [`KdTreeError`].
#[derive(Debug, Error)]
pub enum KdError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// A path could not be opened, created or read.
    #[error("Cannot access '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parsing Error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Ragged row at line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Table contains no rows")]
    EmptyTable,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Tree(#[from] KdTreeError),
}

impl KdError {
    /// Wraps an I/O failure with the path that caused it.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
