#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![forbid(unsafe_code)]

//! # kdtree_nn: a static KD-tree with bounded nearest-neighbor search
//!
//! `kdtree_nn` indexes the rows of a numeric table in a KD-tree and answers
//! nearest-neighbor queries against it. It features:
//! - Median-by-position splits on an axis chosen from per-axis statistics
//!   (standard deviation, skewness or kurtosis)
//! - A hyperplane-bounded search that trades exactness for a single threshold
//! - A line-oriented pre-order model format for persisting built trees
//! - Iterative build and traversal, so unbalanced trees cannot overflow the stack
//!
//! The quickest way in is [`KdTreeIndex`], which owns a table and its tree.

pub mod core;

// Re-export key types for easier use by library consumers
pub use crate::core::common::KdError;
pub use crate::core::config::{Config, ConfigBuilder};
pub use crate::core::indexing::kdtree::{
    KdNode, KdTree, KdTreeError, KdTreeIndex, ModelFraming, Neighbor, NodeId, SplitRule,
};
pub use crate::core::table::{CsvTable, DataTable};

/// Core result type for the library
pub type Result<T> = std::result::Result<T, KdError>;
