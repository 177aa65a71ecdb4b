// src/core/indexing/kdtree/mod.rs

//! KD-Tree implementation for nearest-neighbor indexing of table rows.

// Re-export key components for easier use.
pub use self::builder::{
    build_kdtree, build_kdtree_from_indices, median_by_position, split_indices, Split,
};
pub use self::codec::{
    decode_records, encode_records, read_model, read_records, write_model, DecodeLimits,
    ModelFraming, ModelRecord, ModelStream,
};
pub use self::error::KdTreeError;
pub use self::search::{brute_force_nearest, euclidean_distance, find_nearest, Neighbor};
pub use self::stats::{axis_stats, select_split_axis, AxisStats, SplitRule};
pub use self::tree::{KdNode, KdTree, NodeId, Preorder, TreeSummary, DEFAULT_BOUND};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::core::common::KdError;
use crate::core::config::Config;
use crate::core::query;
use crate::core::table::{CsvTable, DataTable};

// Modules within the kdtree crate
mod builder;
mod codec;
mod error;
mod search;
mod stats;
mod tree;

#[cfg(test)]
mod tests;

/// `KdTreeIndex`: a table together with the KD-Tree built over its rows.
///
/// The tree only stores row indices, so the index keeps the table alongside it
/// and every search resolves coordinates through it. Build it from scratch with
/// [`KdTreeIndex::build`] or reload a persisted model with [`KdTreeIndex::open`].
#[derive(Debug, Clone)]
pub struct KdTreeIndex<T: DataTable = CsvTable> {
    table: T,
    tree: KdTree,
    framing: ModelFraming,
    parallel_queries: bool,
}

impl<T: DataTable> KdTreeIndex<T> {
    /// Builds a new index over every row of `table`.
    ///
    /// # Arguments
    /// * `table` - The points to index.
    /// * `config` - Supplies the split rule, search bound and model framing.
    pub fn build(table: T, config: &Config) -> Result<Self, KdError> {
        config.validate()?;
        if table.is_empty() {
            return Err(KdError::EmptyTable);
        }
        let tree = build_kdtree(&table, config.split_rule, config.bound)?;
        info!(
            "Built KD-Tree over {} rows ({} dims): height {}",
            table.size(),
            table.dim(),
            tree.height()
        );
        Ok(Self::with_config(table, tree, config))
    }

    /// Reloads a persisted model and checks it against `table`.
    ///
    /// # Errors
    ///
    /// Returns [`KdError::File`] when the model cannot be opened and
    /// [`KdError::Tree`] when it is malformed or does not fit the table.
    pub fn open(
        table: T,
        model_path: impl AsRef<Path>,
        config: &Config,
    ) -> Result<Self, KdError> {
        let path = model_path.as_ref();
        let file = File::open(path).map_err(|e| KdError::file(path, e))?;
        let index = Self::read(table, file, config).map_err(|e| with_path(e, path))?;
        info!(
            "Loaded KD-Tree model from {}: {} nodes",
            path.display(),
            index.tree.len()
        );
        Ok(index)
    }

    /// Reads a model from any byte source. See [`KdTreeIndex::open`].
    pub fn read<R: Read>(table: T, reader: R, config: &Config) -> Result<Self, KdError> {
        config.validate()?;
        let tree = read_model(BufReader::new(reader), DecodeLimits::for_table(&table))?
            .with_bound(config.bound)?;
        Ok(Self::with_config(table, tree, config))
    }

    fn with_config(table: T, tree: KdTree, config: &Config) -> Self {
        Self {
            table,
            tree,
            framing: config.model_framing(),
            parallel_queries: config.parallel_queries,
        }
    }

    /// Saves the tree as a model file, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), KdError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| KdError::file(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| with_path(e, path))?;
        info!("Saved KD-Tree model to {}", path.display());
        Ok(())
    }

    /// Writes the tree as a model using the configured framing.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), KdError> {
        write_model(&self.tree, writer, self.framing)?;
        Ok(())
    }

    /// Finds the nearest row to `query` under the tree's bound.
    pub fn search(&self, query: &[f64]) -> Result<Neighbor, KdError> {
        Ok(find_nearest(&self.tree, &self.table, query)?)
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn set_bound(&mut self, bound: f64) -> Result<(), KdError> {
        self.tree.set_bound(bound)?;
        Ok(())
    }

    /// Indented dump of the tree with coordinates.
    pub fn render(&self) -> Result<String, KdError> {
        Ok(self.tree.render(&self.table)?)
    }

    pub fn into_parts(self) -> (T, KdTree) {
        (self.table, self.tree)
    }
}

impl<T: DataTable + Sync> KdTreeIndex<T> {
    /// Searches every row of `queries`, returning results in row order.
    pub fn search_all<Q: DataTable + Sync>(&self, queries: &Q) -> Result<Vec<Neighbor>, KdError> {
        Ok(query::run_queries(
            &self.tree,
            &self.table,
            queries,
            self.parallel_queries,
        )?)
    }
}

/// Attaches `path` to bare I/O failures raised while reading or writing a model.
fn with_path(err: KdError, path: &Path) -> KdError {
    match err {
        KdError::Io(source) | KdError::Tree(KdTreeError::Io(source)) => {
            KdError::file(path, source)
        }
        other => other,
    }
}
