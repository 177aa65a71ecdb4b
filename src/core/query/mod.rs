//! Batch querying: run every row of a query table through the search and
//! write the `nearest_index,distance` result table.

use std::io::Write;

use log::{debug, info};
use rayon::prelude::*;

use crate::core::indexing::kdtree::{find_nearest, KdTree, KdTreeError, Neighbor};
use crate::core::table::DataTable;

/// Searches every row of `queries` against `tree` / `train`.
///
/// The tree is never mutated by a search, so queries can safely run on the
/// rayon pool when `parallel` is set. Results are always in query row order.
pub fn run_queries<T, Q>(
    tree: &KdTree,
    train: &T,
    queries: &Q,
    parallel: bool,
) -> Result<Vec<Neighbor>, KdTreeError>
where
    T: DataTable + Sync + ?Sized,
    Q: DataTable + Sync + ?Sized,
{
    if queries.dim() != train.dim() {
        return Err(KdTreeError::DimensionMismatch {
            expected: train.dim(),
            found: queries.dim(),
        });
    }

    let search = |row: usize| -> Result<Neighbor, KdTreeError> {
        let hit = find_nearest(tree, train, queries.row(row))?;
        debug!("Query {} closest to row {} at {}", row, hit.index, hit.distance);
        Ok(hit)
    };
    let results: Result<Vec<Neighbor>, KdTreeError> = if parallel {
        (0..queries.size()).into_par_iter().map(search).collect()
    } else {
        (0..queries.size()).map(search).collect()
    };
    if let Ok(hits) = &results {
        info!("Answered {} queries (bound {})", hits.len(), tree.bound());
    }
    results
}

/// Writes one `index,distance` line per result, no header.
pub fn write_results<W: Write>(results: &[Neighbor], mut writer: W) -> std::io::Result<()> {
    for hit in results {
        writeln!(writer, "{},{}", hit.index, hit.distance)?;
    }
    writer.flush()
}
