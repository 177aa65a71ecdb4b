mod test_search;

use crate::core::indexing::kdtree::{KdTree, NodeId};
use crate::core::table::CsvTable;

// Helper to create a table easily
pub(super) fn table(rows: &[&[f64]]) -> CsvTable {
    CsvTable::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

/// The five-point line used throughout: rows 0..=4 with value == row.
pub(super) fn line_table() -> CsvTable {
    table(&[&[0.0], &[1.0], &[2.0], &[3.0], &[4.0]])
}

/// Representatives of every node in the subtree rooted at `id`.
pub(super) fn subtree_rows(tree: &KdTree, id: NodeId) -> Vec<usize> {
    let mut rows = Vec::new();
    let mut stack = vec![id];
    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        rows.push(node.representative);
        stack.extend(node.left);
        stack.extend(node.right);
    }
    rows
}

/// Uniform random rows in `[0, scale)`.
pub(super) fn random_table(seed: u64, rows: usize, dim: usize, scale: f64) -> CsvTable {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..rows)
        .map(|_| (0..dim).map(|_| rng.gen::<f64>() * scale).collect())
        .collect();
    CsvTable::from_rows(rows).unwrap()
}
