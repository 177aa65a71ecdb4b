// src/core/indexing/kdtree/builder.rs

//! Logic for building a KD-Tree from the rows of a table.

use std::collections::HashSet;

use log::{debug, trace};

use super::error::KdTreeError;
use super::stats::{select_split_axis, SplitRule};
use super::tree::{validate_bound, KdNode, KdTree, NodeId};
use crate::core::table::DataTable;

/// Which child slot of a parent a pending node fills.
#[derive(Debug, Clone, Copy)]
pub(super) enum Side {
    Left,
    Right,
}

/// A subset still waiting to become a node.
struct PendingNode {
    indices: Vec<usize>,
    depth: usize,
    parent: Option<(NodeId, Side)>,
}

/// Builds a KD-Tree over every row of `table`.
///
/// # Errors
/// Fails on an empty or zero-dimension table and on an invalid `bound`.
pub fn build_kdtree<T: DataTable + ?Sized>(
    table: &T,
    rule: SplitRule,
    bound: f64,
) -> Result<KdTree, KdTreeError> {
    build_kdtree_from_indices(table, (0..table.size()).collect(), rule, bound)
}

/// Builds a KD-Tree over the rows listed in `indices`.
///
/// Every index must be a distinct row of `table`. Nodes are produced in
/// pre-order with an explicit work stack, so duplicate-heavy data that
/// degenerates into a tall tree costs heap, not native stack.
///
/// # Arguments
/// * `table`: Source of coordinates; the tree stores row indices into it.
/// * `indices`: The rows to index, in the order ties are resolved.
/// * `rule`: How each node chooses its split axis.
/// * `bound`: Hyperplane bound stored on the tree for later searches.
pub fn build_kdtree_from_indices<T: DataTable + ?Sized>(
    table: &T,
    indices: Vec<usize>,
    rule: SplitRule,
    bound: f64,
) -> Result<KdTree, KdTreeError> {
    let bound = validate_bound(bound)?;
    if indices.is_empty() {
        return Err(KdTreeError::EmptyInput(
            "cannot build a tree from an empty index set".to_string(),
        ));
    }
    let dimension = table.dim();
    if dimension == 0 {
        return Err(KdTreeError::DimensionMismatch {
            expected: 1,
            found: 0,
        });
    }
    let mut seen = HashSet::with_capacity(indices.len());
    for &index in &indices {
        if index >= table.size() {
            return Err(KdTreeError::IndexOutOfBounds {
                index,
                size: table.size(),
            });
        }
        if !seen.insert(index) {
            return Err(KdTreeError::DuplicateIndex(index));
        }
    }

    let mut nodes: Vec<KdNode> = Vec::with_capacity(indices.len());
    let mut stack = vec![PendingNode {
        indices,
        depth: 1,
        parent: None,
    }];

    while let Some(pending) = stack.pop() {
        let id = nodes.len();
        if let Some((parent, side)) = pending.parent {
            attach(&mut nodes, parent, side, id);
        }

        if let &[only] = pending.indices.as_slice() {
            trace!("depth {}: leaf {}", pending.depth, only);
            nodes.push(KdNode::leaf(only, pending.depth));
            continue;
        }

        let split = split_indices(table, &pending.indices, rule)?;
        trace!(
            "depth {}: node {} on axis {} (median {}), {} left / {} right",
            pending.depth,
            split.representative,
            split.axis,
            split.median,
            split.left.len(),
            split.right.len()
        );
        nodes.push(KdNode::split(
            split.representative,
            split.axis,
            pending.depth,
        ));

        // Right is pushed first so the left subtree is emitted first.
        let depth = pending.depth + 1;
        if !split.right.is_empty() {
            stack.push(PendingNode {
                indices: split.right,
                depth,
                parent: Some((id, Side::Right)),
            });
        }
        if !split.left.is_empty() {
            stack.push(PendingNode {
                indices: split.left,
                depth,
                parent: Some((id, Side::Left)),
            });
        }
    }

    let tree = KdTree::from_nodes(nodes, bound, dimension);
    debug!(
        "Built KD-Tree: {} nodes, height {}, rule {:?}",
        tree.len(),
        tree.height(),
        rule
    );
    Ok(tree)
}

pub(super) fn attach(nodes: &mut [KdNode], parent: NodeId, side: Side, child: NodeId) {
    let parent = &mut nodes[parent];
    match side {
        Side::Left => parent.left = Some(child),
        Side::Right => parent.right = Some(child),
    }
}

/// Outcome of splitting one subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub axis: usize,
    pub median: f64,
    pub representative: usize,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

/// Splits a subset of at least two rows around its positional median.
///
/// The representative is the first row (in `indices` order) holding the
/// median value. Every other row with a value `<=` the median goes left, the
/// rest go right, both in their original order. Rows equal to the median
/// always land left, which can unbalance trees built over repeated values.
pub fn split_indices<T: DataTable + ?Sized>(
    table: &T,
    indices: &[usize],
    rule: SplitRule,
) -> Result<Split, KdTreeError> {
    let axis = select_split_axis(table, indices, rule);
    let values = table.column(indices, axis);
    let median = median_by_position(&values)
        .ok_or_else(|| KdTreeError::EmptyInput("cannot split an empty index set".to_string()))?;
    // The median is one of `values`, so a position always exists.
    let representative_pos = values
        .iter()
        .position(|&v| v == median)
        .ok_or_else(|| KdTreeError::EmptyInput("median value vanished".to_string()))?;

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (pos, (&index, &value)) in indices.iter().zip(&values).enumerate() {
        if pos == representative_pos {
            continue;
        }
        if value <= median {
            left.push(index);
        } else {
            right.push(index);
        }
    }

    Ok(Split {
        axis,
        median,
        representative: indices[representative_pos],
        left,
        right,
    })
}

/// The value at sorted position `n / 2` for even `n` and `(n - 1) / 2` for
/// odd `n`. No averaging of the two middle values.
pub fn median_by_position(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let pos = if n % 2 == 0 { n / 2 } else { (n - 1) / 2 };
    let mut scratch = values.to_vec();
    let (_, median, _) = scratch.select_nth_unstable_by(pos, f64::total_cmp);
    Some(*median)
}
