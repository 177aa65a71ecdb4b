// src/core/indexing/kdtree/search.rs

//! Bounded nearest-neighbor search in a KD-Tree.
//!
//! The search is approximate: a node explores both children only when the
//! query lies within the tree's fixed `bound` of the node's splitting
//! coordinate, otherwise it commits to the query's side. The bound does not
//! shrink with the best distance found so far. `bound = f64::INFINITY` visits
//! every node and is exact; `bound = 0.0` follows a single root-to-leaf path
//! below the root's two children.

use log::trace;

use super::error::KdTreeError;
use super::tree::{KdTree, NodeId};
use crate::core::table::DataTable;

/// Nearest point found for a query: its row index and Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// Finds the nearest row of `table` to `query` under the tree's bound.
///
/// # Arguments
/// * `tree`: The tree to traverse. Its bound controls pruning.
/// * `table`: The table the tree's row indices refer to.
/// * `query`: A point with `table.dim()` finite coordinates.
///
/// # Returns
/// The best `Neighbor` seen along the explored paths. On equal distances the
/// node visited first (left subtrees before right subtrees) is kept.
pub fn find_nearest<T: DataTable + ?Sized>(
    tree: &KdTree,
    table: &T,
    query: &[f64],
) -> Result<Neighbor, KdTreeError> {
    check_query(table, query)?;
    let bound = tree.bound();

    let root = tree.root();
    let mut best = Neighbor {
        index: root.representative,
        distance: euclidean_distance(query, point(table, root.representative)?),
    };

    // The root always explores both sides, whatever the bound.
    let mut stack: Vec<NodeId> = Vec::new();
    stack.extend(root.right);
    stack.extend(root.left);

    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        let node_point = point(table, node.representative)?;

        let distance = euclidean_distance(query, node_point);
        if distance < best.distance {
            trace!(
                "best updated: row {} at {} (was row {} at {})",
                node.representative,
                distance,
                best.index,
                best.distance
            );
            best = Neighbor {
                index: node.representative,
                distance,
            };
        }

        let Some(axis) = node.split_axis else {
            continue;
        };
        if axis >= table.dim() {
            return Err(KdTreeError::AxisOutOfBounds {
                axis,
                dimension: table.dim(),
            });
        }

        let (node_value, query_value) = (node_point[axis], query[axis]);
        if (query_value - node_value).abs() < bound {
            stack.extend(node.right);
            stack.extend(node.left);
        } else if node_value < query_value {
            stack.extend(node.right);
        } else if node_value > query_value {
            stack.extend(node.left);
        }
        // Equal coordinates outside the bound: this branch stops here.
    }

    Ok(best)
}

/// Exhaustive scan of every row; the reference the bounded search is measured against.
///
/// Ties keep the lowest row index.
pub fn brute_force_nearest<T: DataTable + ?Sized>(
    table: &T,
    query: &[f64],
) -> Result<Neighbor, KdTreeError> {
    check_query(table, query)?;
    if table.is_empty() {
        return Err(KdTreeError::EmptyInput("table has no rows".to_string()));
    }
    let mut best = Neighbor {
        index: 0,
        distance: euclidean_distance(query, table.row(0)),
    };
    for index in 1..table.size() {
        let distance = euclidean_distance(query, table.row(index));
        if distance < best.distance {
            best = Neighbor { index, distance };
        }
    }
    Ok(best)
}

/// Euclidean distance over the full coordinate vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn check_query<T: DataTable + ?Sized>(table: &T, query: &[f64]) -> Result<(), KdTreeError> {
    if query.len() != table.dim() {
        return Err(KdTreeError::DimensionMismatch {
            expected: table.dim(),
            found: query.len(),
        });
    }
    if let Some((axis, &value)) = query.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(KdTreeError::NonFiniteQuery { axis, value });
    }
    Ok(())
}

fn point<T: DataTable + ?Sized>(table: &T, index: usize) -> Result<&[f64], KdTreeError> {
    if index >= table.size() {
        return Err(KdTreeError::IndexOutOfBounds {
            index,
            size: table.size(),
        });
    }
    Ok(table.row(index))
}
