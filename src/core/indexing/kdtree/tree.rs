// src/core/indexing/kdtree/tree.rs

//! Defines the core KD-Tree structures: `KdNode` and `KdTree`.

use std::fmt::Write as _;

use serde::Serialize;

use super::error::KdTreeError;
use crate::core::table::DataTable;

/// Hyperplane bound used when none is configured.
pub const DEFAULT_BOUND: f64 = 0.1;

/// Position of a node inside its tree's arena.
pub type NodeId = usize;

/// Represents a node in the KD-Tree.
///
/// A node stands for one row of the backing table (its representative). Internal
/// nodes split their descendants on `split_axis`; leaves have no axis and no
/// children. Children are referenced by their position in the owning tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdNode {
    pub representative: usize,
    pub split_axis: Option<usize>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    /// Depth in the tree, the root being 1. Kept for diagnostics.
    pub depth: usize,
}

impl KdNode {
    pub(super) const fn leaf(representative: usize, depth: usize) -> Self {
        Self {
            representative,
            split_axis: None,
            left: None,
            right: None,
            depth,
        }
    }

    pub(super) const fn split(representative: usize, axis: usize, depth: usize) -> Self {
        Self {
            representative,
            split_axis: Some(axis),
            left: None,
            right: None,
            depth,
        }
    }

    pub const fn is_leaf(&self) -> bool {
        self.split_axis.is_none()
    }
}

/// Represents a KD-Tree.
///
/// Nodes are kept in a flat arena with the root at position 0; builders and
/// the model decoder both fill it in pre-order. The tree stores row indices
/// only, so every traversal needs the table the tree was built from (or one
/// with the same rows).
#[derive(Debug, Clone, PartialEq)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    bound: f64,
    dimension: usize,
}

/// Shape summary of a tree, suitable for logging or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSummary {
    pub nodes: usize,
    pub leaves: usize,
    pub height: usize,
    pub dimension: usize,
    pub bound: f64,
}

impl KdTree {
    /// Assembles a tree from a pre-order arena. Callers guarantee that `nodes`
    /// is non-empty and that child ids point inside it.
    pub(super) fn from_nodes(nodes: Vec<KdNode>, bound: f64, dimension: usize) -> Self {
        debug_assert!(!nodes.is_empty());
        Self {
            nodes,
            bound,
            dimension,
        }
    }

    pub fn root(&self) -> &KdNode {
        &self.nodes[0]
    }

    pub const fn root_id(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &KdNode {
        &self.nodes[id]
    }

    /// All nodes in arena (pre-order) order.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub const fn bound(&self) -> f64 {
        self.bound
    }

    /// Returns the dimensionality of the points this tree indexes.
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Changes the hyperplane bound used by searches.
    ///
    /// # Errors
    ///
    /// Rejects negative and NaN bounds. `f64::INFINITY` is allowed and makes
    /// searches exhaustive.
    pub fn set_bound(&mut self, bound: f64) -> Result<(), KdTreeError> {
        self.bound = validate_bound(bound)?;
        Ok(())
    }

    pub fn with_bound(mut self, bound: f64) -> Result<Self, KdTreeError> {
        self.set_bound(bound)?;
        Ok(self)
    }

    /// Ids in pre-order (node, left subtree, right subtree).
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root_id()],
        }
    }

    /// Number of levels; a single leaf has height 1.
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn summary(&self) -> TreeSummary {
        TreeSummary {
            nodes: self.len(),
            leaves: self.nodes.iter().filter(|n| n.is_leaf()).count(),
            height: self.height(),
            dimension: self.dimension,
            bound: self.bound,
        }
    }

    /// Renders the tree one node per line, children indented four spaces
    /// deeper than their parent: `index:(x,y) ax:axis`.
    ///
    /// # Errors
    ///
    /// Fails when a node refers to a row outside `table`.
    pub fn render<T: DataTable + ?Sized>(&self, table: &T) -> Result<String, KdTreeError> {
        let mut out = String::new();
        for id in self.preorder() {
            let node = self.node(id);
            if node.representative >= table.size() {
                return Err(KdTreeError::IndexOutOfBounds {
                    index: node.representative,
                    size: table.size(),
                });
            }
            let coords = table
                .row(node.representative)
                .iter()
                .map(|v| format!("{v:.2}"))
                .collect::<Vec<_>>()
                .join(",");
            let axis = node.split_axis.map_or(-1, axis_code);
            let indent = (node.depth - 1) * 4;
            let _ = writeln!(
                out,
                "{:indent$}{}:({}) ax:{}",
                "",
                node.representative,
                coords,
                axis,
                indent = indent
            );
        }
        Ok(out)
    }
}

/// Pre-order iterator over node ids, driven by an explicit stack.
pub struct Preorder<'a> {
    tree: &'a KdTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        if let Some(right) = node.right {
            self.stack.push(right);
        }
        if let Some(left) = node.left {
            self.stack.push(left);
        }
        Some(id)
    }
}

pub(super) fn validate_bound(bound: f64) -> Result<f64, KdTreeError> {
    if bound.is_nan() || bound < 0.0 {
        Err(KdTreeError::InvalidBound(bound))
    } else {
        Ok(bound)
    }
}

/// Signed form of an axis as written in models and dumps.
#[allow(clippy::cast_possible_wrap)]
pub(super) const fn axis_code(axis: usize) -> i64 {
    axis as i64
}
