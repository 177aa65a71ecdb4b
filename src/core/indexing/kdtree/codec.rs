// src/core/indexing/kdtree/codec.rs

//! Line-oriented model format for persisting built trees.
//!
//! A model is one record per node in pre-order (node, left subtree, right
//! subtree), each `representative,split_axis,has_left,has_right`, with `-1` as
//! the split axis of a leaf. The shape is carried by the two flags alone, so
//! a framed model starts with a `# nodes=<N>` header that lets the reader
//! detect truncation up front. Plain (headerless) models are read as well.

use std::collections::HashSet;
use std::fmt;
use std::io::{BufRead, Write};

use log::debug;

use super::builder::{attach, Side};
use super::error::KdTreeError;
use super::tree::{axis_code, KdNode, KdTree, NodeId, DEFAULT_BOUND};
use crate::core::table::DataTable;

const HEADER_PREFIX: &str = "#";
const NODE_COUNT_KEY: &str = "nodes=";

/// Whether a written model carries the node-count header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFraming {
    #[default]
    Framed,
    /// Records only, byte-compatible with headerless models.
    Plain,
}

/// One node as it appears in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRecord {
    pub representative: usize,
    pub split_axis: Option<usize>,
    pub has_left: bool,
    pub has_right: bool,
}

impl ModelRecord {
    pub const fn from_node(node: &KdNode) -> Self {
        Self {
            representative: node.representative,
            split_axis: node.split_axis,
            has_left: node.left.is_some(),
            has_right: node.right.is_some(),
        }
    }

    /// Parses a single record line. `line` is only used for error reporting.
    pub fn parse(text: &str, line: usize) -> Result<Self, KdTreeError> {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        let &[representative, axis, has_left, has_right] = fields.as_slice() else {
            return Err(KdTreeError::malformed(
                line,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        };

        let representative = representative.parse::<usize>().map_err(|_| {
            KdTreeError::malformed(
                line,
                format!("representative '{representative}' is not a non-negative integer"),
            )
        })?;
        let split_axis = match axis.parse::<i64>() {
            Ok(-1) => None,
            Ok(code) => Some(usize::try_from(code).map_err(|_| {
                KdTreeError::malformed(line, format!("split axis {code} is negative"))
            })?),
            Err(_) => {
                return Err(KdTreeError::malformed(
                    line,
                    format!("split axis '{axis}' is not an integer"),
                ))
            }
        };

        Ok(Self {
            representative,
            split_axis,
            has_left: parse_flag(has_left, "has_left", line)?,
            has_right: parse_flag(has_right, "has_right", line)?,
        })
    }
}

impl fmt::Display for ModelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.representative,
            self.split_axis.map_or(-1, axis_code),
            u8::from(self.has_left),
            u8::from(self.has_right)
        )
    }
}

fn parse_flag(field: &str, name: &str, line: usize) -> Result<bool, KdTreeError> {
    match field {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(KdTreeError::malformed(
            line,
            format!("{name} must be 0 or 1, found '{other}'"),
        )),
    }
}

/// Bounds a decoded model is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Representatives must be below this row count.
    pub rows: Option<usize>,
    /// Split axes must be below this dimension; also becomes the tree's dimension.
    pub dimension: Option<usize>,
}

impl DecodeLimits {
    /// No range checks beyond the record format itself.
    pub const fn unbounded() -> Self {
        Self {
            rows: None,
            dimension: None,
        }
    }

    /// Limits taken from the table the model will be searched against.
    pub fn for_table<T: DataTable + ?Sized>(table: &T) -> Self {
        Self {
            rows: Some(table.size()),
            dimension: Some(table.dim()),
        }
    }
}

/// A model as read from text, before its structure is rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStream {
    /// Node count from the header, if the model was framed.
    pub declared_nodes: Option<usize>,
    /// Records paired with their 1-based line numbers.
    pub records: Vec<(usize, ModelRecord)>,
}

/// The tree's records in pre-order.
pub fn encode_records(tree: &KdTree) -> Vec<ModelRecord> {
    tree.preorder()
        .map(|id| ModelRecord::from_node(tree.node(id)))
        .collect()
}

/// Writes `tree` as a model.
pub fn write_model<W: Write>(
    tree: &KdTree,
    mut writer: W,
    framing: ModelFraming,
) -> Result<(), KdTreeError> {
    if framing == ModelFraming::Framed {
        writeln!(writer, "{HEADER_PREFIX} {NODE_COUNT_KEY}{}", tree.len())?;
    }
    for record in encode_records(tree) {
        writeln!(writer, "{record}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the header and records of a model without rebuilding the tree.
///
/// Blank lines are ignored. A header is only accepted before the first record.
pub fn read_records<R: BufRead>(reader: R) -> Result<ModelStream, KdTreeError> {
    let mut stream = ModelStream::default();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if let Some(header) = text.strip_prefix(HEADER_PREFIX) {
            if !stream.records.is_empty() || stream.declared_nodes.is_some() {
                return Err(KdTreeError::malformed(
                    line_no,
                    "header must be the first line of the model",
                ));
            }
            stream.declared_nodes = Some(parse_header(header.trim(), line_no)?);
            continue;
        }
        stream.records.push((line_no, ModelRecord::parse(text, line_no)?));
    }
    Ok(stream)
}

fn parse_header(header: &str, line: usize) -> Result<usize, KdTreeError> {
    header
        .strip_prefix(NODE_COUNT_KEY)
        .and_then(|count| count.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            KdTreeError::malformed(
                line,
                format!("expected '{NODE_COUNT_KEY}<count>', found '{header}'"),
            )
        })
}

/// Rebuilds a tree from a model stream, validating every record.
///
/// Structure comes from the `has_left` / `has_right` flags consumed in
/// pre-order with an explicit stack of open child slots. The resulting tree
/// uses [`DEFAULT_BOUND`]; callers set their configured bound afterwards.
pub fn decode_records(stream: &ModelStream, limits: DecodeLimits) -> Result<KdTree, KdTreeError> {
    if stream.records.is_empty() {
        return Err(KdTreeError::EmptyInput("model contains no records".to_string()));
    }
    if let Some(declared) = stream.declared_nodes {
        if declared != stream.records.len() {
            return Err(KdTreeError::NodeCountMismatch {
                declared,
                actual: stream.records.len(),
            });
        }
    }

    let mut nodes: Vec<KdNode> = Vec::with_capacity(stream.records.len());
    let mut seen = HashSet::with_capacity(stream.records.len());
    let mut open_slots: Vec<(NodeId, Side, usize)> = Vec::new();
    let mut max_axis: Option<usize> = None;

    for (i, &(line, record)) in stream.records.iter().enumerate() {
        let (parent, depth) = if i == 0 {
            (None, 1)
        } else {
            let (parent, side, depth) = open_slots
                .pop()
                .ok_or(KdTreeError::TrailingRecords { line })?;
            (Some((parent, side)), depth)
        };

        check_record(&record, line, limits)?;
        if !seen.insert(record.representative) {
            return Err(KdTreeError::malformed(
                line,
                format!("row {} is already used by another node", record.representative),
            ));
        }
        max_axis = max_axis.max(record.split_axis);

        let id = nodes.len();
        if let Some((parent, side)) = parent {
            attach(&mut nodes, parent, side, id);
        }
        nodes.push(KdNode {
            representative: record.representative,
            split_axis: record.split_axis,
            left: None,
            right: None,
            depth,
        });

        if record.has_right {
            open_slots.push((id, Side::Right, depth + 1));
        }
        if record.has_left {
            open_slots.push((id, Side::Left, depth + 1));
        }
    }

    if !open_slots.is_empty() {
        return Err(KdTreeError::TruncatedModel {
            missing: open_slots.len(),
        });
    }

    let dimension = limits
        .dimension
        .unwrap_or_else(|| max_axis.map_or(0, |axis| axis + 1));
    let tree = KdTree::from_nodes(nodes, DEFAULT_BOUND, dimension);
    debug!(
        "Decoded KD-Tree model: {} nodes, height {}",
        tree.len(),
        tree.height()
    );
    Ok(tree)
}

fn check_record(
    record: &ModelRecord,
    line: usize,
    limits: DecodeLimits,
) -> Result<(), KdTreeError> {
    if let Some(rows) = limits.rows {
        if record.representative >= rows {
            return Err(KdTreeError::malformed(
                line,
                format!(
                    "row {} is out of bounds for a table of {} rows",
                    record.representative, rows
                ),
            ));
        }
    }
    match (record.split_axis, limits.dimension) {
        (None, _) if record.has_left || record.has_right => Err(KdTreeError::malformed(
            line,
            "leaf record (split axis -1) cannot have children",
        )),
        (Some(axis), Some(dimension)) if axis >= dimension => Err(KdTreeError::malformed(
            line,
            format!("split axis {axis} is out of bounds for dimension {dimension}"),
        )),
        _ => Ok(()),
    }
}

/// Reads and decodes a model in one step.
pub fn read_model<R: BufRead>(reader: R, limits: DecodeLimits) -> Result<KdTree, KdTreeError> {
    decode_records(&read_records(reader)?, limits)
}
