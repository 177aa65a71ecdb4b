// src/core/indexing/kdtree/stats.rs

//! Per-axis distribution statistics and split-axis selection.
//!
//! The moments are a fixed contract: population standard deviation, skewness
//! as `sum((x - mean)^3) / std^3` and kurtosis as `sum((x - mean)^4) / std^4`,
//! with no sample-size correction and no excess-kurtosis offset. Changing any
//! of them changes which axis a node splits on, and therefore the tree.

use serde::{Deserialize, Serialize};

use crate::core::table::DataTable;

/// Rule used to score each axis when choosing where to split.
///
/// Stored and configured as an integer code; unknown codes fall back to
/// [`SplitRule::MaxStdDev`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SplitRule {
    /// Code `0`: prefer the axis with the largest standard deviation.
    #[default]
    MaxStdDev,
    /// Code `1`: prefer the axis with the smallest absolute skewness.
    MinAbsSkew,
    /// Code `2`: prefer the axis with the smallest absolute kurtosis.
    MinAbsKurtosis,
}

impl SplitRule {
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::MinAbsSkew,
            2 => Self::MinAbsKurtosis,
            _ => Self::MaxStdDev,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::MaxStdDev => 0,
            Self::MinAbsSkew => 1,
            Self::MinAbsKurtosis => 2,
        }
    }

    /// Score of an axis under this rule; larger is better.
    ///
    /// Zero-variance axes have undefined skewness and kurtosis, so rules 1 and
    /// 2 give them the worst possible score. NaN scores are treated the same.
    pub fn score(self, stats: &AxisStats) -> f64 {
        let score = match self {
            Self::MaxStdDev => stats.std,
            Self::MinAbsSkew if stats.std == 0.0 => f64::NEG_INFINITY,
            Self::MinAbsKurtosis if stats.std == 0.0 => f64::NEG_INFINITY,
            Self::MinAbsSkew => -stats.skew.abs(),
            Self::MinAbsKurtosis => -stats.kurtosis.abs(),
        };
        if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        }
    }
}

impl From<i64> for SplitRule {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<SplitRule> for i64 {
    fn from(rule: SplitRule) -> Self {
        rule.code()
    }
}

/// Moments of one axis over an index subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStats {
    pub mean: f64,
    pub std: f64,
    pub skew: f64,
    pub kurtosis: f64,
}

impl AxisStats {
    /// Computes the moments of `axis` over the rows in `indices`.
    ///
    /// `indices` must be non-empty and every entry a valid row.
    pub fn compute<T: DataTable + ?Sized>(table: &T, axis: usize, indices: &[usize]) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let n = indices.len() as f64;
        let mean = indices.iter().map(|&row| table.get(row, axis)).sum::<f64>() / n;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &row in indices {
            let d = table.get(row, axis) - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }

        let std = (m2 / n).sqrt();
        Self {
            mean,
            std,
            skew: m3 / std.powi(3),
            kurtosis: m4 / std.powi(4),
        }
    }
}

/// Statistics for every axis in `[0, table.dim())`.
pub fn axis_stats<T: DataTable + ?Sized>(table: &T, indices: &[usize]) -> Vec<AxisStats> {
    (0..table.dim())
        .map(|axis| AxisStats::compute(table, axis, indices))
        .collect()
}

/// Picks the split axis for `indices` under `rule`.
///
/// Axes are scanned in increasing order and a later axis only wins with a
/// strictly greater score, so exact ties keep the earlier axis.
pub fn select_split_axis<T: DataTable + ?Sized>(
    table: &T,
    indices: &[usize],
    rule: SplitRule,
) -> usize {
    let mut best_axis = 0;
    let mut best_score = f64::NEG_INFINITY;
    for axis in 0..table.dim() {
        let score = rule.score(&AxisStats::compute(table, axis, indices));
        if axis == 0 || score > best_score {
            best_axis = axis;
            best_score = score;
        }
    }
    best_axis
}
