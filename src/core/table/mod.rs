//! Tabular point storage.
//!
//! The index never copies coordinates: tree nodes refer to rows by index and
//! every coordinate lookup goes through a [`DataTable`].

mod csv_table;

pub use csv_table::CsvTable;

/// Read access to a rectangular table of `f64` values, one point per row.
///
/// Accessors take already-validated row and axis indices and may panic when
/// given anything outside `size()` / `dim()`.
pub trait DataTable {
    /// Number of rows (points).
    fn size(&self) -> usize;

    /// Number of columns (the dimension of every point).
    fn dim(&self) -> usize;

    /// A full row as an ordered slice of `dim()` values.
    fn row(&self, row: usize) -> &[f64];

    /// A single value.
    fn get(&self, row: usize, axis: usize) -> f64 {
        self.row(row)[axis]
    }

    /// The values on `axis` of the given rows, in the order of `indices`.
    fn column(&self, indices: &[usize], axis: usize) -> Vec<f64> {
        indices.iter().map(|&row| self.get(row, axis)).collect()
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
