use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use super::DataTable;
use crate::core::common::KdError;

/// In-memory table loaded from comma separated numeric text.
///
/// Rows are stored contiguously, so `row()` hands out a borrowed slice.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    values: Vec<f64>,
    rows: usize,
    dim: usize,
}

impl CsvTable {
    /// Builds a table from explicit rows.
    ///
    /// # Errors
    ///
    /// Fails on an empty row list, a row without fields, rows of unequal
    /// length or any non-finite value.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, KdError> {
        let mut builder = TableBuilder::default();
        for (i, row) in rows.into_iter().enumerate() {
            let line = i + 1;
            if let Some((axis, value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(KdError::Parse {
                    line,
                    message: format!("value {value} in column {axis} is not finite"),
                });
            }
            builder.push(line, row)?;
        }
        builder.finish()
    }

    /// Parses comma separated text, one row per line, no header.
    ///
    /// Blank lines are skipped. Line numbers in errors are 1-based.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, KdError> {
        let mut builder = TableBuilder::default();
        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let row = trimmed
                .split(',')
                .map(|field| parse_value(field.trim(), line_no))
                .collect::<Result<Vec<f64>, KdError>>()?;
            builder.push(line_no, row)?;
        }
        builder.finish()
    }

    /// Loads a table from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`KdError::File`] naming the path when it cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, KdError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| KdError::file(path, e))?;
        let table = Self::from_reader(BufReader::new(file))?;
        debug!(
            "Loaded {} rows x {} columns from {}",
            table.rows,
            table.dim,
            path.display()
        );
        Ok(table)
    }

    /// Parses a table held in a string.
    pub fn parse(text: &str) -> Result<Self, KdError> {
        Self::from_reader(text.as_bytes())
    }

    /// Iterates over the rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.dim)
    }
}

impl DataTable for CsvTable {
    fn size(&self) -> usize {
        self.rows
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, row: usize) -> &[f64] {
        let start = row * self.dim;
        &self.values[start..start + self.dim]
    }

    fn get(&self, row: usize, axis: usize) -> f64 {
        assert!(axis < self.dim, "axis {axis} out of range for dimension {}", self.dim);
        self.values[row * self.dim + axis]
    }
}

fn parse_value(field: &str, line: usize) -> Result<f64, KdError> {
    let value: f64 = field.parse().map_err(|_| KdError::Parse {
        line,
        message: format!("'{field}' is not a number"),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KdError::Parse {
            line,
            message: format!("'{field}' is not a finite number"),
        })
    }
}

#[derive(Default)]
struct TableBuilder {
    values: Vec<f64>,
    rows: usize,
    dim: Option<usize>,
}

impl TableBuilder {
    fn push(&mut self, line: usize, row: Vec<f64>) -> Result<(), KdError> {
        if row.is_empty() {
            return Err(KdError::Parse {
                line,
                message: "row has no fields".to_string(),
            });
        }
        match self.dim {
            Some(expected) if expected != row.len() => {
                return Err(KdError::RaggedRow {
                    line,
                    expected,
                    found: row.len(),
                });
            }
            Some(_) => {}
            None => self.dim = Some(row.len()),
        }
        self.values.extend(row);
        self.rows += 1;
        Ok(())
    }

    fn finish(self) -> Result<CsvTable, KdError> {
        match self.dim {
            Some(dim) => Ok(CsvTable {
                values: self.values,
                rows: self.rows,
                dim,
            }),
            None => Err(KdError::EmptyTable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_simple_table() {
        let table = CsvTable::parse("1,2,3\n4, 5 ,6\n\n7,8,9.5\n").unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(table.dim(), 3);
        assert_eq!(table.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(table.get(2, 2), 9.5);
        assert_eq!(table.column(&[2, 0], 1), vec![8.0, 2.0]);
    }

    #[test]
    fn test_parse_scientific_and_negative() {
        let table = CsvTable::parse("-1.5e2,0.25\n3E-1,-0\n").unwrap();
        assert_eq!(table.row(0), &[-150.0, 0.25]);
        assert_eq!(table.get(1, 0), 0.3);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = CsvTable::parse("1,2\n3,4\n5\n").unwrap_err();
        match err {
            KdError::RaggedRow {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("Expected RaggedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let err = CsvTable::parse("1,2\nx,4\n").unwrap_err();
        assert!(matches!(err, KdError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_field_is_rejected() {
        assert!(matches!(
            CsvTable::parse("1,NaN\n").unwrap_err(),
            KdError::Parse { line: 1, .. }
        ));
        assert!(matches!(
            CsvTable::parse("inf,1\n").unwrap_err(),
            KdError::Parse { line: 1, .. }
        ));
        assert!(CsvTable::from_rows(vec![vec![1.0, f64::NAN]]).is_err());
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert!(matches!(CsvTable::parse("").unwrap_err(), KdError::EmptyTable));
        assert!(matches!(
            CsvTable::parse("\n  \n").unwrap_err(),
            KdError::EmptyTable
        ));
        assert!(matches!(
            CsvTable::from_rows(Vec::new()).unwrap_err(),
            KdError::EmptyTable
        ));
        assert!(matches!(
            CsvTable::from_rows(vec![Vec::new()]).unwrap_err(),
            KdError::Parse { line: 1, .. }
        ));
    }

    #[test]
    fn test_from_path_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.5,1.5").unwrap();
        writeln!(file, "2.5,3.5").unwrap();
        file.flush().unwrap();

        let table = CsvTable::from_path(file.path()).unwrap();
        assert_eq!(table.size(), 2);
        assert_eq!(table.rows().collect::<Vec<_>>(), vec![&[0.5, 1.5][..], &[2.5, 3.5][..]]);
    }

    #[test]
    fn test_from_path_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = CsvTable::from_path(&missing).unwrap_err();
        match err {
            KdError::File { path, .. } => assert_eq!(path, missing),
            other => panic!("Expected File error, got {:?}", other),
        }
    }
}
