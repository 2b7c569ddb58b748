//! Loading mixture datasets and separating labeled from unlabeled rows.
//!
//! Datasets are CSV text with a header line. Columns whose name starts with
//! `x` are features, in header order; the column named `z` (optional) holds
//! the label. Labels are written as numbers (`2`, `2.0`, `-1.0`), and
//! [`UNLABELED`] marks rows whose cluster is unknown.
//!
//! ```text
//! x_1,x_2,z
//! 0.51,-1.20,-1.0
//! 3.10,2.85,2.0
//! ```

use crate::error::{Error, Result};
use ndarray::{Array2, Axis};
use std::io::BufRead;
use std::path::Path;

/// Label value meaning "no label known".
pub const UNLABELED: i64 = -1;

/// Feature matrix with one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Features, n × d.
    pub x: Array2<f64>,
    /// Label per row; [`UNLABELED`] when unknown.
    pub z: Vec<i64>,
}

/// Rows of a [`Dataset`] split by whether a label is known.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDataset {
    /// Unlabeled rows X.
    pub unlabeled: Array2<f64>,
    /// Labeled rows X̃.
    pub labeled: Array2<f64>,
    /// Labels z̃, parallel to `labeled`.
    pub labels: Vec<usize>,
}

impl SplitDataset {
    /// True when at least one labeled row exists.
    pub fn has_labels(&self) -> bool {
        !self.labels.is_empty()
    }
}

impl Dataset {
    /// Read a dataset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Parse CSV text.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(Error::EmptyInput),
        };
        let columns: Vec<&str> = header.trim().split(',').map(str::trim).collect();
        let x_cols: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.starts_with('x'))
            .map(|(i, _)| i)
            .collect();
        let z_col = columns.iter().position(|name| *name == "z");
        if x_cols.is_empty() {
            return Err(Error::Parse {
                line: 1,
                message: "no feature columns (names starting with 'x')".to_string(),
            });
        }

        let d = x_cols.len();
        let mut flat = Vec::new();
        let mut z = Vec::new();
        for (offset, line) in lines.enumerate() {
            let line_no = offset + 2;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != columns.len() {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("expected {} fields, found {}", columns.len(), fields.len()),
                });
            }
            for &c in &x_cols {
                flat.push(parse_number(fields[c], line_no)?);
            }
            z.push(match z_col {
                Some(c) => parse_label(fields[c], line_no)?,
                None => UNLABELED,
            });
        }

        let x = Array2::from_shape_vec((z.len(), d), flat)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self { x, z })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// True when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Separate unlabeled rows from labeled ones.
    ///
    /// Negative labels other than [`UNLABELED`] are rejected; the upper
    /// bound is checked against K when fitting.
    pub fn split(&self) -> Result<SplitDataset> {
        let mut unlabeled_idx = Vec::new();
        let mut labeled_idx = Vec::new();
        let mut labels = Vec::new();
        for (i, &label) in self.z.iter().enumerate() {
            if label == UNLABELED {
                unlabeled_idx.push(i);
            } else if label < 0 {
                return Err(Error::Parse {
                    line: i + 2,
                    message: format!("invalid label {label}"),
                });
            } else {
                labeled_idx.push(i);
                labels.push(label as usize);
            }
        }
        Ok(SplitDataset {
            unlabeled: self.x.select(Axis(0), &unlabeled_idx),
            labeled: self.x.select(Axis(0), &labeled_idx),
            labels,
        })
    }
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|e| Error::Parse {
        line,
        message: format!("'{field}': {e}"),
    })
}

fn parse_label(field: &str, line: usize) -> Result<i64> {
    let value = parse_number(field, line)?;
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(Error::Parse {
            line,
            message: format!("label '{field}' is not an integer"),
        });
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const SAMPLE: &str = "x_1,x_2,z\n\
                          0.5,-1.0,-1.0\n\
                          1.5,2.0,1.0\n\
                          \n\
                          -0.25,3.0,-1\n\
                          4.0,4.5,0\n";

    #[test]
    fn test_parse_and_split() {
        let ds = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.z, vec![-1, 1, -1, 0]);

        let split = ds.split().unwrap();
        assert_eq!(split.unlabeled, array![[0.5, -1.0], [-0.25, 3.0]]);
        assert_eq!(split.labeled, array![[1.5, 2.0], [4.0, 4.5]]);
        assert_eq!(split.labels, vec![1, 0]);
        assert!(split.has_labels());
    }

    #[test]
    fn test_missing_label_column_means_unlabeled() {
        let ds = Dataset::from_reader("x_1,x_2\n1,2\n3,4\n".as_bytes()).unwrap();
        let split = ds.split().unwrap();
        assert_eq!(split.unlabeled.nrows(), 2);
        assert_eq!(split.labeled.dim(), (0, 2));
        assert!(!split.has_labels());
    }

    #[test]
    fn test_feature_columns_follow_header_order() {
        let ds = Dataset::from_reader("z,x_b,other,x_a\n2,1.0,9,2.0\n".as_bytes()).unwrap();
        assert_eq!(ds.x, array![[1.0, 2.0]]);
        assert_eq!(ds.z, vec![2]);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = Dataset::from_reader("x_1,z\n1.0,0\nabc,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));

        let err = Dataset::from_reader("x_1,z\n1.0,0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = Dataset::from_reader("x_1,z\n1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = Dataset::from_reader("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        assert_eq!(
            Dataset::from_reader("".as_bytes()).unwrap_err(),
            Error::EmptyInput
        );
    }

    #[test]
    fn test_negative_label_rejected_on_split() {
        let ds = Dataset::from_reader("x_1,z\n1.0,-2\n".as_bytes()).unwrap();
        assert!(ds.split().is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Dataset::load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
