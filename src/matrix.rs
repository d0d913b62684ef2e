//! Feature matrix construction.
//!
//! Selects named columns from an [`ObservationTable`] into a dense
//! `N × D` matrix. Column order follows the request exactly; row `i` of the
//! matrix is row `i` of the table.

use ndarray::{Array2, ArrayView1};

use crate::error::{Error, Result};
use crate::table::ObservationTable;

/// Dense numeric observations, one row per observation.
///
/// Invariants: at least one row and one column, every entry finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Extract `features` (in this order) from `table`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tabclust::{FeatureMatrix, ObservationTable};
    ///
    /// let table = ObservationTable::from_csv_reader("a,b\n1,2\n3,4\n".as_bytes()).unwrap();
    /// let m = FeatureMatrix::from_table(&table, &["b", "a"]).unwrap();
    /// assert_eq!(m.row(0).to_vec(), vec![2.0, 1.0]);
    /// ```
    pub fn from_table<S: AsRef<str>>(table: &ObservationTable, features: &[S]) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "at least one feature column is required".into(),
            });
        }
        if table.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = table.len();
        let d = features.len();
        let mut flat = Vec::with_capacity(n * d);
        for (i, row) in table.rows().iter().enumerate() {
            for name in features {
                let name = name.as_ref();
                let cell = row
                    .get(name)
                    .ok_or_else(|| Error::invalid_column(name, "no such column"))?;
                let v = cell.as_f64().ok_or_else(|| {
                    Error::invalid_column(name, format!("row {i} holds non-numeric value {cell:?}"))
                })?;
                flat.push(v);
            }
        }

        let data = Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Ingest(e.to_string()))?;
        Ok(Self {
            columns: features.iter().map(|s| s.as_ref().to_string()).collect(),
            data,
        })
    }

    /// Build from raw rows. Columns are named `x0`, `x1`, ...
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyInput)?;
        let d = first.len();
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "rows",
                message: "rows must have at least one coordinate".into(),
            });
        }

        let mut flat = Vec::with_capacity(rows.len() * d);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(Error::invalid_column(format!("x{j}"), format!("row {i} is not finite")));
            }
            flat.extend_from_slice(row);
        }

        let data = Array2::from_shape_vec((rows.len(), d), flat)
            .map_err(|e| Error::Ingest(e.to_string()))?;
        Ok(Self {
            columns: (0..d).map(|j| format!("x{j}")).collect(),
            data,
        })
    }

    /// Number of observations (N).
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features (D).
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Feature names in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Rows as nested vectors (for serialization).
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Row, Scalar};

    fn table() -> ObservationTable {
        let rows = vec![
            [("x", Scalar::Number(1.0)), ("y", Scalar::Text("2".into())), ("tag", Scalar::Text("a".into()))],
            [("x", Scalar::Number(3.0)), ("y", Scalar::Number(4.0)), ("tag", Scalar::Text("b".into()))],
        ]
        .into_iter()
        .map(|cells| cells.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Row>())
        .collect();
        ObservationTable::from_records(rows).unwrap()
    }

    #[test]
    fn test_column_order_follows_request() {
        let m = FeatureMatrix::from_table(&table(), &["y", "x"]).unwrap();
        assert_eq!(m.columns(), ["y", "x"]);
        assert_eq!(m.to_rows(), vec![vec![2.0, 1.0], vec![4.0, 3.0]]);
    }

    #[test]
    fn test_missing_column() {
        let err = FeatureMatrix::from_table(&table(), &["x", "nope"]).unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn test_non_numeric_column() {
        let err = FeatureMatrix::from_table(&table(), &["tag"]).unwrap_err();
        assert!(matches!(err, Error::InvalidColumn { ref column, .. } if column == "tag"));
    }

    #[test]
    fn test_empty_table() {
        let empty = ObservationTable::default();
        assert_eq!(FeatureMatrix::from_table(&empty, &["x"]).unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn test_from_rows_validation() {
        assert_eq!(FeatureMatrix::from_rows(&[]).unwrap_err(), Error::EmptyInput);
        assert!(matches!(
            FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err(),
            Error::DimensionMismatch { expected: 2, found: 1 }
        ));
        assert!(FeatureMatrix::from_rows(&[vec![f64::NAN]]).is_err());
    }
}
