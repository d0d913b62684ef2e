//! Observation tables: rows of named scalar cells.
//!
//! A table is what an ingestion collaborator hands to the engine. It may mix
//! numeric and categorical columns; [`crate::matrix::FeatureMatrix`] later
//! extracts the numeric subset a clustering run needs.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Missing value.
    Null,
    /// Boolean value (never coerced to a number).
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Any other text.
    Text(String),
}

impl Scalar {
    /// Numeric view of the cell, coercing numeric text.
    ///
    /// Returns `None` for nulls, booleans, non-numeric text and non-finite numbers.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Scalar::Number(v) => *v,
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
            Scalar::Null | Scalar::Bool(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Parse a raw text field (CSV cell) into the narrowest scalar.
    pub fn parse_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Scalar::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Scalar::Number(v),
            Err(_) => Scalar::Text(field.to_string()),
        }
    }
}

/// One observation: column name to value.
pub type Row = BTreeMap<String, Scalar>;

/// Ordered rows sharing one column set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObservationTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ObservationTable {
    /// Build a table with an explicit column order.
    ///
    /// Every row must hold exactly the given columns.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let expected: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        if expected.len() != columns.len() {
            return Err(Error::Ingest("duplicate column names".into()));
        }
        for (i, row) in rows.iter().enumerate() {
            if let Some(extra) = row.keys().find(|k| !expected.contains(k.as_str())) {
                return Err(Error::invalid_column(
                    extra.clone(),
                    format!("row {i} has a column missing from the table header"),
                ));
            }
            if let Some(missing) = columns.iter().find(|c| !row.contains_key(*c)) {
                return Err(Error::invalid_column(
                    missing.clone(),
                    format!("missing from row {i}"),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from records; the column set is taken from the first row.
    pub fn from_records(rows: Vec<Row>) -> Result<Self> {
        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self::new(columns, rows)
    }

    /// Parse CSV with a header row.
    ///
    /// Empty fields become [`Scalar::Null`]; fields that parse as numbers
    /// become [`Scalar::Number`]; everything else is kept as text.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row: Row = columns
                .iter()
                .cloned()
                .zip(record.iter().map(Scalar::parse_field))
                .collect();
            rows.push(row);
        }
        tracing::debug!(rows = rows.len(), columns = columns.len(), "parsed csv table");
        Self::new(columns, rows)
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consume the table, returning its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Columns whose non-null cells are all numbers (at least one present).
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| {
                let mut seen = false;
                for row in &self.rows {
                    match row.get(*c) {
                        Some(Scalar::Number(_)) => seen = true,
                        Some(Scalar::Null) | None => {}
                        Some(_) => return false,
                    }
                }
                seen
            })
            .cloned()
            .collect()
    }
}

/// Synthetic blob data: `centers` gaussian blobs in 2-D.
///
/// Centres are drawn uniformly in `[-10, 10]²`; each contributes
/// `rows / centers` points with unit standard-normal noise. Columns are
/// `"Feature 1"` and `"Feature 2"`.
pub fn sample_table(rows: usize, centers: usize, seed: u64) -> Result<ObservationTable> {
    if centers == 0 {
        return Err(Error::InvalidParameter {
            name: "centers",
            message: "must be at least 1".into(),
        });
    }
    let per_center = rows / centers;
    if per_center == 0 {
        return Err(Error::InvalidParameter {
            name: "rows",
            message: format!("{rows} rows cannot cover {centers} centers"),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let centres: Vec<(f64, f64)> = (0..centers)
        .map(|_| (rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0)))
        .collect();

    let columns = vec!["Feature 1".to_string(), "Feature 2".to_string()];
    let mut out = Vec::with_capacity(per_center * centers);
    for (cx, cy) in centres {
        for _ in 0..per_center {
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            let mut row = Row::new();
            row.insert(columns[0].clone(), Scalar::Number(cx + dx));
            row.insert(columns[1].clone(), Scalar::Number(cy + dy));
            out.push(row);
        }
    }

    ObservationTable::new(columns, out)
}
