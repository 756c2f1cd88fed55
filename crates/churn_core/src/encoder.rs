//! Categorical one-hot encoding
//!
//! Numeric columns pass through in their original order. Each requested
//! categorical column is then replaced by one indicator column per value
//! observed in the input, named `{column}_{value}`, values in lexicographic
//! order. The produced column set therefore depends on which values the
//! batch happens to contain; use [`crate::schema::FeatureSchema::align`]
//! before handing the result to a classifier.

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::errors::{ChurnError, Result};
use crate::matrix::FeatureMatrix;

/// Values of a single input column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

/// Named input column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Column-oriented table of raw (pre-encoding) features
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    columns: Vec<Column>,
}

impl FeatureTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row count, taken from the first column
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }
}

/// One-hot encode `categorical` columns of `table`
pub fn one_hot_encode(table: &FeatureTable, categorical: &[&str]) -> Result<FeatureMatrix> {
    let n_rows = table.n_rows();
    if let Some(col) = table.columns.iter().find(|c| c.len() != n_rows) {
        return Err(ChurnError::InvalidParameters(format!(
            "column {} has {} values, expected {n_rows}",
            col.name,
            col.len()
        )));
    }

    let mut requested = HashSet::with_capacity(categorical.len());
    for name in categorical {
        if !requested.insert(*name) {
            return Err(ChurnError::Config(format!(
                "categorical column listed twice: {name}"
            )));
        }
        match table.column(name).map(Column::values) {
            Some(ColumnValues::Categorical(_)) => {}
            Some(ColumnValues::Numeric(_)) => {
                return Err(ChurnError::Config(format!(
                    "column {name} is numeric and cannot be one-hot encoded"
                )))
            }
            None => {
                return Err(ChurnError::Config(format!(
                    "categorical column not found: {name}"
                )))
            }
        }
    }

    let mut names = Vec::new();
    let mut blocks: Vec<Vec<f64>> = Vec::new();

    for col in &table.columns {
        match &col.values {
            ColumnValues::Numeric(values) => {
                names.push(col.name.clone());
                blocks.push(values.clone());
            }
            ColumnValues::Categorical(_) if requested.contains(col.name.as_str()) => {}
            ColumnValues::Categorical(_) => {
                return Err(ChurnError::Config(format!(
                    "column {} is categorical but not listed for encoding",
                    col.name
                )))
            }
        }
    }

    for name in categorical {
        let Some(ColumnValues::Categorical(values)) = table.column(name).map(Column::values) else {
            continue;
        };
        let observed: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        for category in observed {
            names.push(format!("{name}_{category}"));
            blocks.push(
                values
                    .iter()
                    .map(|v| if v == category { 1.0 } else { 0.0 })
                    .collect(),
            );
        }
    }

    let rows = (0..n_rows)
        .map(|r| blocks.iter().map(|block| block[r]).collect())
        .collect();

    debug!(
        "Encoded {} rows into {} feature columns",
        n_rows,
        names.len()
    );
    FeatureMatrix::new(names, rows)
}
