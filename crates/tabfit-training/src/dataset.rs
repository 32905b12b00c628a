use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tabfit_models::FeatureMatrix;

/// A single cell, mirroring the SQL storage classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value; `None` for nulls and text.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::Null | Self::Text(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A named, ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self { name: name.into(), values }
    }

    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Value::Real).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts every value to `f64`, failing on the first null or text cell.
    pub fn to_f64(&self) -> PipelineResult<Vec<f64>> {
        self.values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_f64().ok_or_else(|| {
                    PipelineError::Schema(format!(
                        "column '{}' has non-numeric value {:?} at row {}",
                        self.name, v, row
                    ))
                })
            })
            .collect()
    }
}

/// In-memory table: ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularDataset {
    columns: Vec<Column>,
}

impl TabularDataset {
    pub fn new(columns: Vec<Column>) -> PipelineResult<Self> {
        let mut dataset = Self::default();
        for column in columns {
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Appends a column at the end.
    ///
    /// Fails if the name is taken or the length differs from the existing row count.
    pub fn push_column(&mut self, column: Column) -> PipelineResult<()> {
        if self.has_column(&column.name) {
            return Err(PipelineError::Schema(format!("duplicate column name '{}'", column.name)));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(PipelineError::Schema(format!(
                "column '{}' has {} rows, dataset has {}",
                column.name,
                column.len(),
                self.n_rows()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Splits off `name`, returning the remaining dataset and the removed column.
    pub fn split_column(mut self, name: &str) -> PipelineResult<(Self, Column)> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::Schema(format!("column '{name}' not found in dataset")))?;
        let column = self.columns.remove(idx);
        Ok((self, column))
    }

    /// Values of row `row` in column order.
    pub fn row(&self, row: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[row]).collect()
    }

    /// Builds a dense feature matrix from the named columns, in the given order.
    pub fn feature_matrix(&self, names: &[String]) -> PipelineResult<FeatureMatrix> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .ok_or_else(|| PipelineError::Schema(format!("feature column '{name}' not found")))?
                    .to_f64()
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        if columns.is_empty() {
            return Ok(FeatureMatrix::new(Vec::new(), self.n_rows(), 0)?);
        }
        Ok(FeatureMatrix::from_columns(&columns)?)
    }

    /// Checks that the dataset's columns are exactly `expected`, in any order.
    pub fn ensure_columns(&self, expected: &[String]) -> PipelineResult<()> {
        let actual: HashSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();

        let mut missing: Vec<&str> = wanted.difference(&actual).copied().collect();
        let mut unexpected: Vec<&str> = actual.difference(&wanted).copied().collect();
        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        unexpected.sort_unstable();
        Err(PipelineError::Schema(format!(
            "feature columns do not match the model (missing: {missing:?}, unexpected: {unexpected:?})"
        )))
    }
}
