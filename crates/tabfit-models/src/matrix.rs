use crate::error::{ModelError, ModelResult};

/// Dense row-major matrix of feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Wraps a row-major buffer of `n_rows * n_cols` values.
    pub fn new(data: Vec<f64>, n_rows: usize, n_cols: usize) -> ModelResult<Self> {
        if data.len() != n_rows * n_cols {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} values ({n_rows}x{n_cols})", n_rows * n_cols),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, n_rows, n_cols })
    }

    /// Builds a matrix from per-column vectors, all of the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> ModelResult<Self> {
        let n_cols = columns.len();
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some((idx, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{n_rows} rows in every column"),
                actual: format!("{} rows in column {idx}", col.len()),
            });
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in 0..n_rows {
            data.extend(columns.iter().map(|c| c[row]));
        }
        Ok(Self { data, n_rows, n_cols })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    /// Returns the first non-finite value's position, if any.
    pub(crate) fn find_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|pos| (pos / self.n_cols.max(1), pos % self.n_cols.max(1)))
    }
}
