//! Bootstrap-aggregated regression trees.

use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::matrix::FeatureMatrix;
use crate::tree::RegressionTree;
use crate::Regressor;

/// Hyperparameters for [`RandomForestRegressor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Seed for bootstrap sampling and split tie-breaking.
    pub seed: u64,
    /// Draw each tree's rows with replacement; when false every tree sees all rows.
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self { n_estimators: 100, seed: 195, bootstrap: true }
    }
}

impl ForestParams {
    pub fn validate(&self) -> ModelResult<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams("n_estimators must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Random forest regressor: the mean prediction of `n_estimators` unpruned
/// trees, each grown on a bootstrap sample of the rows.
///
/// Fitting is fully determined by [`ForestParams::seed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: Option<usize>,
    trees: Vec<RegressionTree>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl RandomForestRegressor {
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self { params, n_features: None, trees: Vec::new() }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Regressor for RandomForestRegressor {
    const KIND: &'static str = "random_forest_regressor";

    fn fit(&mut self, features: &FeatureMatrix, labels: &[f64]) -> ModelResult<()> {
        self.params.validate()?;

        let n_rows = features.n_rows();
        if n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if labels.len() != n_rows {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{n_rows} labels"),
                actual: format!("{} labels", labels.len()),
            });
        }
        if let Some((row, col)) = features.find_non_finite() {
            return Err(ModelError::NonFinite(format!("features at row {row}, column {col}")));
        }
        if let Some(row) = labels.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite(format!("labels at row {row}")));
        }

        let mut seeder = Xoshiro256PlusPlus::seed_from_u64(self.params.seed);
        let trees = (0..self.params.n_estimators)
            .map(|_| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seeder.next_u64());
                let samples: Vec<usize> = if self.params.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                RegressionTree::grow(features, labels, samples, &mut rng)
            })
            .collect();

        self.trees = trees;
        self.n_features = Some(features.n_cols());
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> ModelResult<Vec<f64>> {
        let expected = self.n_features.ok_or(ModelError::NotFitted)?;
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if features.n_cols() != expected {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{expected} feature columns"),
                actual: format!("{} feature columns", features.n_cols()),
            });
        }

        let n_trees = self.trees.len() as f64;
        let predictions = (0..features.n_rows())
            .map(|row| {
                let row = features.row(row);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect();
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}
