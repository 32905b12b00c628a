use crate::artifacts::{ArtifactStore, ModelArtifact, SaveMode};
use crate::dataset::TabularDataset;
use crate::error::{PipelineError, PipelineResult};
use serde::Serialize;
use std::path::PathBuf;
use tabfit_models::{RandomForestRegressor, Regressor};
use tracing::info;

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub artifact_path: PathBuf,
    pub sha256: String,
    pub rows: usize,
    pub target: String,
    pub feature_names: Vec<String>,
    /// Root-mean-square error on the training rows themselves.
    pub train_rmse: f64,
}

/// Fits a regressor on a full dataset and persists it as an artifact.
///
/// `template` is cloned unfitted for every run, so one trainer can be reused.
#[derive(Debug, Clone)]
pub struct Trainer<R = RandomForestRegressor> {
    store: ArtifactStore,
    template: R,
}

impl Trainer<RandomForestRegressor> {
    /// Random forest with 100 trees and seed 195.
    #[must_use]
    pub fn new(store: ArtifactStore) -> Self {
        Self::with_regressor(store, RandomForestRegressor::default())
    }
}

impl<R> Trainer<R>
where
    R: Regressor + Clone + Serialize,
{
    pub fn with_regressor(store: ArtifactStore, template: R) -> Self {
        Self { store, template }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Fits on every column except `target` and saves the model as `model_name`.
    ///
    /// Nothing is written if the target column is absent or fitting fails.
    pub fn train(
        &self,
        dataset: TabularDataset,
        target: &str,
        model_name: &str,
    ) -> PipelineResult<TrainingReport> {
        if !dataset.has_column(target) {
            return Err(PipelineError::Schema(format!(
                "target column '{target}' not found (columns: {:?})",
                dataset.column_names()
            )));
        }

        let (features, labels) = dataset.split_column(target)?;
        let feature_names = features.column_names();
        if feature_names.is_empty() {
            return Err(PipelineError::Schema(format!("dataset has no feature columns besides '{target}'")));
        }
        let labels = labels.to_f64()?;
        let matrix = features.feature_matrix(&feature_names)?;

        info!(
            model = R::KIND,
            rows = matrix.n_rows(),
            features = feature_names.len(),
            target_column = target,
            "Training model"
        );
        let mut model = self.template.clone();
        model.fit(&matrix, &labels)?;
        let train_rmse = rmse(&model.predict(&matrix)?, &labels);

        let artifact = ModelArtifact::new(model, target, feature_names.clone());
        let saved = self.store.save_as(&artifact, model_name, SaveMode::Pkl)?;
        info!(path = %saved.path.display(), train_rmse, "Training complete");

        Ok(TrainingReport {
            artifact_path: saved.path,
            sha256: saved.sha256,
            rows: labels.len(),
            target: target.to_string(),
            feature_names,
            train_rmse,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn rmse(predictions: &[f64], labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let sse: f64 = predictions.iter().zip(labels).map(|(p, y)| (p - y).powi(2)).sum();
    (sse / labels.len() as f64).sqrt()
}
