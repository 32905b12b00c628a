//! The two batch runs: train a model from a query, or score a query with a model.
//!
//! Each run is one linear sequence (retrieve, compute, persist). Any error
//! aborts the run; nothing is retried.

use crate::artifacts::{ArtifactStore, ModelArtifact};
use crate::config::{Destination, PipelineConfig};
use crate::error::PipelineResult;
use crate::layout::ModelLayout;
use crate::naming::{model_name_for, prediction_name_for};
use crate::predictor::Predictor;
use crate::store::{DataAccess, RelationalStore};
use crate::trainer::{Trainer, TrainingReport};
use serde::Serialize;
use std::path::Path;
use tabfit_models::RandomForestRegressor;
use tracing::info;

/// Summary of a finished prediction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionReport {
    pub rows_written: usize,
    pub destination: String,
    pub prediction_column: String,
    /// Name derived from the query script (`predict-x.sql` -> `predict-done-x.sql`).
    /// Logged only; the destination always comes from configuration.
    pub output_name: String,
}

/// Trains on the rows returned by `script_path` and saves the model under
/// the name derived from the script.
pub fn run_training(config: &PipelineConfig, script_path: &Path) -> PipelineResult<TrainingReport> {
    config.validate_for_training()?;
    let data = DataAccess::connect(&config.database)?;
    let store = ArtifactStore::new(ModelLayout::new(config.training.model_dir.clone()));
    train_with(&data, &Trainer::new(store), &config.training.target_column, script_path)
}

/// Scores the rows returned by `script_path` with the model at `model_path`
/// and replaces the configured destination table with the result.
pub fn run_prediction(
    config: &PipelineConfig,
    model_path: &Path,
    script_path: &Path,
) -> PipelineResult<PredictionReport> {
    let destination = config.validate_for_prediction()?;
    let data = DataAccess::connect(&config.database)?;
    let store = ArtifactStore::new(ModelLayout::new(config.training.model_dir.clone()));
    predict_with(&data, &store, destination, model_path, script_path)
}

pub fn train_with<S: RelationalStore>(
    data: &DataAccess<S>,
    trainer: &Trainer<RandomForestRegressor>,
    target: &str,
    script_path: &Path,
) -> PipelineResult<TrainingReport> {
    let model_name = model_name_for(&script_path.to_string_lossy());
    info!(script = %script_path.display(), model_name = %model_name, "Starting training run");

    let dataset = data.retrieve(script_path)?;
    trainer.train(dataset, target, &model_name)
}

pub fn predict_with<S: RelationalStore>(
    data: &DataAccess<S>,
    store: &ArtifactStore,
    destination: Destination,
    model_path: &Path,
    script_path: &Path,
) -> PipelineResult<PredictionReport> {
    let output_name = prediction_name_for(&script_path.to_string_lossy());
    info!(
        script = %script_path.display(),
        model = %model_path.display(),
        output_name = %output_name,
        destination = %destination,
        "Starting prediction run"
    );

    let dataset = data.retrieve(script_path)?;
    let artifact: ModelArtifact<RandomForestRegressor> = store.load(model_path)?;

    let predictor = Predictor::new(data, destination);
    let result = predictor.predict(dataset, &artifact)?;

    Ok(PredictionReport {
        rows_written: result.n_rows(),
        destination: predictor.destination().to_string(),
        prediction_column: artifact.prediction_column(),
        output_name,
    })
}
