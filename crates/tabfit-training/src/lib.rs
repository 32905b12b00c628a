//! tabfit training pipeline
//!
//! Batch model lifecycle over a relational store:
//! - Retrieving datasets by running query scripts (`DataAccess`)
//! - Fitting a regressor and persisting it as an artifact (`Trainer`, `ArtifactStore`)
//! - Scoring fresh datasets and writing them back (`Predictor`)
//! - Deriving artifact names from input paths (`naming`)

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod naming;
pub mod pipeline;
pub mod predictor;
pub mod store;
pub mod trainer;

pub use artifacts::{ArtifactStore, ModelArtifact, SaveMode, SavedArtifact, ARTIFACT_EXTENSION, ARTIFACT_FORMAT_VERSION};
pub use config::{ConnectionConfig, Destination, PipelineConfig, PredictionConfig, TrainingConfig};
pub use dataset::{Column, TabularDataset, Value};
pub use error::{PipelineError, PipelineResult};
pub use layout::ModelLayout;
pub use naming::{model_name_for, prediction_name_for};
pub use pipeline::{predict_with, run_prediction, run_training, train_with, PredictionReport};
pub use predictor::{score, Predictor};
pub use store::{DataAccess, RelationalStore, SourceType, SqliteStore, WriteMode};
pub use trainer::{Trainer, TrainingReport};
