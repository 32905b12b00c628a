//! Artifact naming conventions.
//!
//! Training inputs map to model artifacts:
//! `queries/train-sales.sql` becomes `model-sales.pkl`.
//! Prediction inputs map to output names:
//! `queries/predict-sales.sql` becomes `predict-done-sales.sql`.

use crate::artifacts::ARTIFACT_EXTENSION;

/// Data-format suffixes recognized on training inputs, in priority order.
pub const DATA_SUFFIXES: [&str; 3] = ["parquet", "csv", "sql"];

pub const TRAIN_TOKEN: &str = "train-";
pub const MODEL_PREFIX: &str = "model-";
pub const PREDICT_TOKEN: &str = "predict-";
pub const PREDICT_DONE_PREFIX: &str = "predict-done-";

/// Final segment of a `/`-separated path. Total: returns `""` for a trailing slash.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', std::path::MAIN_SEPARATOR]).next().unwrap_or(path)
}

/// Derives the model artifact name for a training input path.
///
/// The first matching data suffix is swapped for `.pkl` and every `train-`
/// becomes `model-`; the result always starts with `model-`. Inputs with no
/// recognized suffix keep their extension.
pub fn model_name_for(path: &str) -> String {
    let mut name = basename(path).to_string();

    for suffix in DATA_SUFFIXES {
        if let Some(stem) = name.strip_suffix(&format!(".{suffix}")) {
            name = format!("{stem}.{ARTIFACT_EXTENSION}").replace(TRAIN_TOKEN, MODEL_PREFIX);
            break;
        }
    }

    if name.starts_with(MODEL_PREFIX) { name } else { format!("{MODEL_PREFIX}{name}") }
}

/// Derives the prediction output name for a prediction input path.
pub fn prediction_name_for(path: &str) -> String {
    let name = basename(path).replace(PREDICT_TOKEN, PREDICT_DONE_PREFIX);
    if name.starts_with(PREDICT_DONE_PREFIX) { name } else { format!("{PREDICT_DONE_PREFIX}{name}") }
}
