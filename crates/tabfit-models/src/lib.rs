//! Regression capability for tabfit.
//!
//! This crate defines the [`Regressor`] trait the training pipeline fits and
//! scores through, the dense [`FeatureMatrix`] it consumes, and the default
//! implementation, [`RandomForestRegressor`].

pub mod error;
pub mod forest;
pub mod matrix;
mod tree;

pub use error::{ModelError, ModelResult};
pub use forest::{ForestParams, RandomForestRegressor};
pub use matrix::FeatureMatrix;

/// A fit/predict regression capability.
///
/// Implementations are opaque to the pipeline: it only ever hands them a
/// feature matrix plus labels, and later asks for one prediction per row.
/// Any regressor that can round-trip through serde can be persisted as a
/// model artifact.
pub trait Regressor {
    /// Type tag written into persisted artifacts and checked on load.
    const KIND: &'static str;

    /// Fits the model over `features` (one row per sample) and `labels`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes disagree, the training set is empty,
    /// or any value is not finite.
    fn fit(&mut self, features: &FeatureMatrix, labels: &[f64]) -> ModelResult<()>;

    /// Produces one prediction per row of `features`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been fit or the column count
    /// differs from the one seen during fitting.
    fn predict(&self, features: &FeatureMatrix) -> ModelResult<Vec<f64>>;

    /// Number of feature columns the model was fit on, if fitted.
    fn n_features(&self) -> Option<usize>;
}
