use thiserror::Error;

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised by a regression capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The model was asked to predict before being fit.
    #[error("model has not been fit")]
    NotFitted,

    /// Matrix dimensions do not line up with the labels or the fitted model.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What the model expected.
        expected: String,
        /// What it was given.
        actual: String,
    },

    /// No rows to fit on.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// A feature or label is NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(String),

    /// Hyperparameters out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
