use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A query script or model artifact is missing on disk.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required connection or destination parameter is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unrecognized artifact extension, source type, save mode or write mode.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Dataset columns do not line up with what training or the model expects.
    #[error("schema error: {0}")]
    Schema(String),

    #[error(transparent)]
    Model(#[from] tabfit_models::ModelError),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
