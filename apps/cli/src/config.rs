//! CLI configuration loading.

use anyhow::{Context, Result};
use std::path::Path;
use tabfit_training::PipelineConfig;
use tracing::debug;

/// Load the pipeline configuration for a run in `working_dir`.
///
/// Configuration precedence:
/// 1. Environment variables (DB_*, TABFIT_*)
/// 2. Local config file (./tabfit.toml)
/// 3. Defaults
pub fn load_config(working_dir: &Path) -> Result<PipelineConfig> {
    let config = PipelineConfig::load(working_dir).context("Failed to load configuration")?;
    debug!(
        database = %config.database.redacted(),
        model_dir = %config.training.model_dir.display(),
        "Loaded configuration"
    );
    Ok(config)
}
