//! Training command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabfit_training::{PipelineConfig, run_training};

pub fn execute(config: &PipelineConfig, script: &Path, json_output: bool) -> Result<()> {
    let report = run_training(config, script)
        .with_context(|| format!("Training failed for {}", script.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", "Training complete".bold().green());
    println!("  Model:    {}", report.artifact_path.display().to_string().cyan());
    println!("  Target:   {}", report.target);
    println!("  Features: {}", report.feature_names.join(", ").dimmed());
    println!("  Rows:     {}", report.rows);
    println!("  RMSE:     {:.4}", report.train_rmse);
    println!("  SHA-256:  {}", report.sha256.dimmed());
    println!();
    Ok(())
}
