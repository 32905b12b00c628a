//! Prediction command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabfit_training::{PipelineConfig, run_prediction};

pub fn execute(config: &PipelineConfig, model: &Path, script: &Path, json_output: bool) -> Result<()> {
    let report = run_prediction(config, model, script)
        .with_context(|| format!("Prediction failed for {}", script.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", "Predictions written".bold().green());
    println!("  Table:  {}", report.destination.cyan());
    println!("  Column: {}", report.prediction_column);
    println!("  Rows:   {}", report.rows_written);
    println!();
    Ok(())
}
