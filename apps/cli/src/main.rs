//! tabfit CLI - batch training and prediction over a relational store
//!
//! `tabfit train <script>` fits a model on the rows a query returns and
//! saves it under `models/`. `tabfit predict <model> <script>` scores the
//! rows a query returns and replaces the configured destination table.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::{predict, train};

#[derive(Parser, Debug)]
#[command(name = "tabfit", author, version, about = "Train and apply tabular regression models")]
struct Args {
    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model on the rows returned by a query script
    ///
    /// The artifact name is derived from the script name:
    /// `train-sales.sql` is saved as `models/model-sales.pkl`.
    Train {
        /// Path to the query script
        script: PathBuf,

        /// Print the training report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the rows returned by a query script and write them back
    ///
    /// Results replace the table named by DB_PREDICTION_TABLE, inside
    /// DB_PREDICTION_SCHEMA when set.
    Predict {
        /// Path to a .pkl artifact, or its name inside the model directory
        model: PathBuf,

        /// Path to the query script
        script: PathBuf,

        /// Print the prediction report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false).with_writer(std::io::stderr))
        .init();

    let working_dir = std::env::current_dir()?;
    let pipeline_config = config::load_config(&working_dir)?;

    match args.command {
        Command::Train { script, json } => train::execute(&pipeline_config, &script, json)?,
        Command::Predict { model, script, json } => predict::execute(&pipeline_config, &model, &script, json)?,
    }

    Ok(())
}
