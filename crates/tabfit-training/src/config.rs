//! Pipeline configuration.
//!
//! Values are layered, later sources overriding earlier ones:
//! 1. Defaults
//! 2. `tabfit.toml` in the working directory
//! 3. Environment variables (`DB_*`, `TABFIT_*`)
//!
//! Everything is validated once, before a run touches the data store.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "tabfit.toml";
pub const DEFAULT_TARGET_COLUMN: &str = "total_sales";
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Connection parameters for the relational store.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name. The embedded SQLite driver opens this as a file path.
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(PipelineError::Configuration("DB_NAME is required".to_string())),
        }
    }

    /// Path of the database file used by the embedded driver.
    pub fn database_path(&self) -> PipelineResult<PathBuf> {
        self.validate()?;
        Ok(PathBuf::from(self.name.as_deref().unwrap_or_default().trim()))
    }

    /// Server-style connection string assembled from all parameters.
    pub fn connection_string(&self) -> String {
        self.render(self.password.as_deref().unwrap_or_default())
    }

    /// Same as [`Self::connection_string`] with the password masked, for logs.
    pub fn redacted(&self) -> String {
        self.render(if self.password.is_some() { "***" } else { "" })
    }

    fn render(&self, password: &str) -> String {
        let user = self.user.as_deref().unwrap_or_default();
        let host = self.host.as_deref().unwrap_or_default();
        let port = self.port.map(|p| p.to_string()).unwrap_or_default();
        let name = self.name.as_deref().unwrap_or_default();
        format!("postgresql://{user}:{password}@{host}:{port}/{name}")
    }
}

/// Where prediction results are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

/// A validated prediction destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub table: String,
    pub namespace: Option<String>,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

impl PredictionConfig {
    pub fn destination(&self) -> PipelineResult<Destination> {
        let table = non_empty(self.table.as_deref())
            .ok_or_else(|| PipelineError::Configuration("DB_PREDICTION_TABLE is required".to_string()))?;
        Ok(Destination {
            table: table.to_string(),
            namespace: non_empty(self.schema.as_deref()).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_target_column() -> String {
    DEFAULT_TARGET_COLUMN.to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_DIR)
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { target_column: default_target_column(), model_dir: default_model_dir() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub database: ConnectionConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl PipelineConfig {
    /// Loads configuration for a run rooted at `working_dir`, reading the
    /// process environment.
    pub fn load(working_dir: &Path) -> PipelineResult<Self> {
        Self::load_with(working_dir, |key| std::env::var(key).ok())
    }

    /// Like [`Self::load`], with an explicit variable lookup.
    pub fn load_with<F>(working_dir: &Path, lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = working_dir.join(CONFIG_FILE_NAME);
        let mut config = if file.exists() { Self::load_from_file(&file)? } else { Self::default() };
        config.apply_env(lookup)?;
        if config.training.model_dir.is_relative() {
            config.training.model_dir = working_dir.join(&config.training.model_dir);
        }
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PipelineError::Configuration(format!("{}: {}", path.display(), e)))
    }

    /// Overrides fields with any variables `lookup` returns.
    pub fn apply_env<F>(&mut self, lookup: F) -> PipelineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;
        override_with(&mut db.user, lookup("DB_USER"));
        override_with(&mut db.password, lookup("DB_PASSWORD"));
        override_with(&mut db.host, lookup("DB_HOST"));
        override_with(&mut db.name, lookup("DB_NAME"));
        if let Some(port) = lookup("DB_PORT") {
            let port = port.trim().parse::<u16>().map_err(|_| {
                PipelineError::Configuration(format!("DB_PORT must be a port number, got '{port}'"))
            })?;
            db.port = Some(port);
        }

        override_with(&mut self.prediction.table, lookup("DB_PREDICTION_TABLE"));
        override_with(&mut self.prediction.schema, lookup("DB_PREDICTION_SCHEMA"));

        if let Some(target) = lookup("TABFIT_TARGET") {
            self.training.target_column = target;
        }
        if let Some(dir) = lookup("TABFIT_MODEL_DIR") {
            self.training.model_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate_for_training(&self) -> PipelineResult<()> {
        self.database.validate()?;
        if self.training.target_column.trim().is_empty() {
            return Err(PipelineError::Configuration("target column must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_for_prediction(&self) -> PipelineResult<Destination> {
        self.database.validate()?;
        self.prediction.destination()
    }
}

fn override_with(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
