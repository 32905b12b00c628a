use crate::error::{PipelineError, PipelineResult};
use crate::layout::ModelLayout;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tabfit_models::Regressor;
use tracing::{debug, info};

/// Envelope layout version written into every artifact.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The only recognized model artifact extension.
pub const ARTIFACT_EXTENSION: &str = "pkl";

/// A fitted model plus the metadata needed to score with it safely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<M> {
    pub format_version: u32,
    /// Type tag of the serialized model (`Regressor::KIND`).
    pub model_kind: String,
    pub target: String,
    /// Feature columns in the order the model consumes them.
    pub feature_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub model: M,
}

/// Fields read before the model body, so a foreign or newer artifact is
/// rejected without attempting to decode it.
#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    model_kind: String,
}

impl<M: Regressor> ModelArtifact<M> {
    pub fn new(model: M, target: impl Into<String>, feature_names: Vec<String>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_kind: M::KIND.to_string(),
            target: target.into(),
            feature_names,
            created_at: Utc::now(),
            model,
        }
    }

    /// Name of the column predictions are appended under.
    pub fn prediction_column(&self) -> String {
        format!("prediction_{}", self.target)
    }

    /// Checks the feature fingerprint against itself and the model.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.feature_names.is_empty() {
            return Err(PipelineError::Schema("artifact lists no feature columns".to_string()));
        }
        let unique: HashSet<&str> = self.feature_names.iter().map(String::as_str).collect();
        if unique.len() != self.feature_names.len() {
            return Err(PipelineError::Schema("artifact lists duplicate feature columns".to_string()));
        }
        if self.model.n_features() != Some(self.feature_names.len()) {
            return Err(PipelineError::Schema(format!(
                "artifact lists {} feature columns but the model was fit on {:?}",
                self.feature_names.len(),
                self.model.n_features()
            )));
        }
        Ok(())
    }
}

/// How a model is persisted. Only `.pkl` artifacts exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    #[default]
    Pkl,
}

impl FromStr for SaveMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pkl" => Ok(Self::Pkl),
            other => Err(PipelineError::UnsupportedFormat(format!("save mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub sha256: String,
}

pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn sha256_file(path: &Path) -> PipelineResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(sha256_bytes(&bytes))
}

/// Reads and writes model artifacts under the model directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: ModelLayout,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(layout: ModelLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }

    /// Writes `artifact` to `<model dir>/<name>`, replacing any existing file.
    pub fn save<M>(&self, artifact: &ModelArtifact<M>, name: &str) -> PipelineResult<SavedArtifact>
    where
        M: Regressor + Serialize,
    {
        self.layout.ensure_root()?;
        let path = self.layout.artifact_path(name);
        let bytes = serde_json::to_vec(artifact)?;
        std::fs::write(&path, &bytes)?;

        let sha256 = sha256_bytes(&bytes);
        info!(path = %path.display(), sha256 = %sha256, bytes = bytes.len(), "Saved model artifact");
        Ok(SavedArtifact { path, sha256 })
    }

    /// Saves under `name` in the given mode, appending `.pkl` when missing.
    pub fn save_as<M>(
        &self,
        artifact: &ModelArtifact<M>,
        name: &str,
        mode: SaveMode,
    ) -> PipelineResult<SavedArtifact>
    where
        M: Regressor + Serialize,
    {
        match mode {
            SaveMode::Pkl => {
                let suffix = format!(".{ARTIFACT_EXTENSION}");
                if name.ends_with(&suffix) {
                    self.save(artifact, name)
                } else {
                    self.save(artifact, &format!("{name}{suffix}"))
                }
            }
        }
    }

    /// Loads and validates an artifact.
    ///
    /// The path is checked for existence, then for the `.pkl` extension,
    /// before any bytes are read.
    pub fn load<M>(&self, path: &Path) -> PipelineResult<ModelArtifact<M>>
    where
        M: Regressor + DeserializeOwned,
    {
        let path = self.layout.resolve(path);
        if !path.exists() {
            return Err(PipelineError::NotFound(format!("model artifact {}", path.display())));
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
            return Err(PipelineError::UnsupportedFormat(format!(
                "model artifact {} (expected a .{ARTIFACT_EXTENSION} file)",
                path.display()
            )));
        }

        let bytes = std::fs::read(&path)?;
        let header: ArtifactHeader = serde_json::from_slice(&bytes)?;
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::Schema(format!(
                "artifact format version {} is not supported (expected {ARTIFACT_FORMAT_VERSION})",
                header.format_version
            )));
        }
        if header.model_kind != M::KIND {
            return Err(PipelineError::Schema(format!(
                "artifact holds a '{}' model, expected '{}'",
                header.model_kind,
                M::KIND
            )));
        }

        let artifact: ModelArtifact<M> = serde_json::from_slice(&bytes)?;
        artifact.validate()?;
        debug!(
            path = %path.display(),
            target = %artifact.target,
            features = ?artifact.feature_names,
            "Loaded model artifact"
        );
        Ok(artifact)
    }
}
