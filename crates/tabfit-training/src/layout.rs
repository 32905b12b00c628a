use crate::error::PipelineResult;
use std::path::{Path, PathBuf};

/// Filesystem layout for model artifacts.
///
/// Default layout is `<working dir>/models/<artifact name>`.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    root: PathBuf,
}

impl ModelLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn for_working_dir(working_dir: &Path) -> Self {
        Self::new(working_dir.join(crate::config::DEFAULT_MODEL_DIR))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Resolves a user-supplied artifact path.
    ///
    /// Absolute paths and paths that exist as given are used unchanged;
    /// anything else is looked up under the model directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        let candidate = self.root.join(path);
        if candidate.exists() { candidate } else { path.to_path_buf() }
    }

    pub fn ensure_root(&self) -> PipelineResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
