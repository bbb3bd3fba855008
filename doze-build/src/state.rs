//! Digest state persisted between runs.
//!
//! The content-hash strategy compares against digests recorded by the
//! previous pass. Within one process those live on the file records; this
//! module carries them across restarts in a small JSON document saved
//! next to the build outputs.

use crate::error::{BuildError, BuildResult};
use crate::options::BuildOptions;
use chrono::{DateTime, Utc};
use doze_graph::{BuildGraph, ContentDigest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA: u32 = 1;

/// File name of the persisted state, relative to the output root.
pub const STATE_FILE_NAME: &str = "doze-state.json";

/// Where the state file lives for a given configuration.
#[must_use]
pub fn default_location(options: &BuildOptions) -> PathBuf {
    options.output_path(Path::new(STATE_FILE_NAME))
}

/// Digests recorded by the previous successful pass, keyed by file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    schema: u32,
    generated_at: DateTime<Utc>,
    digests: BTreeMap<String, String>,
}

impl StateFile {
    /// Build a state file from explicit entries.
    pub fn with_digests(entries: impl IntoIterator<Item = (PathBuf, ContentDigest)>) -> Self {
        let digests = entries
            .into_iter()
            .map(|(path, digest)| (path.to_string_lossy().into_owned(), digest.to_hex()))
            .collect();
        Self {
            schema: SCHEMA,
            generated_at: Utc::now(),
            digests,
        }
    }

    /// Capture every recorded digest from a graph.
    #[must_use]
    pub fn capture(graph: &BuildGraph) -> Self {
        let mut digests = BTreeMap::new();
        for unit in graph.units() {
            for file in unit.files() {
                if let Some(digest) = file.digest {
                    digests.insert(file.path.to_string_lossy().into_owned(), digest.to_hex());
                }
            }
        }
        Self {
            schema: SCHEMA,
            generated_at: Utc::now(),
            digests,
        }
    }

    /// The digest recorded for `path`, if any.
    #[must_use]
    pub fn digest_for(&self, path: &Path) -> Option<ContentDigest> {
        self.digests
            .get(path.to_string_lossy().as_ref())
            .and_then(|hex| ContentDigest::from_hex(hex))
    }

    /// Number of recorded digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Load a state file. A missing file is `Ok(None)`, not an error:
    /// the first run of a project has nothing to compare against.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::State` when the file exists but does not
    /// parse or carries an unsupported schema.
    pub async fn load(path: &Path) -> BuildResult<Option<Self>> {
        if !path.exists() {
            debug!("no state file at {}", path.display());
            return Ok(None);
        }

        let json = tokio::fs::read_to_string(path).await?;
        let state: Self =
            serde_json::from_str(&json).map_err(|err| BuildError::State(err.to_string()))?;
        if state.schema != SCHEMA {
            return Err(BuildError::State(format!(
                "unsupported schema {} (expected {SCHEMA})",
                state.schema
            )));
        }

        info!("loaded {} digest(s) from {}", state.len(), path.display());
        Ok(Some(state))
    }

    /// Save the state file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Io` when the file cannot be written.
    pub async fn save(&self, path: &Path) -> BuildResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|err| BuildError::State(err.to_string()))?;
        tokio::fs::write(path, json).await?;
        debug!("saved {} digest(s) to {}", self.len(), path.display());
        Ok(())
    }
}
