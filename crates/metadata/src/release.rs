//! Release-level metadata and the combined sidecar view.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::artifact::Artifact;
use crate::error::{Error, Result};

/// File name of the project metadata sidecar.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the artifact list sidecar.
pub const ARTIFACTS_FILE: &str = "artifacts.json";

/// Project-level information from `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Project name, used as the index title.
    #[serde(default)]
    pub project_name: String,
    /// Free-form project description.
    #[serde(default)]
    pub description: String,
    /// Git tag the release was built from.
    #[serde(default)]
    pub tag: String,
    /// Release version (usually the tag without a leading `v`).
    #[serde(default)]
    pub version: String,
    /// Commit hash the release was built from.
    #[serde(default)]
    pub commit: String,
    /// Build timestamp.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Both sidecar documents of a release directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseData {
    /// Contents of `metadata.json`.
    pub metadata: ReleaseMetadata,
    /// Contents of `artifacts.json`, in file order.
    pub artifacts: Vec<Artifact>,
}

impl ReleaseData {
    /// Load `metadata.json` and `artifacts.json` from `dir`.
    ///
    /// `dir` is expected to be absolute; relative paths are resolved by the
    /// operating system against the process working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if either file cannot be read and
    /// [`Error::Parse`] if either file is not valid JSON of the expected shape.
    pub fn load(dir: &Path) -> Result<Self> {
        let metadata: ReleaseMetadata = read_json(&dir.join(METADATA_FILE))?;
        let artifacts: Vec<Artifact> = read_json(&dir.join(ARTIFACTS_FILE))?;

        debug!(
            dir = %dir.display(),
            project = %metadata.project_name,
            tag = %metadata.tag,
            artifact_count = artifacts.len(),
            "Loaded release sidecars"
        );

        Ok(Self {
            metadata,
            artifacts,
        })
    }

    /// Artifacts of kind `Archive`, in their original order.
    pub fn archives(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.kind.is_archive())
    }

    /// Number of archive artifacts.
    #[must_use]
    pub fn archive_count(&self) -> usize {
        self.archives().count()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read(path).map_err(|e| Error::read(path, e))?;
    serde_json::from_slice(&content).map_err(|e| Error::parse(path, e))
}
