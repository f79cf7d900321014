//! Artifact records from `artifacts.json`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The kind of a release artifact.
///
/// The release tool tags every artifact with a string type. Only archives are
/// uploaded, but the other tags are kept so that nothing is silently dropped
/// when the list is re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactKind {
    /// A packaged archive (`"Archive"`), one per platform.
    Archive,
    /// A raw compiled binary (`"Binary"`).
    Binary,
    /// Any other tag (checksums, source archives, metadata, ...).
    Other(String),
}

impl ArtifactKind {
    /// The tag as written in `artifacts.json`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Archive => "Archive",
            Self::Binary => "Binary",
            Self::Other(tag) => tag,
        }
    }

    /// Whether this artifact is an uploadable archive.
    #[must_use]
    pub const fn is_archive(&self) -> bool {
        matches!(self, Self::Archive)
    }
}

impl From<String> for ArtifactKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Archive" => Self::Archive,
            "Binary" => Self::Binary,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for ArtifactKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl Default for ArtifactKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of `artifacts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Artifact {
    /// File name of the artifact (e.g. `tool_1.0.0_linux_amd64.tar.gz`).
    #[serde(default)]
    pub name: String,
    /// Path of the artifact relative to the release directory.
    #[serde(default)]
    pub path: String,
    /// Target operating system (`goos`).
    #[serde(default, rename = "goos")]
    pub os: String,
    /// Target architecture (`goarch`).
    #[serde(default, rename = "goarch")]
    pub arch: String,
    /// ARM64 variant (`goarm64`), empty for other architectures.
    #[serde(default, rename = "goarm64")]
    pub arm_variant: String,
    /// Artifact type tag.
    #[serde(default, rename = "type")]
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Resolve the artifact path against the directory the sidecars were read from.
    ///
    /// Absolute paths are returned unchanged.
    #[must_use]
    pub fn resolve_path(&self, base: &Path) -> PathBuf {
        base.join(&self.path)
    }
}
