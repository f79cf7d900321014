//! Platform descriptors for index entries.
//!
//! Release tools and OCI both use Go's `GOOS`/`GOARCH` vocabulary
//! (`linux/amd64`, `darwin/arm64`), so values from `artifacts.json` are
//! passed through untouched.

use ocirel_metadata::Artifact;
use std::fmt;

/// An operating system and architecture pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system (linux, darwin, windows).
    pub os: String,
    /// Architecture (amd64, arm64).
    pub arch: String,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform an artifact was built for, exactly as recorded.
    #[must_use]
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self::new(&artifact.os, &artifact.arch)
    }

    /// Convert to the index descriptor form. Only OS and architecture are set.
    #[must_use]
    pub fn to_descriptor(&self) -> oci_distribution::manifest::Platform {
        oci_distribution::manifest::Platform {
            architecture: self.arch.clone(),
            os: self.os.clone(),
            os_version: None,
            os_features: None,
            variant: None,
            features: None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// The platform of the running host, in OCI vocabulary.
///
/// This is what the registry client selects from a multi-platform index
/// when pulling.
#[must_use]
pub fn current_platform() -> Platform {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64le",
        other => other,
    };
    Platform::new(os, arch)
}
