//! Error types for registry and extraction operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for OCI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during OCI operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to parse or strictly validate a registry reference.
    #[error("Invalid registry reference '{0}': {1}")]
    #[diagnostic(
        code(ocirel::oci::invalid_reference),
        help("Use a fully qualified reference such as ghcr.io/org/repo:v1.0.0")
    )]
    InvalidReference(String, String),

    /// Pushing an image or index failed.
    #[error("Failed to push {reference}: {message}")]
    #[diagnostic(code(ocirel::oci::push))]
    Push {
        /// The target reference.
        reference: String,
        /// Error message from the registry client.
        message: String,
    },

    /// Pulling an image failed.
    #[error("Failed to pull {reference}: {message}")]
    #[diagnostic(code(ocirel::oci::pull))]
    Pull {
        /// The source reference.
        reference: String,
        /// Error message from the registry client.
        message: String,
    },

    /// Reading an archive to upload failed.
    #[error("Failed to read archive '{}': {source}", path.display())]
    #[diagnostic(
        code(ocirel::oci::read_archive),
        help("Check that the artifact paths in artifacts.json exist relative to the source directory")
    )]
    ReadArchive {
        /// The archive path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A tar entry would be written outside the destination directory.
    #[error("Refusing to extract '{}': path escapes the destination", path.display())]
    #[diagnostic(code(ocirel::oci::unsafe_entry_path))]
    UnsafeEntryPath {
        /// The entry path as stored in the archive.
        path: PathBuf,
    },

    /// Writing an extracted entry failed.
    #[error("Failed to extract '{}': {source}", path.display())]
    #[diagnostic(code(ocirel::oci::extract))]
    Extract {
        /// The filesystem target of the entry.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing registry credentials failed.
    #[error("Credential store error: {0}")]
    #[diagnostic(
        code(ocirel::oci::credentials),
        help("Check the docker config file (DOCKER_CONFIG or ~/.docker/config.json)")
    )]
    Credentials(String),

    /// Release sidecar error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Metadata(#[from] ocirel_metadata::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid reference error.
    #[must_use]
    pub fn invalid_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReference(reference.into(), message.into())
    }

    /// Create a push error.
    #[must_use]
    pub fn push(reference: impl ToString, message: impl Into<String>) -> Self {
        Self::Push {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    /// Create a pull error.
    #[must_use]
    pub fn pull(reference: impl ToString, message: impl Into<String>) -> Self {
        Self::Pull {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    /// Create an extraction error for a filesystem target.
    #[must_use]
    pub fn extract(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Extract {
            path: path.into(),
            source,
        }
    }

    /// Create a credential store error.
    #[must_use]
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials(message.into())
    }
}
