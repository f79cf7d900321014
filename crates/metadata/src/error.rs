//! Error types for sidecar metadata loading.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading release sidecar files.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A sidecar file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(
        code(ocirel::metadata::read),
        help("Point the command at the release output directory containing metadata.json and artifacts.json")
    )]
    Read {
        /// The file that could not be read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A sidecar file was read but is not valid JSON for the expected shape.
    #[error("Failed to parse {}: {source}", path.display())]
    #[diagnostic(
        code(ocirel::metadata::parse),
        help("The file must be the JSON document written by the release tool")
    )]
    Parse {
        /// The file that failed to parse
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a read error for the given path.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for the given path.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// The sidecar file the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}
