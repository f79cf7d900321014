//! `download`

use ocirel_oci::{DownloadReport, Downloader, Registry, RegistryReference};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{absolute_path, parse_reference};
use crate::cli::CliError;

/// Validated arguments for `download`.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Source reference.
    pub reference: RegistryReference,
    /// Absolute destination directory; may not exist yet.
    pub destination: PathBuf,
}

impl DownloadConfig {
    /// Validate raw arguments.
    ///
    /// # Errors
    ///
    /// Fails if `reference` is invalid or `destination` exists but is not a
    /// directory.
    pub fn from_args(reference: &str, destination: &Path) -> Result<Self, CliError> {
        let reference = parse_reference(reference)?;
        let destination = absolute_path(destination)?;
        if destination.exists() && !destination.is_dir() {
            return Err(CliError::NotADirectory { path: destination });
        }
        Ok(Self {
            reference,
            destination,
        })
    }
}

/// Pull and extract an image.
///
/// # Errors
///
/// Returns registry and extraction errors.
pub async fn execute_download(
    config: &DownloadConfig,
    registry: &dyn Registry,
) -> Result<DownloadReport, CliError> {
    let report = Downloader::new(registry)
        .download(&config.reference, &config.destination)
        .await?;
    info!(
        destination = %config.destination.display(),
        layers = report.layers,
        files = report.summary.files,
        "Download finished"
    );
    Ok(report)
}
