//! `upload` and `upload-single`

use ocirel_oci::{Registry, RegistryReference, UploadReport, Uploader};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{existing_dir, existing_file, parse_reference};
use crate::cli::CliError;

/// Validated arguments for `upload`.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Absolute release directory.
    pub source: PathBuf,
    /// Target reference.
    pub reference: RegistryReference,
}

impl UploadConfig {
    /// Validate raw arguments.
    ///
    /// # Errors
    ///
    /// Fails if `source` is not an existing directory or `reference` is not a
    /// fully qualified tagged reference.
    pub fn from_args(source: &Path, reference: &str) -> Result<Self, CliError> {
        Ok(Self {
            source: existing_dir(source)?,
            reference: parse_reference(reference)?,
        })
    }
}

/// Validated arguments for `upload-single`.
#[derive(Debug, Clone)]
pub struct UploadSingleConfig {
    /// Absolute archive path.
    pub archive: PathBuf,
    /// Target reference.
    pub reference: RegistryReference,
}

impl UploadSingleConfig {
    /// Validate raw arguments.
    ///
    /// # Errors
    ///
    /// Fails if `archive` is not an existing file or `reference` is invalid.
    pub fn from_args(archive: &Path, reference: &str) -> Result<Self, CliError> {
        Ok(Self {
            archive: existing_file(archive)?,
            reference: parse_reference(reference)?,
        })
    }
}

/// Push a release directory.
///
/// # Errors
///
/// Returns sidecar, archive and registry errors.
pub async fn execute_upload(
    config: &UploadConfig,
    registry: &dyn Registry,
) -> Result<UploadReport, CliError> {
    let report = Uploader::new(registry)
        .upload_release(&config.reference, &config.source)
        .await?;
    info!(
        reference = %report.reference,
        images = report.image_digests.len(),
        "Upload finished"
    );
    Ok(report)
}

/// Push a single archive.
///
/// # Errors
///
/// Returns archive and registry errors.
pub async fn execute_upload_single(
    config: &UploadSingleConfig,
    registry: &dyn Registry,
) -> Result<UploadReport, CliError> {
    let report = Uploader::new(registry)
        .upload_single(&config.reference, &config.archive)
        .await?;
    info!(reference = %report.reference, "Upload finished");
    Ok(report)
}
