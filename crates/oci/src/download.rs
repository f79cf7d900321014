//! Reconstituting a directory tree from a pulled image.

use flate2::read::GzDecoder;
use std::path::Path;
use tracing::{debug, info};

use crate::extract::{ExtractSummary, unpack};
use crate::platform::current_platform;
use crate::reference::RegistryReference;
use crate::registry::Registry;
use crate::{Error, Result};

/// What a download wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Number of layers extracted.
    pub layers: usize,
    /// Totals across all layers.
    pub summary: ExtractSummary,
}

/// Pulls images through a [`Registry`] and extracts their layers.
pub struct Downloader<'a, R: Registry + ?Sized> {
    registry: &'a R,
}

impl<'a, R: Registry + ?Sized> Downloader<'a, R> {
    /// Create a downloader.
    #[must_use]
    pub const fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Pull `reference` and extract every layer, in order, into `destination`.
    ///
    /// The destination is created with its parents once the pull succeeds.
    /// Later layers overwrite files written by earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails, the destination cannot be created,
    /// or any layer fails to extract.
    pub async fn download(
        &self,
        reference: &RegistryReference,
        destination: &Path,
    ) -> Result<DownloadReport> {
        info!(
            %reference,
            destination = %destination.display(),
            platform = %current_platform(),
            "Downloading image"
        );
        let layers = self.registry.pull_layers(reference).await?;
        std::fs::create_dir_all(destination).map_err(|e| Error::extract(destination, e))?;

        let mut summary = ExtractSummary::default();
        for layer in &layers {
            debug!(digest = %layer.digest, media_type = %layer.media_type, size = layer.data.len(), "Extracting layer");
            summary += if layer.is_gzip() {
                unpack(destination, GzDecoder::new(layer.data.as_slice()))?
            } else {
                unpack(destination, layer.data.as_slice())?
            };
        }

        info!(
            %reference,
            layers = layers.len(),
            files = summary.files,
            directories = summary.directories,
            "Download complete"
        );
        Ok(DownloadReport {
            layers: layers.len(),
            summary,
        })
    }
}
