//! The registry operations uploads and downloads depend on.

use async_trait::async_trait;
use oci_distribution::manifest::OciImageIndex;

use crate::Result;
use crate::image::ArchiveImage;
use crate::reference::RegistryReference;

/// A layer fetched from a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledLayer {
    /// Layer media type as declared in the manifest.
    pub media_type: String,
    /// `sha256:` digest of the layer blob.
    pub digest: String,
    /// Raw blob contents (possibly compressed).
    pub data: Vec<u8>,
}

impl PulledLayer {
    /// Whether the blob is gzip-compressed according to its media type.
    #[must_use]
    pub fn is_gzip(&self) -> bool {
        self.media_type.ends_with("+gzip") || self.media_type.ends_with(".tar.gzip")
    }
}

/// Remote registry operations.
///
/// [`OciClient`](crate::OciClient) implements this over HTTP; tests use an
/// in-memory implementation.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Push a single-layer image under `reference`.
    async fn push_image(&self, reference: &RegistryReference, image: &ArchiveImage)
    -> Result<()>;

    /// Push an image index under `reference`.
    async fn push_index(&self, reference: &RegistryReference, index: &OciImageIndex)
    -> Result<()>;

    /// Pull the image at `reference` and return its layers in manifest order.
    ///
    /// If `reference` names an index, the client picks the manifest for the
    /// host platform.
    async fn pull_layers(&self, reference: &RegistryReference) -> Result<Vec<PulledLayer>>;
}
