//! Single-layer images and the multi-platform index built from them.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use oci_distribution::client::{Config, ImageLayer};
use oci_distribution::manifest::{ImageIndexEntry, OciImageIndex, OciImageManifest};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

use crate::annotations::Annotations;
use crate::platform::Platform;
use crate::{Error, OCI_IMAGE_MEDIA_TYPE, OCI_INDEX_MEDIA_TYPE, OCI_MEDIA_TYPE, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An image holding exactly one archive layer, ready to push.
#[derive(Clone)]
pub struct ArchiveImage {
    /// The gzip-compressed archive as the only layer.
    pub layer: ImageLayer,
    /// OCI image config carrying the platform and the layer's diff id.
    pub config: Config,
    /// The manifest referencing `layer` and `config`.
    pub manifest: OciImageManifest,
    /// `sha256:` digest of the serialized manifest.
    pub digest: String,
    /// Size of the serialized manifest in bytes.
    pub size: i64,
}

impl fmt::Debug for ArchiveImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveImage")
            .field("digest", &self.digest)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ArchiveImage {
    /// Wrap archive bytes as an image.
    ///
    /// Gzip input is used verbatim. A plain tar is compressed first so the
    /// layer always matches [`OCI_MEDIA_TYPE`]. `platform` is recorded in the
    /// image config; without one, `os` and `architecture` are left empty.
    ///
    /// # Errors
    ///
    /// Returns an error if gzip input cannot be decompressed or the manifest
    /// cannot be serialized.
    pub fn new(
        data: Vec<u8>,
        platform: Option<&Platform>,
        layer_annotations: Annotations,
        manifest_annotations: Annotations,
    ) -> Result<Self> {
        let (data, diff_id) = gzip_layer(data)?;
        let layer = ImageLayer::new(
            data,
            OCI_MEDIA_TYPE.to_string(),
            Some(layer_annotations.into_map()),
        );
        let config = Config::oci_v1(image_config(platform, &diff_id)?, None);
        let manifest = OciImageManifest::build(
            std::slice::from_ref(&layer),
            &config,
            Some(manifest_annotations.into_map()),
        );
        let (digest, size) = manifest_digest(&manifest)?;

        Ok(Self {
            layer,
            config,
            manifest,
            digest,
            size,
        })
    }

    /// Read an archive file from disk and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(
        path: &Path,
        platform: Option<&Platform>,
        layer_annotations: Annotations,
        manifest_annotations: Annotations,
    ) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::ReadArchive {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), size = data.len(), "Read archive");
        Self::new(data, platform, layer_annotations, manifest_annotations)
    }
}

/// Gzip-compress `data` unless it already is, returning the layer bytes and
/// the `sha256:` digest of the uncompressed tar.
fn gzip_layer(data: Vec<u8>) -> Result<(Vec<u8>, String)> {
    if data.starts_with(&GZIP_MAGIC) {
        let mut hasher = Sha256::new();
        io::copy(&mut GzDecoder::new(data.as_slice()), &mut hasher)?;
        let diff_id = format!("sha256:{:x}", hasher.finalize());
        return Ok((data, diff_id));
    }

    let diff_id = format!("sha256:{:x}", Sha256::digest(&data));
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(&data)?;
    Ok((encoder.finish()?, diff_id))
}

fn image_config(platform: Option<&Platform>, diff_id: &str) -> Result<Vec<u8>> {
    let (os, arch) = platform.map_or(("", ""), |p| (p.os.as_str(), p.arch.as_str()));
    let config = serde_json::json!({
        "architecture": arch,
        "os": os,
        "rootfs": {
            "type": "layers",
            "diff_ids": [diff_id],
        },
    });
    Ok(serde_json::to_vec(&config)?)
}

/// Compute the digest the registry will assign to a pushed manifest.
///
/// The client serializes manifests with `serde_json::to_vec`, so hashing the
/// same serialization yields the same digest.
fn manifest_digest(manifest: &OciImageManifest) -> Result<(String, i64)> {
    let body = serde_json::to_vec(manifest)?;
    let digest = format!("sha256:{:x}", Sha256::digest(&body));
    let size = i64::try_from(body.len()).unwrap_or(i64::MAX);
    Ok((digest, size))
}

/// Accumulates index entries for pushed images.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    annotations: Annotations,
    entries: Vec<ImageIndexEntry>,
}

impl IndexBuilder {
    /// Start an index with the given index-level annotations.
    #[must_use]
    pub fn new(annotations: Annotations) -> Self {
        Self {
            annotations,
            entries: Vec::new(),
        }
    }

    /// Append an entry for `image`, optionally with a platform descriptor.
    pub fn push(&mut self, image: &ArchiveImage, platform: Option<&Platform>) {
        self.entries.push(ImageIndexEntry {
            media_type: OCI_IMAGE_MEDIA_TYPE.to_string(),
            digest: image.digest.clone(),
            size: image.size,
            platform: platform.map(Platform::to_descriptor),
            annotations: None,
        });
    }

    /// Number of entries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish the index.
    #[must_use]
    pub fn build(self) -> OciImageIndex {
        OciImageIndex {
            schema_version: 2,
            media_type: Some(OCI_INDEX_MEDIA_TYPE.to_string()),
            manifests: self.entries,
            annotations: Some(self.annotations.into_map()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{REF_NAME, TITLE};
    use std::io::Read;

    fn image(data: &[u8]) -> ArchiveImage {
        ArchiveImage::new(
            data.to_vec(),
            None,
            Annotations::layer("tool.tar.gz"),
            Annotations::new().with(TITLE, "tool"),
        )
        .unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    fn config_json(img: &ArchiveImage) -> serde_json::Value {
        serde_json::from_slice(&img.config.data).unwrap()
    }

    #[test]
    fn test_archive_image_single_layer() {
        let img = image(b"archive bytes");
        assert_eq!(img.manifest.layers.len(), 1);
        assert_eq!(img.manifest.layers[0].media_type, OCI_MEDIA_TYPE);
        assert_eq!(img.layer.media_type, OCI_MEDIA_TYPE);
    }

    #[test]
    fn test_archive_image_keeps_gzip_verbatim() {
        let compressed = gzip(b"tar bytes");
        let img = image(&compressed);
        assert_eq!(img.layer.data, compressed);
    }

    #[test]
    fn test_archive_image_compresses_plain_tar() {
        let img = image(b"plain tar bytes");
        assert!(img.layer.data.starts_with(&GZIP_MAGIC));
        assert_eq!(gunzip(&img.layer.data), b"plain tar bytes".to_vec());
    }

    #[test]
    fn test_archive_image_rejects_corrupt_gzip() {
        let mut corrupt = GZIP_MAGIC.to_vec();
        corrupt.extend_from_slice(b"not really gzip");
        let result = ArchiveImage::new(corrupt, None, Annotations::new(), Annotations::new());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_archive_image_config_records_platform() {
        let platform = Platform::new("linux", "arm64");
        let img = ArchiveImage::new(
            gzip(b"tar bytes"),
            Some(&platform),
            Annotations::new(),
            Annotations::new(),
        )
        .unwrap();

        let config = config_json(&img);
        assert_eq!(config["os"], "linux");
        assert_eq!(config["architecture"], "arm64");
        assert_eq!(config["rootfs"]["type"], "layers");
        assert_eq!(img.config.media_type, "application/vnd.oci.image.config.v1+json");
    }

    #[test]
    fn test_archive_image_diff_id_is_uncompressed_digest() {
        let expected = format!("sha256:{:x}", Sha256::digest(b"tar bytes"));
        for img in [image(b"tar bytes"), image(&gzip(b"tar bytes"))] {
            let config = config_json(&img);
            assert_eq!(config["rootfs"]["diff_ids"], serde_json::json!([expected]));
            assert_eq!(config["os"], "");
            assert_eq!(config["architecture"], "");
        }
    }

    #[test]
    fn test_archive_image_digest_format() {
        let img = image(b"archive bytes");
        assert!(img.digest.starts_with("sha256:"));
        assert_eq!(img.digest.len(), 7 + 64);
        assert!(img.size > 0);
    }

    #[test]
    fn test_archive_image_digest_depends_on_content() {
        assert_ne!(image(b"one").digest, image(b"two").digest);
        assert_eq!(image(b"same").digest, image(b"same").digest);
    }

    #[test]
    fn test_archive_image_from_missing_file() {
        let result = ArchiveImage::from_file(
            Path::new("/nonexistent/tool.tar.gz"),
            None,
            Annotations::new(),
            Annotations::new(),
        );
        assert!(matches!(result, Err(Error::ReadArchive { .. })));
    }

    #[test]
    fn test_archive_image_debug_omits_payload() {
        let img = image(b"archive bytes");
        let debug = format!("{img:?}");
        assert!(debug.contains(&img.digest));
        assert!(!debug.contains("data"));
    }

    #[test]
    fn test_index_builder_entries_in_order() {
        let mut builder = IndexBuilder::new(Annotations::new().with(REF_NAME, "v1.0.0"));
        let linux = image(b"linux");
        let darwin = image(b"darwin");
        builder.push(&linux, Some(&Platform::new("linux", "amd64")));
        builder.push(&darwin, Some(&Platform::new("darwin", "arm64")));
        assert_eq!(builder.len(), 2);

        let index = builder.build();
        assert_eq!(index.schema_version, 2);
        assert_eq!(index.media_type.as_deref(), Some(OCI_INDEX_MEDIA_TYPE));
        assert_eq!(index.manifests[0].digest, linux.digest);
        assert_eq!(index.manifests[1].digest, darwin.digest);
        let platform = index.manifests[1].platform.as_ref().unwrap();
        assert_eq!(platform.os, "darwin");
        assert_eq!(platform.architecture, "arm64");
        assert_eq!(
            index
                .annotations
                .as_ref()
                .and_then(|a| a.get(REF_NAME))
                .map(String::as_str),
            Some("v1.0.0")
        );
    }

    #[test]
    fn test_index_builder_without_platform() {
        let mut builder = IndexBuilder::new(Annotations::new());
        assert!(builder.is_empty());
        builder.push(&image(b"single"), None);
        let index = builder.build();
        assert_eq!(index.manifests.len(), 1);
        assert!(index.manifests[0].platform.is_none());
        assert_eq!(index.manifests[0].media_type, OCI_IMAGE_MEDIA_TYPE);
    }
}
