//! OCI registry transport for ocirel release archives.
//!
//! This crate provides functionality to:
//! - Push per-platform archives as single-layer images plus a multi-platform index
//! - Pull an image and extract its layers onto the filesystem
//! - Resolve registry credentials from docker config files or the environment
//!
//! # Example
//!
//! ```ignore
//! use ocirel_oci::{Keychain, OciClient, RegistryReference, Uploader};
//! use std::sync::Arc;
//!
//! let client = OciClient::new(Arc::new(Keychain::default_chain()));
//! let reference = RegistryReference::parse("ghcr.io/acme/tool:v1.0.0")?;
//!
//! let report = Uploader::new(&client)
//!     .upload_release(&reference, "dist".as_ref())
//!     .await?;
//! ```

#![warn(missing_docs)]

pub mod annotations;
mod auth;
mod client;
mod download;
mod error;
mod extract;
mod image;
mod platform;
mod reference;
mod registry;
mod upload;

pub use annotations::Annotations;
pub use auth::{
    Anonymous, CredentialProvider, Credentials, DockerConfig, EnvToken, Keychain,
    StaticCredentials, registry_auth,
};
pub use client::{OciClient, RegistryConfig};
pub use download::{DownloadReport, Downloader};
pub use error::{Error, Result};
pub use extract::{DIR_MODE, ExtractSummary, unpack};
pub use image::{ArchiveImage, IndexBuilder};
pub use platform::{Platform, current_platform};
pub use reference::RegistryReference;
pub use registry::{PulledLayer, Registry};
pub use upload::{UploadReport, Uploader};

/// Media type for OCI image layers (gzip compressed tar).
pub const OCI_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

/// Media type for uncompressed OCI image layers.
pub const OCI_TAR_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar";

/// Media type for Docker v2 gzip layers.
pub const DOCKER_GZIP_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// Media type for OCI image manifests.
pub const OCI_IMAGE_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type for OCI image indexes.
pub const OCI_INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
