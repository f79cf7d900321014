//! Release sidecar metadata for ocirel.
//!
//! A release tool such as GoReleaser writes two JSON files next to the
//! archives it produces:
//!
//! - `metadata.json` - project name, tag, version, commit and build date
//! - `artifacts.json` - every produced file with its platform and type
//!
//! This crate reads both and exposes the archive subset that gets uploaded.
//!
//! # Example
//!
//! ```ignore
//! use ocirel_metadata::ReleaseData;
//!
//! let data = ReleaseData::load(Path::new("/work/dist"))?;
//! for archive in data.archives() {
//!     println!("{} {}/{}", archive.name, archive.os, archive.arch);
//! }
//! ```

#![warn(missing_docs)]

mod artifact;
mod error;
mod release;

pub use artifact::{Artifact, ArtifactKind};
pub use error::{Error, Result};
pub use release::{ARTIFACTS_FILE, METADATA_FILE, ReleaseData, ReleaseMetadata};
