//! Publishing release archives as a multi-platform image index.

use chrono::{DateTime, Utc};
use ocirel_metadata::{Artifact, ReleaseData};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::annotations::{Annotations, DESCRIPTION};
use crate::image::{ArchiveImage, IndexBuilder};
use crate::platform::Platform;
use crate::reference::RegistryReference;
use crate::registry::Registry;
use crate::Result;

/// What an upload pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// The reference the index was pushed under.
    pub reference: String,
    /// Manifest digests of the pushed images, in push order.
    pub image_digests: Vec<String>,
}

/// Pushes release archives through a [`Registry`].
pub struct Uploader<'a, R: Registry + ?Sized> {
    registry: &'a R,
    created: DateTime<Utc>,
}

impl<'a, R: Registry + ?Sized> Uploader<'a, R> {
    /// Create an uploader stamping artifacts with the current time.
    #[must_use]
    pub fn new(registry: &'a R) -> Self {
        Self {
            registry,
            created: Utc::now(),
        }
    }

    /// Override the `created` timestamp.
    #[must_use]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Upload every archive listed in the sidecars of `source_dir`.
    ///
    /// One image per archive is pushed under `reference`, then an index
    /// referencing all of them replaces it. Pushes stop at the first failure;
    /// images already pushed are left in place and no index is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecars cannot be loaded, an archive cannot be
    /// read, or any push fails.
    pub async fn upload_release(
        &self,
        reference: &RegistryReference,
        source_dir: &Path,
    ) -> Result<UploadReport> {
        let data = ReleaseData::load(source_dir)?;
        let metadata = &data.metadata;

        info!(
            %reference,
            project = %metadata.project_name,
            archives = data.archive_count(),
            "Uploading release"
        );

        let manifest_annotations =
            Annotations::release(self.created, &metadata.project_name, reference.tag());
        let mut index = IndexBuilder::new(
            manifest_annotations
                .clone()
                .with(DESCRIPTION, metadata.description.as_str()),
        );
        let mut image_digests = Vec::new();

        for archive in data.archives() {
            let path = archive_path(archive, source_dir);
            let platform = Platform::from_artifact(archive);
            debug!(name = %archive.name, %platform, path = %path.display(), "Packaging archive");

            let image = ArchiveImage::from_file(
                &path,
                Some(&platform),
                Annotations::layer(&archive.name),
                manifest_annotations.clone(),
            )?;

            self.registry.push_image(reference, &image).await?;
            info!(name = %archive.name, %platform, digest = %image.digest, "Pushed platform image");

            index.push(&image, Some(&platform));
            image_digests.push(image.digest);
        }

        self.registry.push_index(reference, &index.build()).await?;
        info!(%reference, images = image_digests.len(), "Release uploaded");

        Ok(UploadReport {
            reference: reference.to_string(),
            image_digests,
        })
    }

    /// Upload one archive without sidecar metadata.
    ///
    /// The file name is used as the title. The image config and the single
    /// index entry carry no platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or either push fails.
    pub async fn upload_single(
        &self,
        reference: &RegistryReference,
        archive: &Path,
    ) -> Result<UploadReport> {
        let title = archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(%reference, archive = %archive.display(), "Uploading single archive");

        let annotations = Annotations::release(self.created, &title, reference.tag());
        let image = ArchiveImage::from_file(
            archive,
            None,
            Annotations::layer(&title),
            annotations.clone(),
        )?;

        self.registry.push_image(reference, &image).await?;

        let mut index = IndexBuilder::new(annotations);
        index.push(&image, None);
        self.registry.push_index(reference, &index.build()).await?;
        info!(%reference, digest = %image.digest, "Archive uploaded");

        Ok(UploadReport {
            reference: reference.to_string(),
            image_digests: vec![image.digest],
        })
    }
}

/// Locate an archive on disk.
///
/// Paths are relative to the release directory. GoReleaser records them
/// relative to the project root instead (`dist/tool.tar.gz`), so the working
/// directory is tried when the first candidate does not exist.
fn archive_path(artifact: &Artifact, source_dir: &Path) -> PathBuf {
    let path = artifact.resolve_path(source_dir);
    if path.exists() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) if cwd.join(&artifact.path).exists() => cwd.join(&artifact.path),
        _ => path,
    }
}
