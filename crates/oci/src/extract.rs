//! Unpacking image layers onto the filesystem.
//!
//! Layers are tar streams. Directories and regular files are recreated under
//! the destination; every other entry type is skipped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, trace};

use crate::{Error, Result};

/// Mode for directories created during extraction.
pub const DIR_MODE: u32 = 0o755;

/// Counts of what an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written.
    pub files: usize,
    /// Directories created (existing ones are not counted).
    pub directories: usize,
    /// Entries skipped (links, devices, empty names).
    pub skipped: usize,
}

impl std::ops::AddAssign for ExtractSummary {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.directories += other.directories;
        self.skipped += other.skipped;
    }
}

/// Extract a decompressed tar stream into `destination`.
///
/// Existing directories are left alone; existing files are truncated and
/// rewritten. Each file is closed before the next entry is read. The first
/// I/O error aborts the extraction.
///
/// # Errors
///
/// Returns [`Error::UnsafeEntryPath`] for entries that would land outside
/// `destination`, and [`Error::Extract`] or [`Error::Io`] for filesystem and
/// tar read failures.
pub fn unpack<R: Read>(destination: &Path, reader: R) -> Result<ExtractSummary> {
    let mut archive = Archive::new(reader);
    let mut summary = ExtractSummary::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();

        let Some(relative) = sanitize(&entry_path)? else {
            trace!(path = %entry_path.display(), "Skipping entry with empty path");
            summary.skipped += 1;
            continue;
        };
        let target = destination.join(relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                if !target.exists() {
                    create_dir_all(&target)?;
                    summary.directories += 1;
                }
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    create_dir_all(parent)?;
                }
                let mode = entry.header().mode().unwrap_or(0o644);
                let mut file = create_file(&target, mode)?;
                io::copy(&mut entry, &mut file).map_err(|e| Error::extract(&target, e))?;
                // Close now rather than at the end of the stream.
                drop(file);
                set_mode(&target, mode)?;
                trace!(path = %target.display(), mode = %format!("{mode:o}"), "Extracted file");
                summary.files += 1;
            }
            other => {
                trace!(path = %entry_path.display(), entry_type = ?other, "Skipping entry");
                summary.skipped += 1;
            }
        }
    }

    debug!(
        destination = %destination.display(),
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped,
        "Extracted tar stream"
    );
    Ok(summary)
}

/// Strip `.` components and reject paths that could escape the destination.
///
/// Returns `None` when nothing is left (e.g. the `./` root entry).
fn sanitize(path: &Path) -> Result<Option<PathBuf>> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafeEntryPath {
                    path: path.to_path_buf(),
                });
            }
        }
    }
    Ok((!clean.as_os_str().is_empty()).then_some(clean))
}

fn create_dir_all(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path).map_err(|e| Error::extract(path, e))
}

fn create_file(path: &Path, mode: u32) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path).map_err(|e| Error::extract(path, e))
}

/// Apply header permission bits; creation mode alone is filtered by the umask
/// and ignored for files that already existed.
#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| Error::extract(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
