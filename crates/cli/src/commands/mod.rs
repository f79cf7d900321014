//! Command implementations.
//!
//! Each command first validates its raw arguments into a typed config (paths
//! resolved against the working directory, references strictly parsed) and
//! only then touches the network or the credential store.

pub mod download;
pub mod login;
pub mod upload;

use ocirel_oci::{Keychain, OciClient, RegistryConfig, RegistryReference};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

use crate::cli::{CliError, Commands};

/// Settings shared by every registry command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Registries to reach over plain HTTP.
    pub insecure_registries: Vec<String>,
}

impl GlobalOptions {
    /// Build a registry client using the default credential chain.
    #[must_use]
    pub fn client(&self) -> OciClient {
        let config = RegistryConfig {
            insecure_registries: self.insecure_registries.clone(),
        };
        OciClient::with_config(&config, Arc::new(Keychain::default_chain()))
    }
}

/// Run a parsed subcommand to completion.
///
/// # Errors
///
/// Returns the first validation, credential or registry error.
pub async fn execute(command: Commands, options: &GlobalOptions) -> Result<(), CliError> {
    let span = crate::command_span!(command.name());

    async move {
        match command {
            Commands::Upload { source, reference } => {
                let config = upload::UploadConfig::from_args(&source, &reference)?;
                upload::execute_upload(&config, &options.client()).await?;
            }
            Commands::UploadSingle { archive, reference } => {
                let config = upload::UploadSingleConfig::from_args(&archive, &reference)?;
                upload::execute_upload_single(&config, &options.client()).await?;
            }
            Commands::Download {
                reference,
                destination,
            } => {
                let config = download::DownloadConfig::from_args(&reference, &destination)?;
                download::execute_download(&config, &options.client()).await?;
            }
            Commands::Login {
                registry,
                username,
                password,
                password_stdin,
            } => {
                let config = login::LoginConfig::from_args(
                    &registry,
                    &username,
                    password,
                    password_stdin,
                    std::io::stdin().lock(),
                )?;
                login::execute_login(&config, &ocirel_oci::DockerConfig::from_env())?;
            }
            Commands::Logout { registry } => {
                login::execute_logout(&registry, &ocirel_oci::DockerConfig::from_env())?;
            }
        }
        Ok(())
    }
    .instrument(span)
    .await
}

/// Resolve `path` against the current working directory unless it is absolute,
/// then fold away `.` and `..` components.
///
/// # Errors
///
/// Returns [`CliError::WorkingDirectory`] if the working directory is unavailable.
pub fn absolute_path(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|source| CliError::WorkingDirectory { source })?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexical cleanup; symlinks are not resolved and `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve `path` and require an existing directory.
///
/// # Errors
///
/// Fails if the path does not exist or is not a directory.
pub fn existing_dir(path: &Path) -> Result<PathBuf, CliError> {
    let path = absolute_path(path)?;
    if !path.exists() {
        return Err(CliError::PathNotFound { path });
    }
    if !path.is_dir() {
        return Err(CliError::NotADirectory { path });
    }
    Ok(path)
}

/// Resolve `path` and require an existing regular file.
///
/// # Errors
///
/// Fails if the path does not exist or is not a file.
pub fn existing_file(path: &Path) -> Result<PathBuf, CliError> {
    let path = absolute_path(path)?;
    if !path.exists() {
        return Err(CliError::PathNotFound { path });
    }
    if !path.is_file() {
        return Err(CliError::NotAFile { path });
    }
    Ok(path)
}

/// Strictly parse a registry reference.
///
/// # Errors
///
/// Returns the parser's invalid reference error.
pub fn parse_reference(reference: &str) -> Result<RegistryReference, CliError> {
    Ok(RegistryReference::parse(reference)?)
}
