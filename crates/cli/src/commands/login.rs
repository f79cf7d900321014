//! `login` and `logout`

use ocirel_oci::{Credentials, DockerConfig};
use std::io::Read;
use tracing::{info, warn};

use crate::cli::CliError;

/// Validated arguments for `login`.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Registry host.
    pub registry: String,
    /// Credentials to store.
    pub credentials: Credentials,
}

impl LoginConfig {
    /// Validate raw arguments, reading the password from `stdin` when asked.
    ///
    /// One trailing newline is stripped from a password read from stdin.
    ///
    /// # Errors
    ///
    /// Fails if the registry or username is empty, no password source is
    /// given, or stdin cannot be read.
    pub fn from_args(
        registry: &str,
        username: &str,
        password: Option<String>,
        password_stdin: bool,
        mut stdin: impl Read,
    ) -> Result<Self, CliError> {
        let registry = registry.trim();
        if registry.is_empty() {
            return Err(CliError::argument("registry must not be empty"));
        }
        if username.is_empty() {
            return Err(CliError::argument("username must not be empty"));
        }

        let password = match (password, password_stdin) {
            (Some(password), _) => password,
            (None, true) => {
                let mut buf = String::new();
                stdin
                    .read_to_string(&mut buf)
                    .map_err(|e| CliError::argument(format!("failed to read password from stdin: {e}")))?;
                let trimmed = buf.strip_suffix('\n').unwrap_or(&buf);
                trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string()
            }
            (None, false) => {
                return Err(CliError::argument_with_help(
                    "no password given",
                    "Pass --password or pipe it with --password-stdin",
                ));
            }
        };
        if password.is_empty() {
            return Err(CliError::argument("password must not be empty"));
        }

        Ok(Self {
            registry: registry.to_string(),
            credentials: Credentials::new(username, password),
        })
    }
}

/// Store credentials for a registry.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
pub fn execute_login(config: &LoginConfig, store: &DockerConfig) -> Result<(), CliError> {
    store.login(&config.registry, &config.credentials)?;
    info!(
        registry = %config.registry,
        username = %config.credentials.username,
        path = %store.path().display(),
        "Login succeeded"
    );
    Ok(())
}

/// Remove stored credentials for a registry.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or rewritten.
pub fn execute_logout(registry: &str, store: &DockerConfig) -> Result<bool, CliError> {
    let removed = store.logout(registry)?;
    if removed {
        info!(%registry, path = %store.path().display(), "Logged out");
    } else {
        warn!(%registry, "Not logged in");
    }
    Ok(removed)
}
