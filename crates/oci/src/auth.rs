//! Registry credentials.
//!
//! Credentials are always handed to the client explicitly through a
//! [`CredentialProvider`]. The default [`Keychain`] reads the Docker config
//! file written by `docker login` (and by `ocirel login`), then falls back to
//! GitHub tokens for `ghcr.io`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use oci_distribution::secrets::RegistryAuth;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Legacy key Docker uses for Docker Hub credentials.
const DOCKER_HUB_LEGACY_KEY: &str = "https://index.docker.io/v1/";

/// Username and password (or token) for a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registry username.
    pub username: String,
    /// Registry password or access token.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Converts resolved credentials into client auth, anonymous when absent.
#[must_use]
pub fn registry_auth(credentials: Option<Credentials>) -> RegistryAuth {
    match credentials {
        Some(c) => RegistryAuth::Basic(c.username, c.password),
        None => RegistryAuth::Anonymous,
    }
}

/// Source of credentials for a registry host.
pub trait CredentialProvider: Send + Sync {
    /// Look up credentials for `registry` (host with optional port).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store exists but cannot be read.
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>> {
        (**self).resolve(registry)
    }
}

/// Never returns credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn resolve(&self, _registry: &str) -> Result<Option<Credentials>> {
        Ok(None)
    }
}

/// Returns the same credentials for every registry.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
    fn resolve(&self, _registry: &str) -> Result<Option<Credentials>> {
        Ok(Some(self.0.clone()))
    }
}

/// `GITHUB_TOKEN` / `GH_TOKEN` for `ghcr.io`, with `GITHUB_ACTOR` as the username.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvToken;

impl CredentialProvider for EnvToken {
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>> {
        if registry != "ghcr.io" {
            return Ok(None);
        }
        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());
        let username = std::env::var("GITHUB_ACTOR").unwrap_or_else(|_| "token".to_string());
        Ok(token.map(|t| Credentials::new(username, t)))
    }
}

/// Ordered list of providers; the first one that returns credentials wins.
#[derive(Clone)]
pub struct Keychain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl Keychain {
    /// An empty chain (always anonymous).
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Append a provider to the chain.
    #[must_use]
    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Docker config file, then GitHub environment tokens.
    #[must_use]
    pub fn default_chain() -> Self {
        Self::new().with(DockerConfig::from_env()).with(EnvToken)
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::default_chain()
    }
}

impl CredentialProvider for Keychain {
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>> {
        for provider in &self.providers {
            if let Some(credentials) = provider.resolve(registry)? {
                return Ok(Some(credentials));
            }
        }
        trace!(%registry, "No credentials found, using anonymous access");
        Ok(None)
    }
}

/// The Docker CLI config file (`config.json`).
///
/// Only inline `auths` entries are supported; credential helpers are not
/// executed.
#[derive(Debug, Clone)]
pub struct DockerConfig {
    path: PathBuf,
}

impl DockerConfig {
    /// Use the config file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the config file the way the Docker CLI does: `$DOCKER_CONFIG/config.json`,
    /// else `~/.docker/config.json`.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var_os("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".docker")
            });
        Self::new(dir.join("config.json"))
    }

    /// Path of the config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store credentials for `registry`, keeping every other key in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a JSON object, or if it
    /// cannot be written.
    pub fn login(&self, registry: &str, credentials: &Credentials) -> Result<()> {
        let mut root = self.read()?;
        let auths = auths_mut(&mut root)?;

        let encoded = STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));
        let mut entry = Map::new();
        entry.insert("auth".to_string(), Value::String(encoded));
        auths.insert(registry_key(registry).to_string(), Value::Object(entry));

        self.write(&root)?;
        debug!(%registry, path = %self.path.display(), "Stored registry credentials");
        Ok(())
    }

    /// Remove stored credentials for `registry`.
    ///
    /// Returns whether an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or rewritten.
    pub fn logout(&self, registry: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut root = self.read()?;
        let auths = auths_mut(&mut root)?;

        let removed = auths.remove(registry_key(registry)).is_some()
            | auths.remove(registry).is_some();
        if removed {
            self.write(&root)?;
            debug!(%registry, path = %self.path.display(), "Removed registry credentials");
        }
        Ok(removed)
    }

    fn read(&self) -> Result<Map<String, Value>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::credentials(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write(&self, root: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(root)?;
        std::fs::write(&self.path, content)?;
        set_owner_only(&self.path)
    }
}

impl CredentialProvider for DockerConfig {
    fn resolve(&self, registry: &str) -> Result<Option<Credentials>> {
        let root = self.read()?;
        let Some(Value::Object(auths)) = root.get("auths") else {
            return Ok(None);
        };

        let entry = auths
            .get(registry)
            .or_else(|| auths.get(registry_key(registry)))
            .or_else(|| auths.get(&format!("https://{registry}")));
        let Some(Value::Object(entry)) = entry else {
            return Ok(None);
        };

        // An empty `auth` counts as absent.
        let auth = match entry.get("auth") {
            Some(Value::String(auth)) => auth.trim(),
            _ => "",
        };
        if !auth.is_empty() {
            let decoded = STANDARD
                .decode(auth)
                .map_err(|e| Error::credentials(format!("invalid auth for {registry}: {e}")))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|e| Error::credentials(format!("invalid auth for {registry}: {e}")))?;
            let Some((username, password)) = decoded.split_once(':') else {
                return Err(Error::credentials(format!(
                    "auth for {registry} is not user:password"
                )));
            };
            return Ok(Some(Credentials::new(username, password)));
        }

        match (entry.get("username"), entry.get("password")) {
            (Some(Value::String(username)), Some(Value::String(password))) => {
                Ok(Some(Credentials::new(username, password)))
            }
            _ => Ok(None),
        }
    }
}

/// Key under which credentials for `registry` are stored.
fn registry_key(registry: &str) -> &str {
    match registry {
        "docker.io" | "index.docker.io" | "registry-1.docker.io" => DOCKER_HUB_LEGACY_KEY,
        other => other,
    }
}

fn auths_mut(root: &mut Map<String, Value>) -> Result<&mut Map<String, Value>> {
    let auths = root
        .entry("auths")
        .or_insert_with(|| Value::Object(Map::new()));
    match auths {
        Value::Object(map) => Ok(map),
        _ => Err(Error::credentials("\"auths\" is not a JSON object")),
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}
