//! Strictly validated registry references.
//!
//! `oci-distribution` happily fills in defaults (`docker.io`, `library/`,
//! `latest`). Release artifacts must always name their registry and tag, so
//! references are checked for both before they are handed to the parser.

use oci_distribution::Reference;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Maximum tag length allowed by the distribution spec.
const MAX_TAG_LEN: usize = 128;

/// A fully qualified `registry/repository:tag` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReference {
    inner: Reference,
    tag: String,
}

impl RegistryReference {
    /// Parse a reference, rejecting anything that relies on defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] when the registry host or tag is
    /// missing, a digest is given, the tag has invalid characters, or the
    /// repository fails to parse.
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains('@') {
            return Err(Error::invalid_reference(
                input,
                "digest references are not supported, use a tag",
            ));
        }

        let (name, tag) = match input.rsplit_once(':') {
            Some((name, tag)) if !tag.contains('/') => (name, tag),
            _ => return Err(Error::invalid_reference(input, "missing tag")),
        };
        validate_tag(input, tag)?;

        let registry = match name.split_once('/') {
            Some((registry, repository)) if !repository.is_empty() => registry,
            _ => {
                return Err(Error::invalid_reference(
                    input,
                    "missing registry or repository",
                ));
            }
        };
        if !is_registry_host(registry) {
            return Err(Error::invalid_reference(
                input,
                format!("'{registry}' is not a registry host"),
            ));
        }

        let inner: Reference = input.parse().map_err(|e: oci_distribution::ParseError| {
            Error::invalid_reference(input, e.to_string())
        })?;

        Ok(Self {
            inner,
            tag: tag.to_string(),
        })
    }

    /// Registry host, including any port.
    #[must_use]
    pub fn registry(&self) -> &str {
        self.inner.registry()
    }

    /// Repository path within the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.inner.repository()
    }

    /// The tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The underlying client reference.
    #[must_use]
    pub fn as_reference(&self) -> &Reference {
        &self.inner
    }
}

impl FromStr for RegistryReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RegistryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry(), self.repository(), self.tag)
    }
}

/// A first path component names a registry only if it looks like a host.
fn is_registry_host(component: &str) -> bool {
    component == "localhost" || component.contains('.') || component.contains(':')
}

fn validate_tag(input: &str, tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid_first = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid_first || !valid_rest || tag.len() > MAX_TAG_LEN {
        return Err(Error::invalid_reference(
            input,
            format!("'{tag}' is not a valid tag"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fully_qualified() {
        let r = RegistryReference::parse("ghcr.io/compliance-framework/plugin-local-ssh:v1.0.0")
            .unwrap();
        assert_eq!(r.registry(), "ghcr.io");
        assert_eq!(r.repository(), "compliance-framework/plugin-local-ssh");
        assert_eq!(r.tag(), "v1.0.0");
        assert_eq!(
            r.to_string(),
            "ghcr.io/compliance-framework/plugin-local-ssh:v1.0.0"
        );
    }

    #[test]
    fn test_parse_with_port() {
        let r = RegistryReference::parse("localhost:5000/myimage:v1").unwrap();
        assert_eq!(r.registry(), "localhost:5000");
        assert_eq!(r.repository(), "myimage");
        assert_eq!(r.tag(), "v1");
    }

    #[test]
    fn test_parse_localhost_without_port() {
        let r = RegistryReference::parse("localhost/releases/tool:1.2.3").unwrap();
        assert_eq!(r.registry(), "localhost");
        assert_eq!(r.repository(), "releases/tool");
    }

    #[test]
    fn test_missing_tag_rejected() {
        assert!(RegistryReference::parse("ghcr.io/org/repo").is_err());
        assert!(RegistryReference::parse("localhost:5000/repo").is_err());
    }

    #[test]
    fn test_missing_registry_rejected() {
        assert!(RegistryReference::parse("invalid/invalid").is_err());
        assert!(RegistryReference::parse("org/repo:v1").is_err());
        assert!(RegistryReference::parse("nginx:latest").is_err());
    }

    #[test]
    fn test_digest_rejected() {
        let digest = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert!(RegistryReference::parse(&format!("ghcr.io/org/repo@{digest}")).is_err());
    }

    #[test]
    fn test_invalid_tag_rejected() {
        assert!(RegistryReference::parse("ghcr.io/org/repo:").is_err());
        assert!(RegistryReference::parse("ghcr.io/org/repo:.hidden").is_err());
        assert!(RegistryReference::parse("ghcr.io/org/repo:v1+build").is_err());
        let long = "a".repeat(MAX_TAG_LEN + 1);
        assert!(RegistryReference::parse(&format!("ghcr.io/org/repo:{long}")).is_err());
    }

    #[test]
    fn test_uppercase_repository_rejected() {
        assert!(RegistryReference::parse("ghcr.io/Org/Repo:v1").is_err());
    }

    #[test]
    fn test_from_str() {
        let r: RegistryReference = "registry.example.com/org/repo:v2.0.0".parse().unwrap();
        assert_eq!(r.registry(), "registry.example.com");
        assert_eq!(r.tag(), "v2.0.0");
    }
}
