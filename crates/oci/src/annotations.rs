//! Standard OCI annotation keys and the sets written on upload.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Creation time of the artifact.
pub const CREATED: &str = "org.opencontainers.image.created";
/// Human-readable title.
pub const TITLE: &str = "org.opencontainers.image.title";
/// Human-readable description.
pub const DESCRIPTION: &str = "org.opencontainers.image.description";
/// Name of the reference (the tag for indexes, the file name for layers).
pub const REF_NAME: &str = "org.opencontainers.image.ref.name";
/// Version of the packaged software.
pub const VERSION: &str = "org.opencontainers.image.version";

/// Format a timestamp the way `created` annotations expect: UTC, seconds precision.
#[must_use]
pub fn format_created(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Ordered annotation map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    /// Start an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an annotation.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Annotations shared by release indexes and images: created, title, ref name and version.
    ///
    /// Ref name and version are both the tag the artifact is pushed under.
    #[must_use]
    pub fn release(created: DateTime<Utc>, title: &str, tag: &str) -> Self {
        Self::new()
            .with(CREATED, format_created(created))
            .with(TITLE, title)
            .with(REF_NAME, tag)
            .with(VERSION, tag)
    }

    /// Annotations for a single archive layer.
    #[must_use]
    pub fn layer(file_name: &str) -> Self {
        Self::new().with(REF_NAME, file_name).with(TITLE, file_name)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Convert into whichever map type the client expects.
    #[must_use]
    pub fn into_map<M: FromIterator<(String, String)>>(self) -> M {
        self.0.into_iter().collect()
    }
}
