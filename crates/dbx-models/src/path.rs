//! Logical paths and remote-store targets.
//!
//! A logical path is what callers hand to the storage bridge
//! (`dropbox://styles/thumbnail/public/photo.jpg`). Stripping the scheme
//! yields the [`Target`], the coordinate the remote store understands once
//! the configured prefix is applied.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the scheme and the target of a logical path.
pub const SCHEME_SEPARATOR: &str = "://";

/// Result type for path parsing.
pub type PathResult<T> = Result<T, PathError>;

/// Errors produced while turning a logical path into a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path has an empty target: {0:?}")]
    EmptyTarget(String),
}

/// Caller-facing path, including the scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPath {
    uri: String,
    scheme: String,
    target: String,
}

impl LogicalPath {
    /// Parse a logical path. A path without `://` has an empty scheme.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let (scheme, rest) = match uri.split_once(SCHEME_SEPARATOR) {
            Some((scheme, rest)) => (scheme.to_string(), rest),
            None => (String::new(), uri.as_str()),
        };
        let target = normalize(rest);

        Self {
            uri,
            scheme,
            target,
        }
    }

    /// The path exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The normalized target text, which may be empty.
    pub fn target_str(&self) -> &str {
        &self.target
    }

    /// The remote-store target. Fails when nothing follows the scheme.
    pub fn target(&self) -> PathResult<Target> {
        Target::new(self.target.as_str()).map_err(|_| PathError::EmptyTarget(self.uri.clone()))
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl From<&str> for LogicalPath {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for LogicalPath {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// A logical path with its scheme removed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target(String);

impl Target {
    /// Normalize and validate a target.
    pub fn new(target: impl AsRef<str>) -> PathResult<Self> {
        let raw = target.as_ref();
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(PathError::EmptyTarget(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slash-separated segments of the target.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Absolute remote path for this target below `prefix`.
    pub fn remote_path(&self, prefix: &str) -> String {
        apply_prefix(prefix, &self.0)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Target {
    type Error = PathError;

    fn try_from(value: String) -> PathResult<Self> {
        Self::new(value)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.0
    }
}

/// Join `prefix` and `path` into an absolute remote path.
///
/// Empty components are dropped; the root itself is the empty string,
/// which is how the Dropbox API addresses it.
pub fn apply_prefix(prefix: &str, path: &str) -> String {
    let parts: Vec<&str> = [prefix, path]
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("/{}", parts.join("/"))
    }
}

fn normalize(raw: &str) -> String {
    raw.replace('\\', "/").trim_matches('/').to_string()
}
