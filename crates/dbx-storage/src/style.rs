//! Image style registry and path tokens.
//!
//! A derived image is only generated when the request carries a valid
//! `itok` token, so the derivation endpoint cannot be used to create
//! arbitrary derivatives.

use std::collections::BTreeSet;
use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{StorageError, StorageResult};

/// Query parameter carrying the path token.
pub const TOKEN_QUERY_PARAM: &str = "itok";

/// Number of characters kept from the encoded HMAC.
pub const PATH_TOKEN_LEN: usize = 8;

type HmacSha256 = Hmac<Sha256>;

/// A registered image style.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageStyle {
    name: String,
    private_key: String,
}

impl ImageStyle {
    pub fn new(name: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private_key: private_key.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token authorizing derivation of this style for `source_uri`.
    pub fn path_token(&self, source_uri: &str) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.private_key.as_bytes())
            .map_err(|e| StorageError::ConfigError(format!("Invalid HMAC key: {}", e)))?;
        mac.update(self.name.as_bytes());
        mac.update(b":");
        mac.update(source_uri.as_bytes());

        let mut token = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        token.truncate(PATH_TOKEN_LEN);
        Ok(token)
    }
}

impl fmt::Debug for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStyle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Lookup of image styles by name.
pub trait StyleRegistry: Send + Sync {
    fn load_style(&self, name: &str) -> Option<ImageStyle>;
}

/// Style registry configuration.
#[derive(Clone, Default)]
pub struct StyleConfig {
    /// Registered style names
    pub styles: Vec<String>,
    /// Key used to sign path tokens
    pub private_key: String,
}

impl StyleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            styles: std::env::var("IMAGE_STYLES")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            private_key: std::env::var("IMAGE_STYLE_PRIVATE_KEY").unwrap_or_default(),
        }
    }
}

impl fmt::Debug for StyleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleConfig")
            .field("styles", &self.styles)
            .finish_non_exhaustive()
    }
}

/// Fixed set of styles sharing one signing key.
#[derive(Clone, Default)]
pub struct StaticStyleRegistry {
    names: BTreeSet<String>,
    private_key: String,
}

impl StaticStyleRegistry {
    pub fn new(config: StyleConfig) -> Self {
        Self {
            names: config.styles.into_iter().collect(),
            private_key: config.private_key,
        }
    }

    pub fn from_env() -> Self {
        Self::new(StyleConfig::from_env())
    }

    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for StaticStyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticStyleRegistry")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl StyleRegistry for StaticStyleRegistry {
    fn load_style(&self, name: &str) -> Option<ImageStyle> {
        self.names
            .contains(name)
            .then(|| ImageStyle::new(name, self.private_key.as_str()))
    }
}
