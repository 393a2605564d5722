//! Stream wrapper configuration.

use std::time::Duration;

use crate::trigger::DEFAULT_TRIGGER_TIMEOUT_SECS;

/// Configuration of one Dropbox-backed scheme.
#[derive(Debug, Clone)]
pub struct SchemeConfig {
    /// URI scheme served by this configuration (e.g. "dropbox")
    pub scheme: String,
    /// Folder inside the Dropbox account all paths live under
    pub prefix: String,
    /// Serve files through public Dropbox links when possible
    pub public: bool,
    /// Base URL of the host application's file serving route
    pub public_base_url: String,
    /// Timeout for a single derivation request
    pub derivation_timeout: Duration,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            scheme: "dropbox".to_string(),
            prefix: String::new(),
            public: false,
            public_base_url: "http://localhost".to_string(),
            derivation_timeout: Duration::from_secs(DEFAULT_TRIGGER_TIMEOUT_SECS),
        }
    }
}

impl SchemeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            scheme: std::env::var("DROPBOX_SCHEME").unwrap_or_else(|_| "dropbox".to_string()),
            prefix: std::env::var("DROPBOX_PREFIX").unwrap_or_default(),
            public: std::env::var("DROPBOX_PUBLIC")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".to_string()),
            derivation_timeout: Duration::from_secs(
                std::env::var("DERIVATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TRIGGER_TIMEOUT_SECS),
            ),
        }
    }
}
