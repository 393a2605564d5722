//! Derivation trigger.
//!
//! Derived images are materialized by requesting them from the image style
//! endpoint, which writes the derivative to the remote store before it
//! answers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::StorageResult;

/// Default timeout for a derivation request.
pub const DEFAULT_TRIGGER_TIMEOUT_SECS: u64 = 30;

/// Issues the request that causes a derivative to be generated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DerivationTrigger: Send + Sync {
    /// GET `url` and return the HTTP status code.
    async fn trigger(&self, url: &str) -> StorageResult<u16>;
}

/// Derivation trigger backed by a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpDerivationTrigger {
    http: Client,
    timeout: Duration,
}

impl HttpDerivationTrigger {
    /// Create a trigger sharing an existing HTTP client.
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Create a trigger with its own HTTP client.
    pub fn with_timeout(timeout: Duration) -> StorageResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("dbx-storage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(http, timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DerivationTrigger for HttpDerivationTrigger {
    async fn trigger(&self, url: &str) -> StorageResult<u16> {
        debug!("Triggering derivation: {}", url);

        let response = self.http.get(url).timeout(self.timeout).send().await?;
        Ok(response.status().as_u16())
    }
}
