//! Public link resolution with lazy image style derivation.
//!
//! Resolution asks the remote store for a shareable link first. When there is
//! none and the target names a derived image (`styles/<style>/<scheme>/<path>`),
//! the derivative is requested from the image style endpoint once, and the
//! link lookup is repeated once. Every remote failure ends as "no public
//! link"; callers fall back to their own non-public URL.

use std::sync::Arc;

use dbx_models::{DerivationDescriptor, LogicalPath, Target};
use tracing::{debug, info, warn};

use crate::download_url::{set_query_param, DownloadUrlBuilder};
use crate::metrics::{record_resolution, record_trigger};
use crate::style::{StyleRegistry, TOKEN_QUERY_PARAM};
use crate::traits::RemoteObjectClient;
use crate::trigger::DerivationTrigger;

/// Query parameter forcing a direct download from a shared link.
pub const DOWNLOAD_QUERY_PARAM: &str = "dl";

/// Outcome of a public URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The object already had a shareable link.
    Existing(String),
    /// The derivative was generated and then linked.
    Derived(String),
    /// No link, and the target is not a derived image.
    NotDerivable,
    /// The target names a style that is not registered.
    UnknownStyle(String),
    /// The derivation request failed.
    DerivationFailed,
    /// Derivation succeeded but the object still has no link.
    Unavailable,
}

impl Resolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolution::Existing(url) | Resolution::Derived(url) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Resolution::Existing(url) | Resolution::Derived(url) => Some(url),
            _ => None,
        }
    }

    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Existing(_) => "existing",
            Resolution::Derived(_) => "derived",
            Resolution::NotDerivable => "not_derivable",
            Resolution::UnknownStyle(_) => "unknown_style",
            Resolution::DerivationFailed => "derivation_failed",
            Resolution::Unavailable => "unavailable",
        }
    }
}

/// Resolves logical paths to public Dropbox links.
#[derive(Clone)]
pub struct LinkResolver {
    client: Arc<dyn RemoteObjectClient>,
    trigger: Arc<dyn DerivationTrigger>,
    styles: Arc<dyn StyleRegistry>,
    urls: Arc<dyn DownloadUrlBuilder>,
    prefix: String,
}

impl LinkResolver {
    pub fn new(
        client: Arc<dyn RemoteObjectClient>,
        trigger: Arc<dyn DerivationTrigger>,
        styles: Arc<dyn StyleRegistry>,
        urls: Arc<dyn DownloadUrlBuilder>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            trigger,
            styles,
            urls,
            prefix: prefix.into(),
        }
    }

    /// Public URL for `uri`, or `None` when the caller must fall back.
    pub async fn resolve_public_url(&self, uri: &str) -> Option<String> {
        self.resolve(&LogicalPath::new(uri)).await.into_url()
    }

    /// Resolve `path`, reporting how the result was reached.
    pub async fn resolve(&self, path: &LogicalPath) -> Resolution {
        let resolution = self.resolve_inner(path).await;
        record_resolution(resolution.as_str());
        debug!(
            uri = %path,
            outcome = resolution.as_str(),
            "Resolved public URL"
        );
        resolution
    }

    async fn resolve_inner(&self, path: &LogicalPath) -> Resolution {
        let target = match path.target() {
            Ok(target) => target,
            Err(e) => {
                debug!("No public link for {}: {}", path, e);
                return Resolution::NotDerivable;
            }
        };

        if let Some(link) = self.try_shareable_link(&target).await {
            return Resolution::Existing(link);
        }

        let Some(descriptor) = DerivationDescriptor::parse(&target) else {
            return Resolution::NotDerivable;
        };

        let Some(style) = self.styles.load_style(&descriptor.style_name) else {
            debug!(style = %descriptor.style_name, "Image style not registered");
            return Resolution::UnknownStyle(descriptor.style_name);
        };

        let token = match style.path_token(&descriptor.source_uri()) {
            Ok(token) => token,
            Err(e) => {
                warn!(style = %descriptor.style_name, "Failed to compute path token: {}", e);
                return Resolution::DerivationFailed;
            }
        };

        let download_url = self.urls.download_url(path);
        let trigger_url = match set_query_param(&download_url, TOKEN_QUERY_PARAM, &token) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build derivation URL for {}: {}", path, e);
                return Resolution::DerivationFailed;
            }
        };

        if !self.trigger_derivation(&trigger_url).await {
            return Resolution::DerivationFailed;
        }

        match self.try_shareable_link(&target).await {
            Some(link) => {
                info!(object = %target, style = %descriptor.style_name, "Derived image linked");
                Resolution::Derived(link)
            }
            None => Resolution::Unavailable,
        }
    }

    /// Shareable link for `target` with forced download, if one is available now.
    ///
    /// Missing objects and remote errors both yield `None`.
    pub async fn try_shareable_link(&self, target: &Target) -> Option<String> {
        let remote_path = target.remote_path(&self.prefix);

        let link = match self.client.create_shareable_link(&remote_path).await {
            Ok(link) if !link.is_empty() => link,
            Ok(_) => {
                debug!(path = %remote_path, "Empty shareable link");
                return None;
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %remote_path, "No remote object to link");
                return None;
            }
            Err(e) => {
                warn!(path = %remote_path, "Shareable link lookup failed: {}", e);
                return None;
            }
        };

        match set_query_param(&link, DOWNLOAD_QUERY_PARAM, "1") {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(path = %remote_path, "Dropbox returned an unusable link: {}", e);
                None
            }
        }
    }

    /// Request the derivative once. Only HTTP 200 counts as success.
    async fn trigger_derivation(&self, url: &str) -> bool {
        match self.trigger.trigger(url).await {
            Ok(200) => {
                record_trigger(Some(200));
                true
            }
            Ok(status) => {
                record_trigger(Some(status));
                warn!(status, "Derivation request returned non-200 status");
                false
            }
            Err(e) => {
                record_trigger(None);
                warn!("Derivation request failed: {}", e);
                false
            }
        }
    }
}
