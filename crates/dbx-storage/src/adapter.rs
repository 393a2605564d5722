//! Filesystem-style facade over a Dropbox account.
//!
//! [`DropboxScheme`] is what the host application talks to: it hands out
//! the storage adapter for file operations, external URLs for files, and
//! the account health check.

use std::sync::Arc;

use async_trait::async_trait;
use dbx_models::{apply_prefix, Diagnostic, LogicalPath, Target};
use tracing::warn;

use crate::client::{DropboxClient, DropboxConfig};
use crate::config::SchemeConfig;
use crate::download_url::{DownloadUrlBuilder, ServeRouteUrls};
use crate::error::{StorageError, StorageResult};
use crate::health;
use crate::resolver::LinkResolver;
use crate::style::{StaticStyleRegistry, StyleRegistry};
use crate::traits::RemoteObjectClient;
use crate::trigger::{DerivationTrigger, HttpDerivationTrigger};
use crate::types::{AccountInfo, Metadata, ObjectInfo, ObjectKind};

// =============================================================================
// Dropbox Adapter
// =============================================================================

/// File operations relative to a prefix inside the Dropbox account.
#[derive(Clone)]
pub struct DropboxAdapter {
    client: Arc<DropboxClient>,
    prefix: String,
}

impl DropboxAdapter {
    pub fn new(client: Arc<DropboxClient>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn remote_path(&self, path: &str) -> StorageResult<String> {
        Ok(Target::new(path)?.remote_path(&self.prefix))
    }

    /// Path of a remote object relative to the prefix.
    ///
    /// Dropbox compares paths case-insensitively, so the prefix is too.
    fn relative_path(&self, remote: &str) -> String {
        let root = apply_prefix(&self.prefix, "");
        let stripped = match (remote.get(..root.len()), remote.get(root.len()..)) {
            (Some(head), Some(rest))
                if head.eq_ignore_ascii_case(&root) && (rest.is_empty() || rest.starts_with('/')) =>
            {
                rest
            }
            _ => remote,
        };
        stripped.trim_matches('/').to_string()
    }

    fn object_info(&self, metadata: Metadata) -> Option<ObjectInfo> {
        match metadata {
            Metadata::File(file) => Some(ObjectInfo {
                path: self.relative_path(file.path_display.as_deref().unwrap_or(&file.name)),
                kind: ObjectKind::File,
                size: file.size,
                modified: file.server_modified,
            }),
            Metadata::Folder(folder) => Some(ObjectInfo {
                path: self.relative_path(folder.path_display.as_deref().unwrap_or(&folder.name)),
                kind: ObjectKind::Dir,
                size: 0,
                modified: None,
            }),
            Metadata::Deleted(_) => None,
        }
    }

    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.client.download_bytes(&self.remote_path(path)?).await
    }

    pub async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<ObjectInfo> {
        let metadata = self
            .client
            .upload_bytes(&self.remote_path(path)?, data)
            .await?;
        self.object_info(Metadata::File(metadata))
            .ok_or_else(|| StorageError::not_found(path))
    }

    pub async fn has(&self, path: &str) -> StorageResult<bool> {
        match self.metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn metadata(&self, path: &str) -> StorageResult<ObjectInfo> {
        let metadata = self.client.get_metadata(&self.remote_path(path)?).await?;
        self.object_info(metadata)
            .ok_or_else(|| StorageError::not_found(path))
    }

    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        self.client.delete(&self.remote_path(path)?).await?;
        Ok(())
    }

    /// List a directory; `""` lists the prefix root.
    pub async fn list_contents(&self, dir: &str, recursive: bool) -> StorageResult<Vec<ObjectInfo>> {
        let remote = apply_prefix(&self.prefix, dir);
        let entries = self.client.list_folder(&remote, recursive).await?;

        // Recursive listings include the listed folder itself.
        let listed = self.relative_path(&remote);
        let mut objects: Vec<_> = entries
            .into_iter()
            .filter_map(|entry| self.object_info(entry))
            .filter(|object| !object.path.eq_ignore_ascii_case(&listed))
            .collect();
        objects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(objects)
    }
}

/// The adapter handed to callers, or a stand-in when Dropbox is unusable.
#[derive(Clone)]
pub enum StorageAdapter {
    Dropbox(DropboxAdapter),
    /// Every operation fails with [`StorageError::AdapterMissing`].
    Missing,
}

impl StorageAdapter {
    /// Build a Dropbox adapter, falling back to `Missing` if the client is invalid.
    pub fn connect(config: DropboxConfig, prefix: &str) -> Self {
        match DropboxClient::new(config) {
            Ok(client) => Self::Dropbox(DropboxAdapter::new(Arc::new(client), prefix)),
            Err(e) => {
                warn!("Dropbox adapter unavailable: {}", e);
                Self::Missing
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, StorageAdapter::Missing)
    }

    fn dropbox(&self) -> StorageResult<&DropboxAdapter> {
        match self {
            StorageAdapter::Dropbox(adapter) => Ok(adapter),
            StorageAdapter::Missing => Err(StorageError::AdapterMissing),
        }
    }

    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.dropbox()?.read(path).await
    }

    pub async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<ObjectInfo> {
        self.dropbox()?.write(path, data).await
    }

    pub async fn has(&self, path: &str) -> StorageResult<bool> {
        self.dropbox()?.has(path).await
    }

    pub async fn metadata(&self, path: &str) -> StorageResult<ObjectInfo> {
        self.dropbox()?.metadata(path).await
    }

    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        self.dropbox()?.delete(path).await
    }

    pub async fn list_contents(&self, dir: &str, recursive: bool) -> StorageResult<Vec<ObjectInfo>> {
        self.dropbox()?.list_contents(dir, recursive).await
    }
}

/// Remote client used when no Dropbox client could be built.
///
/// Every call fails with the original configuration error, so resolution
/// falls back to non-public URLs and the health check reports the cause.
#[derive(Debug, Clone)]
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RemoteObjectClient for UnconfiguredClient {
    async fn create_shareable_link(&self, _path: &str) -> StorageResult<String> {
        Err(StorageError::config_error(self.reason.clone()))
    }

    async fn get_account_info(&self) -> StorageResult<AccountInfo> {
        Err(StorageError::config_error(self.reason.clone()))
    }
}

// =============================================================================
// Scheme Facade
// =============================================================================

/// A Dropbox-backed scheme as seen by the host application.
pub struct DropboxScheme {
    config: SchemeConfig,
    client: Arc<dyn RemoteObjectClient>,
    resolver: LinkResolver,
    urls: Arc<dyn DownloadUrlBuilder>,
    storage: StorageAdapter,
}

impl DropboxScheme {
    /// Assemble a scheme from explicit collaborators.
    pub fn new(
        config: SchemeConfig,
        client: Arc<dyn RemoteObjectClient>,
        trigger: Arc<dyn DerivationTrigger>,
        styles: Arc<dyn StyleRegistry>,
        urls: Arc<dyn DownloadUrlBuilder>,
        storage: StorageAdapter,
    ) -> Self {
        let resolver = LinkResolver::new(
            Arc::clone(&client),
            trigger,
            styles,
            Arc::clone(&urls),
            config.prefix.clone(),
        );

        Self {
            config,
            client,
            resolver,
            urls,
            storage,
        }
    }

    /// Build the Dropbox client, derivation trigger and URL builder once.
    pub fn from_config(
        config: SchemeConfig,
        dropbox: DropboxConfig,
        styles: Arc<dyn StyleRegistry>,
    ) -> StorageResult<Self> {
        Self::assemble(config, DropboxClient::new(dropbox), styles)
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::assemble(
            SchemeConfig::from_env(),
            DropboxClient::from_env(),
            Arc::new(StaticStyleRegistry::from_env()),
        )
    }

    fn assemble(
        config: SchemeConfig,
        client: StorageResult<DropboxClient>,
        styles: Arc<dyn StyleRegistry>,
    ) -> StorageResult<Self> {
        let (client, storage): (Arc<dyn RemoteObjectClient>, StorageAdapter) = match client {
            Ok(client) => {
                let client = Arc::new(client);
                let storage =
                    StorageAdapter::Dropbox(DropboxAdapter::new(Arc::clone(&client), &config.prefix));
                (client, storage)
            }
            Err(e) => {
                warn!("Dropbox client unavailable, serving without Dropbox: {}", e);
                (
                    Arc::new(UnconfiguredClient::new(e.to_string())),
                    StorageAdapter::Missing,
                )
            }
        };

        let trigger = Arc::new(HttpDerivationTrigger::with_timeout(config.derivation_timeout)?);
        let urls = Arc::new(ServeRouteUrls::new(config.public_base_url.as_str()));

        Ok(Self::new(config, client, trigger, styles, urls, storage))
    }

    pub fn config(&self) -> &SchemeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    /// The storage adapter for file operations.
    pub fn adapter(&self) -> &StorageAdapter {
        &self.storage
    }

    /// Full URI of `path` under this scheme.
    pub fn uri(&self, path: &str) -> String {
        format!("{}://{}", self.config.scheme, path.trim_start_matches('/'))
    }

    /// Public Dropbox link for `uri` if public serving is enabled and one resolves.
    pub async fn public_url(&self, uri: &str) -> Option<String> {
        if !self.config.public {
            return None;
        }
        self.resolver.resolve_public_url(uri).await
    }

    /// URL for `uri`: the public link when available, otherwise the serve route.
    pub async fn external_url(&self, uri: &str) -> String {
        match self.public_url(uri).await {
            Some(url) => url,
            None => self.urls.download_url(&LogicalPath::new(uri)),
        }
    }

    /// Account health diagnostics; empty when healthy.
    pub async fn ensure(&self) -> Vec<Diagnostic> {
        health::ensure(self.client.as_ref()).await
    }
}
