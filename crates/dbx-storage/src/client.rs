//! Dropbox API v2 client implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::metrics::record_request;
use crate::traits::RemoteObjectClient;
use crate::types::{
    AccountInfo, ApiErrorBody, DeleteResult, FileMetadata, ListFolderArg, ListFolderContinueArg,
    ListFolderResponse, ListSharedLinksArg, ListSharedLinksResponse, Metadata, PathArg,
    SharedLinkMetadata, UploadArg,
};

/// Dropbox RPC endpoint base.
pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";

/// Dropbox content (upload/download) endpoint base.
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Dropbox client.
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    /// OAuth2 access token
    pub access_token: String,
    /// App identifier, sent as the user agent
    pub client_id: String,
    /// RPC endpoint base URL
    pub api_base_url: String,
    /// Content endpoint base URL
    pub content_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl DropboxConfig {
    /// Config with default endpoints and timeouts.
    pub fn new(access_token: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            client_id: client_id.into(),
            api_base_url: DEFAULT_API_URL.to_string(),
            content_base_url: DEFAULT_CONTENT_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let access_token = std::env::var("DROPBOX_TOKEN")
            .map_err(|_| StorageError::config_error("DROPBOX_TOKEN not set"))?;
        let client_id = std::env::var("DROPBOX_CLIENT_ID")
            .map_err(|_| StorageError::config_error("DROPBOX_CLIENT_ID not set"))?;

        Ok(Self {
            api_base_url: std::env::var("DROPBOX_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            content_base_url: std::env::var("DROPBOX_CONTENT_URL")
                .unwrap_or_else(|_| DEFAULT_CONTENT_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("DROPBOX_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("DROPBOX_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            ..Self::new(access_token, client_id)
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Dropbox API v2 client.
#[derive(Clone)]
pub struct DropboxClient {
    http: Client,
    config: DropboxConfig,
}

impl DropboxClient {
    /// Create a new Dropbox client.
    pub fn new(config: DropboxConfig) -> StorageResult<Self> {
        if config.access_token.trim().is_empty() {
            return Err(StorageError::config_error("Dropbox access token is empty"));
        }
        if config.client_id.trim().is_empty() {
            return Err(StorageError::config_error("Dropbox client id is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(config.client_id.as_str())
            .build()?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(DropboxConfig::from_env()?)
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), endpoint)
    }

    fn content_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.content_base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Authenticate and send a request, recording request metrics.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> StorageResult<Response> {
        let start = Instant::now();
        let result = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await;

        let status = result.as_ref().map(|r| r.status().as_u16()).unwrap_or(0);
        record_request(endpoint, status, start.elapsed().as_secs_f64() * 1000.0);

        Ok(result?)
    }

    /// Call an RPC endpoint with a JSON argument.
    async fn rpc<A, R>(&self, endpoint: &str, arg: &A) -> StorageResult<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint, "Dropbox RPC");
        let request = self.http.post(self.api_url(endpoint)).json(arg);
        let response = self.send(endpoint, request).await?;
        Self::decode(response).await
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> StorageResult<R> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: Response) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::from_api_response(status.as_u16(), &body))
    }

    // =========================================================================
    // Sharing
    // =========================================================================

    /// Create a shared link for `path`, or return the one that already exists.
    pub async fn shareable_link(&self, path: &str) -> StorageResult<String> {
        let endpoint = "sharing/create_shared_link_with_settings";
        let request = self.http.post(self.api_url(endpoint)).json(&PathArg { path });
        let response = self.send(endpoint, request).await?;
        let status = response.status();

        if status.is_success() {
            let link: SharedLinkMetadata = response.json().await?;
            if link.url.is_empty() {
                return Err(StorageError::link_unavailable(path));
            }
            return Ok(link.url);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            if let Ok(error) = serde_json::from_str::<ApiErrorBody>(&body) {
                if error.error_summary.starts_with("shared_link_already_exists") {
                    if let Some(url) = error.existing_link_url() {
                        return Ok(url);
                    }
                    return self.existing_shareable_link(path).await;
                }
            }
        }

        Err(StorageError::from_api_response(status.as_u16(), &body))
    }

    /// Look up an existing direct shared link for `path`.
    async fn existing_shareable_link(&self, path: &str) -> StorageResult<String> {
        let response: ListSharedLinksResponse = self
            .rpc(
                "sharing/list_shared_links",
                &ListSharedLinksArg {
                    path,
                    direct_only: true,
                },
            )
            .await?;

        response
            .links
            .into_iter()
            .map(|link| link.url)
            .find(|url| !url.is_empty())
            .ok_or_else(|| StorageError::link_unavailable(path))
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Get the account the access token belongs to.
    pub async fn current_account(&self) -> StorageResult<AccountInfo> {
        self.rpc("users/get_current_account", &()).await
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Upload bytes, overwriting any existing file.
    pub async fn upload_bytes(&self, path: &str, data: Vec<u8>) -> StorageResult<FileMetadata> {
        debug!("Uploading {} bytes to {}", data.len(), path);

        let arg = api_arg(&UploadArg {
            path,
            mode: "overwrite",
            mute: true,
        })?;
        let endpoint = "files/upload";
        let request = self
            .http
            .post(self.content_url(endpoint))
            .header(API_ARG_HEADER, arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);

        let response = self.send(endpoint, request).await?;
        let metadata: FileMetadata = Self::decode(response).await?;

        info!("Uploaded {}", path);
        Ok(metadata)
    }

    /// Download a file as bytes.
    pub async fn download_bytes(&self, path: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", path);

        let endpoint = "files/download";
        let request = self
            .http
            .post(self.content_url(endpoint))
            .header(API_ARG_HEADER, api_arg(&PathArg { path })?);

        let response = self.send(endpoint, request).await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Get file or folder metadata.
    pub async fn get_metadata(&self, path: &str) -> StorageResult<Metadata> {
        self.rpc("files/get_metadata", &PathArg { path }).await
    }

    /// Delete a file or folder.
    pub async fn delete(&self, path: &str) -> StorageResult<Metadata> {
        debug!("Deleting {}", path);
        let result: DeleteResult = self.rpc("files/delete_v2", &PathArg { path }).await?;
        Ok(result.metadata)
    }

    /// List a folder, following cursors until all entries are fetched.
    pub async fn list_folder(&self, path: &str, recursive: bool) -> StorageResult<Vec<Metadata>> {
        debug!("Listing folder {:?} (recursive={})", path, recursive);

        let mut page: ListFolderResponse = self
            .rpc("files/list_folder", &ListFolderArg { path, recursive })
            .await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more {
            let cursor = std::mem::take(&mut page.cursor);
            page = self
                .rpc(
                    "files/list_folder/continue",
                    &ListFolderContinueArg { cursor: &cursor },
                )
                .await?;
            entries.append(&mut page.entries);
        }

        Ok(entries)
    }
}

#[async_trait]
impl RemoteObjectClient for DropboxClient {
    async fn create_shareable_link(&self, path: &str) -> StorageResult<String> {
        self.shareable_link(path).await
    }

    async fn get_account_info(&self) -> StorageResult<AccountInfo> {
        self.current_account().await
    }
}

/// Serialize a `Dropbox-API-Arg` header value.
///
/// HTTP headers must be ASCII, so non-ASCII characters are sent as JSON
/// `\uXXXX` escapes.
fn api_arg<T: Serialize>(arg: &T) -> StorageResult<String> {
    let json = serde_json::to_string(arg)?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(escaped)
}
