//! Non-public download URLs and query helpers.

use dbx_models::LogicalPath;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Route prefix of the locally served file endpoint.
pub const SERVE_ROUTE: &str = "_flysystem";

/// Builds the URL the host application serves a file from.
pub trait DownloadUrlBuilder: Send + Sync {
    fn download_url(&self, path: &LogicalPath) -> String;
}

/// URLs of the form `<base>/_flysystem/<scheme>/<target>`.
#[derive(Debug, Clone)]
pub struct ServeRouteUrls {
    base_url: String,
}

impl ServeRouteUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DownloadUrlBuilder for ServeRouteUrls {
    fn download_url(&self, path: &LogicalPath) -> String {
        let encoded: Vec<_> = path
            .target_str()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            SERVE_ROUTE,
            urlencoding::encode(path.scheme()),
            encoded.join("/")
        )
    }
}

/// Set `key` to `value` in the query of `raw`, replacing any existing value.
pub fn set_query_param(raw: &str, key: &str, value: &str) -> StorageResult<String> {
    let mut url =
        Url::parse(raw).map_err(|e| StorageError::InvalidUrl(format!("{}: {}", raw, e)))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(key, value);

    Ok(url.into())
}
