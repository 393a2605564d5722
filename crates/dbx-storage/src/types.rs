//! Dropbox API v2 request/response types.

use serde::{Deserialize, Serialize};

/// Argument for endpoints that only take a path.
#[derive(Debug, Clone, Serialize)]
pub struct PathArg<'a> {
    pub path: &'a str,
}

/// Request for `sharing/list_shared_links`.
#[derive(Debug, Clone, Serialize)]
pub struct ListSharedLinksArg<'a> {
    pub path: &'a str,
    pub direct_only: bool,
}

/// Request for `files/list_folder`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderArg<'a> {
    pub path: &'a str,
    pub recursive: bool,
}

/// Request for `files/list_folder/continue`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderContinueArg<'a> {
    pub cursor: &'a str,
}

/// `Dropbox-API-Arg` header for `files/upload`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadArg<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    pub mute: bool,
}

/// Error body returned with non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_summary: String,
    #[serde(default)]
    pub error: serde_json::Value,
}

impl ApiErrorBody {
    /// URL of the existing link carried by a `shared_link_already_exists` error.
    pub fn existing_link_url(&self) -> Option<String> {
        self.error
            .pointer("/shared_link_already_exists/metadata/url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

/// Shared link metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedLinkMetadata {
    pub url: String,
    #[serde(default)]
    pub path_lower: Option<String>,
}

/// Response of `sharing/list_shared_links`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSharedLinksResponse {
    pub links: Vec<SharedLinkMetadata>,
    #[serde(default)]
    pub has_more: bool,
}

/// Response of `users/get_current_account`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub name: AccountName,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountName {
    pub display_name: String,
}

/// File or folder metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum Metadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
    pub size: u64,
    #[serde(default)]
    pub server_modified: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

/// Response of `files/list_folder` and `files/list_folder/continue`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListFolderResponse {
    pub entries: Vec<Metadata>,
    pub cursor: String,
    pub has_more: bool,
}

/// Response of `files/delete_v2`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResult {
    pub metadata: Metadata,
}

/// Kind of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    File,
    Dir,
}

/// Information about a stored object, relative to the adapter prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Path below the configured prefix, without a leading slash
    pub path: String,
    pub kind: ObjectKind,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time as reported by Dropbox (ISO 8601)
    pub modified: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_link_from_error() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{
                "error_summary": "shared_link_already_exists/metadata/..",
                "error": {
                    ".tag": "shared_link_already_exists",
                    "shared_link_already_exists": {
                        ".tag": "metadata",
                        "metadata": {".tag": "file", "url": "https://www.dropbox.com/s/abc/photo.jpg?dl=0"}
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            body.existing_link_url().as_deref(),
            Some("https://www.dropbox.com/s/abc/photo.jpg?dl=0")
        );
    }

    #[test]
    fn test_existing_link_missing_metadata() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"error_summary": "shared_link_already_exists/..", "error": {".tag": "shared_link_already_exists"}}"#,
        )
        .unwrap();
        assert_eq!(body.existing_link_url(), None);
    }

    #[test]
    fn test_metadata_tagged_enum() {
        let entry: Metadata = serde_json::from_str(
            r#"{".tag": "file", "name": "a.txt", "path_display": "/root/a.txt", "size": 12, "server_modified": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(entry, Metadata::File(ref f) if f.size == 12 && f.name == "a.txt"));

        let entry: Metadata =
            serde_json::from_str(r#"{".tag": "folder", "name": "docs", "path_display": "/root/docs"}"#)
                .unwrap();
        assert!(matches!(entry, Metadata::Folder(_)));
    }
}
