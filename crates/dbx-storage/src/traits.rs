//! Remote object client interface.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::AccountInfo;

/// Calls the resolver and health check make against the remote store.
///
/// Implementations hold no per-call mutable state so a single handle can be
/// shared for the lifetime of the process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteObjectClient: Send + Sync {
    /// Create, or fetch the existing, shareable link for an absolute remote path.
    async fn create_shareable_link(&self, path: &str) -> StorageResult<String>;

    /// Fetch information about the authenticated account.
    async fn get_account_info(&self) -> StorageResult<AccountInfo>;
}
