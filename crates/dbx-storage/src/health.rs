//! Account health check.

use dbx_models::Diagnostic;
use tracing::{debug, error};

use crate::traits::RemoteObjectClient;

/// Check that the remote account is reachable with the configured credentials.
///
/// Returns an empty list when healthy, or a single error diagnostic carrying
/// the failure message. Never retries.
pub async fn ensure(client: &dyn RemoteObjectClient) -> Vec<Diagnostic> {
    match client.get_account_info().await {
        Ok(info) => {
            debug!(account_id = %info.account_id, "Dropbox account reachable");
            Vec::new()
        }
        Err(e) => {
            error!("Dropbox health check failed: {}", e);
            vec![Diagnostic::error(format!(
                "The Dropbox client failed with: {}.",
                e
            ))]
        }
    }
}
