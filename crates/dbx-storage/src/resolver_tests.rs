//! Tests for public link resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dbx_models::{LogicalPath, Target};
use mockall::predicate::eq;

use crate::download_url::ServeRouteUrls;
use crate::error::StorageError;
use crate::resolver::{LinkResolver, Resolution};
use crate::style::{ImageStyle, StaticStyleRegistry, StyleConfig};
use crate::traits::MockRemoteObjectClient;
use crate::trigger::MockDerivationTrigger;

// =============================================================================
// Test Helpers
// =============================================================================

const LINK: &str = "https://www.dropbox.com/s/abc123/photo.jpg?dl=0";
const DIRECT_LINK: &str = "https://www.dropbox.com/s/abc123/photo.jpg?dl=1";
const STYLE_KEY: &str = "test-private-key";

fn resolver_with_prefix(
    client: MockRemoteObjectClient,
    trigger: MockDerivationTrigger,
    prefix: &str,
) -> LinkResolver {
    let styles = StaticStyleRegistry::new(StyleConfig {
        styles: vec!["thumbnail".to_string()],
        private_key: STYLE_KEY.to_string(),
    });

    LinkResolver::new(
        Arc::new(client),
        Arc::new(trigger),
        Arc::new(styles),
        Arc::new(ServeRouteUrls::new("https://example.com")),
        prefix,
    )
}

fn resolver(client: MockRemoteObjectClient, trigger: MockDerivationTrigger) -> LinkResolver {
    resolver_with_prefix(client, trigger, "")
}

fn not_found(path: &str) -> StorageError {
    StorageError::not_found(format!("path/not_found/{}", path))
}

fn expected_trigger_url() -> String {
    let token = ImageStyle::new("thumbnail", STYLE_KEY)
        .path_token("public://photo.jpg")
        .unwrap();
    format!(
        "https://example.com/_flysystem/dropbox/styles/thumbnail/public/photo.jpg?itok={}",
        token
    )
}

// =============================================================================
// Existing Links
// =============================================================================

#[tokio::test]
async fn test_existing_link_gets_forced_download() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .with(eq("/photo.jpg"))
        .times(1)
        .returning(|_| Ok(LINK.to_string()));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let url = resolver.resolve_public_url("dropbox://photo.jpg").await;
    assert_eq!(url.as_deref(), Some(DIRECT_LINK));
}

#[tokio::test]
async fn test_existing_derived_link_skips_derivation() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .with(eq("/styles/thumbnail/public/photo.jpg"))
        .times(1)
        .returning(|_| Ok(LINK.to_string()));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/thumbnail/public/photo.jpg"))
        .await;
    assert_eq!(resolution, Resolution::Existing(DIRECT_LINK.to_string()));
}

#[tokio::test]
async fn test_repeated_resolution_is_stable() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(2)
        .returning(|_| Ok(LINK.to_string()));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let first = resolver.resolve_public_url("dropbox://photo.jpg").await;
    let second = resolver.resolve_public_url("dropbox://photo.jpg").await;
    assert_eq!(first.as_deref(), Some(DIRECT_LINK));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_prefix_is_applied_to_remote_path() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .with(eq("/site/files/docs/report.pdf"))
        .times(1)
        .returning(|_| Ok("https://www.dropbox.com/s/xyz/report.pdf".to_string()));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver_with_prefix(client, trigger, "site/files");
    let url = resolver.resolve_public_url("dropbox://docs/report.pdf").await;
    assert_eq!(
        url.as_deref(),
        Some("https://www.dropbox.com/s/xyz/report.pdf?dl=1")
    );
}

#[tokio::test]
async fn test_try_shareable_link_treats_empty_link_as_missing() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|_| Ok(String::new()));

    let resolver = resolver(client, MockDerivationTrigger::new());
    let target = Target::new("photo.jpg").unwrap();
    assert_eq!(resolver.try_shareable_link(&target).await, None);
}

#[tokio::test]
async fn test_try_shareable_link_swallows_remote_errors() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|_| Err(StorageError::Unauthorized("invalid_access_token/".to_string())));

    let resolver = resolver(client, MockDerivationTrigger::new());
    let target = Target::new("photo.jpg").unwrap();
    assert_eq!(resolver.try_shareable_link(&target).await, None);
}

// =============================================================================
// Derivation
// =============================================================================

#[tokio::test]
async fn test_derivation_then_single_requery() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut client = MockRemoteObjectClient::new();
    {
        let events = Arc::clone(&events);
        let calls = Arc::clone(&calls);
        client
            .expect_create_shareable_link()
            .with(eq("/styles/thumbnail/public/photo.jpg"))
            .times(2)
            .returning(move |path| {
                events.lock().unwrap().push("link");
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(not_found(path))
                } else {
                    Ok(LINK.to_string())
                }
            });
    }

    let mut trigger = MockDerivationTrigger::new();
    {
        let events = Arc::clone(&events);
        trigger
            .expect_trigger()
            .with(eq(expected_trigger_url()))
            .times(1)
            .returning(move |_| {
                events.lock().unwrap().push("trigger");
                Ok(200)
            });
    }

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/thumbnail/public/photo.jpg"))
        .await;

    assert_eq!(resolution, Resolution::Derived(DIRECT_LINK.to_string()));
    assert_eq!(*events.lock().unwrap(), vec!["link", "trigger", "link"]);
}

#[tokio::test]
async fn test_failed_requery_after_derivation_is_not_retried() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(2)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().times(1).returning(|_| Ok(200));

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/thumbnail/public/photo.jpg"))
        .await;

    assert_eq!(resolution, Resolution::Unavailable);
    assert_eq!(resolution.url(), None);
}

#[tokio::test]
async fn test_trigger_404_skips_requery() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().times(1).returning(|_| Ok(404));

    let resolver = resolver(client, trigger);
    let url = resolver
        .resolve_public_url("dropbox://styles/thumbnail/public/photo.jpg")
        .await;
    assert_eq!(url, None);
}

#[tokio::test]
async fn test_trigger_transport_error_skips_requery() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().times(1).returning(|_| {
        Err(StorageError::Api {
            status: 502,
            summary: "bad gateway".to_string(),
        })
    });

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/thumbnail/public/photo.jpg"))
        .await;
    assert_eq!(resolution, Resolution::DerivationFailed);
}

#[tokio::test]
async fn test_nested_source_path_is_derivable() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let token = ImageStyle::new("thumbnail", STYLE_KEY)
        .path_token("public://2024/05/photo.jpg")
        .unwrap();
    let expected = format!(
        "https://example.com/_flysystem/dropbox/styles/thumbnail/public/2024/05/photo.jpg?itok={}",
        token
    );

    let mut trigger = MockDerivationTrigger::new();
    trigger
        .expect_trigger()
        .with(eq(expected))
        .times(1)
        .returning(|_| Ok(500));

    let resolver = resolver(client, trigger);
    let url = resolver
        .resolve_public_url("dropbox://styles/thumbnail/public/2024/05/photo.jpg")
        .await;
    assert_eq!(url, None);
}

// =============================================================================
// Non-derivable Targets
// =============================================================================

#[tokio::test]
async fn test_three_segment_style_path_is_not_derived() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/thumbnail/public"))
        .await;
    assert_eq!(resolution, Resolution::NotDerivable);
}

#[tokio::test]
async fn test_unknown_style_is_not_derived() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let resolution = resolver
        .resolve(&LogicalPath::new("dropbox://styles/medium/public/photo.jpg"))
        .await;
    assert_eq!(resolution, Resolution::UnknownStyle("medium".to_string()));
}

#[tokio::test]
async fn test_missing_ordinary_file_is_not_derived() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|path| Err(not_found(path)));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let url = resolver.resolve_public_url("dropbox://images/photo.jpg").await;
    assert_eq!(url, None);
}

#[tokio::test]
async fn test_remote_error_on_ordinary_file_yields_no_link() {
    let mut client = MockRemoteObjectClient::new();
    client
        .expect_create_shareable_link()
        .times(1)
        .returning(|_| Err(StorageError::RateLimited("too_many_requests/".to_string())));

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    assert_eq!(resolver.resolve_public_url("dropbox://photo.jpg").await, None);
}

#[tokio::test]
async fn test_empty_target_makes_no_remote_calls() {
    let mut client = MockRemoteObjectClient::new();
    client.expect_create_shareable_link().never();

    let mut trigger = MockDerivationTrigger::new();
    trigger.expect_trigger().never();

    let resolver = resolver(client, trigger);
    let resolution = resolver.resolve(&LogicalPath::new("dropbox://")).await;
    assert_eq!(resolution, Resolution::NotDerivable);
}
