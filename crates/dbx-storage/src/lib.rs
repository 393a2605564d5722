//! Dropbox storage bridge.
//!
//! This crate provides:
//! - Dropbox API v2 client (shared links, account, file operations)
//! - Public link resolution with lazy image style derivation
//! - Filesystem-style adapter relative to a configured prefix
//! - Account health diagnostics

pub mod adapter;
pub mod client;
pub mod config;
pub mod download_url;
pub mod error;
pub mod health;
pub mod metrics;
pub mod resolver;
pub mod style;
pub mod traits;
pub mod trigger;
pub mod types;

#[cfg(test)]
mod resolver_tests;

pub use adapter::{DropboxAdapter, DropboxScheme, StorageAdapter, UnconfiguredClient};
pub use client::{DropboxClient, DropboxConfig};
pub use config::SchemeConfig;
pub use download_url::{DownloadUrlBuilder, ServeRouteUrls};
pub use error::{StorageError, StorageResult};
pub use health::ensure;
pub use resolver::{LinkResolver, Resolution};
pub use style::{ImageStyle, StaticStyleRegistry, StyleConfig, StyleRegistry};
pub use traits::RemoteObjectClient;
pub use trigger::{DerivationTrigger, HttpDerivationTrigger};
pub use types::{AccountInfo, ObjectInfo, ObjectKind};
