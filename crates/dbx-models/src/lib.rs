//! Shared data models for the Dropbox storage bridge.
//!
//! This crate provides plain types for:
//! - Logical paths (`scheme://target`) and their remote-store targets
//! - Derived image style descriptors embedded in targets
//! - Health check diagnostics

pub mod derivation;
pub mod diagnostic;
pub mod path;

// Re-export common types
pub use derivation::DerivationDescriptor;
pub use diagnostic::{Diagnostic, Severity};
pub use path::{apply_prefix, LogicalPath, PathError, PathResult, Target};
