//! Derived image style descriptors.
//!
//! A derived artifact lives at `styles/<style>/<scheme>/<path>`. The parser
//! is deliberately narrow: anything that does not have all four parts with
//! the literal `styles` in front is treated as an ordinary file.

use serde::{Deserialize, Serialize};

use crate::path::{Target, SCHEME_SEPARATOR};

/// Leading segment of every derived artifact target.
pub const STYLES_SEGMENT: &str = "styles";

/// Style, source scheme and source path parsed from a derived target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivationDescriptor {
    pub style_name: String,
    pub scheme: String,
    /// Source path; may itself contain slashes.
    pub inner_path: String,
}

impl DerivationDescriptor {
    /// Parse a descriptor from a target, or `None` for non-derived targets.
    pub fn parse(target: &Target) -> Option<Self> {
        let mut parts = target.as_str().splitn(4, '/');
        let (leading, style, scheme, inner) =
            (parts.next()?, parts.next()?, parts.next()?, parts.next()?);

        if leading != STYLES_SEGMENT || style.is_empty() || scheme.is_empty() || inner.is_empty()
        {
            return None;
        }

        Some(Self {
            style_name: style.to_string(),
            scheme: scheme.to_string(),
            inner_path: inner.to_string(),
        })
    }

    /// URI of the original file the derivative is computed from.
    pub fn source_uri(&self) -> String {
        format!("{}{}{}", self.scheme, SCHEME_SEPARATOR, self.inner_path)
    }
}
