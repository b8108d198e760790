//! Link generation options.
//!
//! Two layers, merged per call:
//!
//! | Type            | Scope                    | Fields            |
//! |-----------------|--------------------------|-------------------|
//! | [`RouteOptions`]| process-wide defaults    | `bool`            |
//! | [`LinkOptions`] | a single generation call | `Option<bool>`    |
//!
//! Per-call fields win field by field; `None` inherits the global value.
//!
//! # Example
//!
//! ```toml
//! [routing]
//! append_trailing_slash = false   # Append `/` to generated paths
//! lowercase_urls = true           # Lowercase generated paths
//! lowercase_query_strings = false # Also lowercase the query (needs lowercase_urls)
//! ```

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::debug;

// ============================================================================
// RouteOptions
// ============================================================================

/// Process-wide link generation defaults (`[routing]` section).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    /// Append a trailing slash to generated paths that do not end in one.
    pub append_trailing_slash: bool,

    /// Lowercase the generated path.
    pub lowercase_urls: bool,

    /// Lowercase the generated query string. Only honored together with
    /// `lowercase_urls`.
    pub lowercase_query_strings: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingFile {
    #[serde(default)]
    routing: RouteOptions,
}

impl RouteOptions {
    /// Parse the `[routing]` section out of a TOML document.
    ///
    /// Unknown keys are ignored and reported through the logger.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let file: RoutingFile = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;

        for field in ignored.iter().filter(|f| f.starts_with("routing.")) {
            debug!("config"; "ignoring unknown field `{}`", field);
        }

        file.routing.warn_inert_fields();
        Ok(file.routing)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load routing options from {}", path.display()))
    }

    fn warn_inert_fields(&self) {
        if self.lowercase_query_strings && !self.lowercase_urls {
            debug!(
                "config";
                "lowercase_query_strings has no effect without lowercase_urls"
            );
        }
    }
}

// ============================================================================
// LinkOptions
// ============================================================================

/// Per-call overrides of [`RouteOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    pub append_trailing_slash: Option<bool>,
    pub lowercase_urls: Option<bool>,
    pub lowercase_query_strings: Option<bool>,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_trailing_slash(mut self, value: bool) -> Self {
        self.append_trailing_slash = Some(value);
        self
    }

    pub fn lowercase_urls(mut self, value: bool) -> Self {
        self.lowercase_urls = Some(value);
        self
    }

    pub fn lowercase_query_strings(mut self, value: bool) -> Self {
        self.lowercase_query_strings = Some(value);
        self
    }

    /// Merge over the global defaults.
    pub fn resolve(&self, global: &RouteOptions) -> RouteOptions {
        RouteOptions {
            append_trailing_slash: self
                .append_trailing_slash
                .unwrap_or(global.append_trailing_slash),
            lowercase_urls: self.lowercase_urls.unwrap_or(global.lowercase_urls),
            lowercase_query_strings: self
                .lowercase_query_strings
                .unwrap_or(global.lowercase_query_strings),
        }
    }
}

/// Resolve optional per-call options over the global defaults.
#[inline]
pub fn resolve_options(options: Option<&LinkOptions>, global: &RouteOptions) -> RouteOptions {
    options.map_or(*global, |o| o.resolve(global))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RouteOptions::from_toml_str("").unwrap();
        assert_eq!(options, RouteOptions::default());
        assert!(!options.append_trailing_slash);
        assert!(!options.lowercase_urls);
        assert!(!options.lowercase_query_strings);
    }

    #[test]
    fn test_parse_routing_section() {
        let options = RouteOptions::from_toml_str(
            "[routing]\nappend_trailing_slash = true\nlowercase_urls = true",
        )
        .unwrap();
        assert!(options.append_trailing_slash);
        assert!(options.lowercase_urls);
        assert!(!options.lowercase_query_strings);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let options =
            RouteOptions::from_toml_str("[routing]\nlowercase_urls = true\nshout = true\n[other]\nx = 1")
                .unwrap();
        assert!(options.lowercase_urls);
    }

    #[test]
    fn test_invalid_toml() {
        let err = RouteOptions::from_toml_str("[routing]\nlowercase_urls = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("routing.toml");
        fs::write(&path, "[routing]\nlowercase_query_strings = true\nlowercase_urls = true").unwrap();

        let options = RouteOptions::load(&path).unwrap();
        assert!(options.lowercase_query_strings);
        assert!(options.lowercase_urls);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = RouteOptions::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_link_options_override_field_by_field() {
        let global = RouteOptions {
            append_trailing_slash: true,
            lowercase_urls: false,
            lowercase_query_strings: true,
        };
        let per_call = LinkOptions::new().lowercase_urls(true);
        let resolved = per_call.resolve(&global);
        assert!(resolved.append_trailing_slash);
        assert!(resolved.lowercase_urls);
        assert!(resolved.lowercase_query_strings);

        let per_call = LinkOptions::new().append_trailing_slash(false);
        assert!(!per_call.resolve(&global).append_trailing_slash);
    }

    #[test]
    fn test_resolve_without_per_call_options() {
        let global = RouteOptions {
            lowercase_urls: true,
            ..RouteOptions::default()
        };
        assert_eq!(resolve_options(None, &global), global);
    }
}
