//! URL component types for link assembly.
//!
//! - Path bases are stored decoded and encoded on output
//! - Query strings and fragments are stored already encoded, with their
//!   leading `?` / `#`
//! - Hosts are converted to their ASCII (punycode) form on output

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::LinkError;

/// Characters escaped inside a single path segment (RFC 3986 `pchar` complement).
pub(crate) const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'\\')
    .add(b'^')
    .add(b'|')
    .add(b'[')
    .add(b']')
    .add(b'/');

/// Like [`PATH_SEGMENT`] but keeps `/` (catch-all values and path bases).
pub(crate) const PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');

/// Query keys and values: everything except RFC 3986 unreserved characters.
pub(crate) const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[inline]
pub(crate) fn encode_segment(value: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(value, PATH_SEGMENT)
}

#[inline]
pub(crate) fn encode_path(value: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(value, PATH)
}

#[inline]
pub(crate) fn encode_query_component(value: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(value, QUERY_COMPONENT)
}

// ============================================================================
// PathString
// ============================================================================

/// Decoded path base (e.g. `/app`). Empty or starting with `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathString(String);

impl PathString {
    pub fn new(decoded: impl Into<String>) -> Result<Self, LinkError> {
        let decoded = decoded.into();
        if !decoded.is_empty() && !decoded.starts_with('/') {
            return Err(LinkError::InvalidPathBase(decoded));
        }
        Ok(Self(decoded))
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        !self.0.is_empty()
    }

    /// Encoded form, safe to put in a URI.
    pub fn to_uri_component(&self) -> String {
        encode_path(&self.0).to_string()
    }
}

impl TryFrom<&str> for PathString {
    type Error = LinkError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl fmt::Display for PathString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// QueryString
// ============================================================================

/// Encoded query string including the leading `?`, or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryString(String);

impl QueryString {
    pub fn new(encoded: impl Into<String>) -> Result<Self, LinkError> {
        let encoded = encoded.into();
        if !encoded.is_empty() && !encoded.starts_with('?') {
            return Err(LinkError::InvalidQuery(encoded));
        }
        Ok(Self(encoded))
    }

    /// Caller guarantees the `?` prefix (or emptiness) and encoding.
    pub(crate) fn from_encoded_unchecked(encoded: String) -> Self {
        Self(encoded)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// FragmentString
// ============================================================================

/// Encoded fragment including the leading `#`, or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FragmentString(String);

impl FragmentString {
    pub fn new(encoded: impl Into<String>) -> Result<Self, LinkError> {
        let encoded = encoded.into();
        if !encoded.is_empty() && !encoded.starts_with('#') {
            return Err(LinkError::InvalidFragment(encoded));
        }
        Ok(Self(encoded))
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        !self.0.is_empty()
    }
}

impl TryFrom<&str> for FragmentString {
    type Error = LinkError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl fmt::Display for FragmentString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// HostString
// ============================================================================

/// Host with optional port (`example.com:8080`, `[::1]:5000`, `bücher.de`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HostString(String);

impl HostString {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        !self.0.is_empty()
    }

    /// Split off a trailing `:port`, leaving IPv6 literals intact.
    fn split_port(&self) -> (&str, Option<&str>) {
        let value = self.0.as_str();
        let host_end = if value.starts_with('[') {
            value.find(']').map_or(value.len(), |i| i + 1)
        } else {
            value.find(':').unwrap_or(value.len())
        };
        let (host, rest) = value.split_at(host_end);
        (host, rest.strip_prefix(':'))
    }

    /// ASCII form for URIs. Non-ASCII domains are converted to punycode.
    pub fn to_uri_component(&self) -> String {
        if self.0.is_ascii() {
            return self.0.clone();
        }

        let (host, port) = self.split_port();
        let ascii = match url::Host::parse(host) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => encode_path(host).to_string(),
        };
        match port {
            Some(port) => format!("{ascii}:{port}"),
            None => ascii,
        }
    }
}

impl From<&str> for HostString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HostString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
