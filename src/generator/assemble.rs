//! Joining the generated pieces into the final string.
//!
//! ```text
//! relative   {path_base}{path}{query}{fragment}
//! absolute   {scheme}://{host}{path_base}{path}{query}{fragment}
//! ```
//!
//! `path` is already encoded by the binder; the path base and host are
//! encoded here.

use crate::core::{FragmentString, HostString, PathString, QueryString};

/// Path base plus generated path, without a doubled `/` between them.
fn combine_path(path_base: &PathString, path: &str) -> String {
    let base = path_base.to_uri_component();
    if base.is_empty() && path.is_empty() {
        return "/".to_string();
    }
    let path = if base.ends_with('/') {
        path.strip_prefix('/').unwrap_or(path)
    } else {
        path
    };
    let mut combined = String::with_capacity(base.len() + path.len());
    combined.push_str(&base);
    combined.push_str(path);
    combined
}

/// `/base/path?query#fragment`
pub fn build_relative(
    path_base: &PathString,
    path: &str,
    query: &QueryString,
    fragment: &FragmentString,
) -> String {
    let mut uri = combine_path(path_base, path);
    uri.push_str(query.as_str());
    uri.push_str(fragment.as_str());
    uri
}

/// `scheme://host/base/path?query#fragment`
pub fn build_absolute(
    scheme: &str,
    host: &HostString,
    path_base: &PathString,
    path: &str,
    query: &QueryString,
    fragment: &FragmentString,
) -> String {
    let host = host.to_uri_component();
    let relative = build_relative(path_base, path, query, fragment);

    let mut uri = String::with_capacity(scheme.len() + 3 + host.len() + relative.len());
    uri.push_str(scheme);
    uri.push_str("://");
    uri.push_str(&host);
    uri.push_str(&relative);
    uri
}
