//! Minimal view of the inbound request.

use super::{HostString, PathString, RouteValues};

/// The parts of the current request that link generation reads.
///
/// Context-taking generator operations default the path base, scheme and
/// host from here. Its route values serve as ambient values only for
/// route-values addresses. Constraints receive it as optional request
/// context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request scheme (`http`, `https`).
    pub scheme: String,
    /// Request host, possibly with port.
    pub host: HostString,
    /// Path base the application is mounted under.
    pub path_base: PathString,
    /// Route values matched for the current request (ambient values).
    pub route_values: RouteValues,
}

impl RequestContext {
    pub fn new(scheme: impl Into<String>, host: impl Into<HostString>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_path_base(mut self, path_base: PathString) -> Self {
        self.path_base = path_base;
        self
    }

    pub fn with_route_values(mut self, route_values: RouteValues) -> Self {
        self.route_values = route_values;
        self
    }
}
