//! Endpoints and the data source that publishes them.
//!
//! Endpoints are shared as `Arc<RouteEndpoint>` and compared by pointer:
//! two endpoints with identical patterns are still different endpoints.

mod source;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use source::{EndpointDataSource, InMemoryDataSource, Revision};

use crate::pattern::RoutePattern;

/// Endpoint metadata relevant to link generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointMetadata {
    /// Name used by name-based addressing.
    pub name: Option<String>,
    /// Excluded from every address scheme when set.
    pub suppress_link_generation: bool,
}

/// A routable unit: a compiled pattern plus metadata.
#[derive(Debug)]
pub struct RouteEndpoint {
    pub display_name: String,
    pub pattern: RoutePattern,
    /// Lower orders are preferred by route-values addressing.
    pub order: i32,
    pub metadata: EndpointMetadata,
}

impl RouteEndpoint {
    pub fn new(display_name: impl Into<String>, pattern: RoutePattern) -> Self {
        Self {
            display_name: display_name.into(),
            pattern,
            order: 0,
            metadata: EndpointMetadata::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn suppress_link_generation(mut self) -> Self {
        self.metadata.suppress_link_generation = true;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Hash/Eq by `Arc` pointer identity.
#[derive(Debug, Clone)]
pub(crate) struct EndpointRef(pub Arc<RouteEndpoint>);

impl PartialEq for EndpointRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EndpointRef {}

impl Hash for EndpointRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn endpoint(name: &str) -> Arc<RouteEndpoint> {
        RouteEndpoint::new(name, RoutePattern::parse("/a").unwrap()).into_shared()
    }

    #[test]
    fn test_identity_is_pointer_based() {
        let a = endpoint("same");
        let b = endpoint("same");

        let mut set = FxHashSet::default();
        set.insert(EndpointRef(a.clone()));
        set.insert(EndpointRef(a.clone()));
        set.insert(EndpointRef(b));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&EndpointRef(a)));
    }

    #[test]
    fn test_builder_methods() {
        let e = RouteEndpoint::new("Products.Show", RoutePattern::parse("/p/{id}").unwrap())
            .with_name("product")
            .with_order(2)
            .suppress_link_generation();
        assert_eq!(e.metadata.name.as_deref(), Some("product"));
        assert_eq!(e.order, 2);
        assert!(e.metadata.suppress_link_generation);
        assert_eq!(e.to_string(), "Products.Show");
    }
}
