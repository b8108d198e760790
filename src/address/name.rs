//! Name-based addressing.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{Address, EndpointAddressScheme};
use crate::cache::DataSourceDependentCache;
use crate::{debug, debug_do};
use crate::endpoint::{EndpointDataSource, RouteEndpoint};

type NameIndex = FxHashMap<String, Vec<Arc<RouteEndpoint>>>;

/// Finds endpoints by their metadata name, ignoring case.
///
/// The index is rebuilt whenever the data source publishes a new revision.
pub struct EndpointNameScheme {
    index: DataSourceDependentCache<NameIndex>,
}

impl EndpointNameScheme {
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        Self {
            index: DataSourceDependentCache::new(source, build_index),
        }
    }
}

fn build_index(endpoints: &[Arc<RouteEndpoint>]) -> NameIndex {
    let mut index = NameIndex::default();
    for endpoint in endpoints {
        if endpoint.metadata.suppress_link_generation {
            continue;
        }
        let Some(name) = &endpoint.metadata.name else {
            continue;
        };
        let entry = index.entry(name.to_lowercase()).or_default();
        if !entry.is_empty() {
            debug!("address"; "endpoint name `{}` is shared by {} endpoints", name, entry.len() + 1);
        }
        entry.push(Arc::clone(endpoint));
    }

    debug_do! {
        let shared = index.values().filter(|e| e.len() > 1).count();
        debug!("address"; "name index rebuilt: {} names, {} shared", index.len(), shared);
    }
    index
}

impl EndpointAddressScheme for EndpointNameScheme {
    fn find_endpoints(&self, address: &Address) -> Vec<Arc<RouteEndpoint>> {
        let Address::Name(name) = address else {
            return Vec::new();
        };
        self.index
            .ensure_initialized()
            .value()
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for EndpointNameScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointNameScheme")
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::InMemoryDataSource;
    use crate::pattern::RoutePattern;

    fn named(name: &str, text: &str) -> Arc<RouteEndpoint> {
        RouteEndpoint::new(text, RoutePattern::parse(text).unwrap())
            .with_name(name)
            .into_shared()
    }

    #[test]
    fn test_lookup_ignores_case() {
        let e = named("ProductDetails", "/products/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let scheme = EndpointNameScheme::new(source);

        let found = scheme.find_endpoints(&Address::name("productdetails"));
        assert_eq!(found.len(), 1);
        assert!(Arc::ptr_eq(&found[0], &e));
        assert!(scheme.find_endpoints(&Address::name("missing")).is_empty());
    }

    #[test]
    fn test_shared_name_keeps_source_order() {
        let first = named("list", "/v2/items");
        let second = named("List", "/items");
        let source = Arc::new(InMemoryDataSource::new(vec![first.clone(), second.clone()]));
        let scheme = EndpointNameScheme::new(source);

        let found = scheme.find_endpoints(&Address::name("LIST"));
        assert_eq!(found.len(), 2);
        assert!(Arc::ptr_eq(&found[0], &first));
        assert!(Arc::ptr_eq(&found[1], &second));
    }

    #[test]
    fn test_suppressed_and_unnamed_skipped() {
        let hidden = RouteEndpoint::new("hidden", RoutePattern::parse("/h").unwrap())
            .with_name("hidden")
            .suppress_link_generation()
            .into_shared();
        let unnamed = RouteEndpoint::new("anon", RoutePattern::parse("/a").unwrap()).into_shared();
        let source = Arc::new(InMemoryDataSource::new(vec![hidden, unnamed]));
        let scheme = EndpointNameScheme::new(source);
        assert!(scheme.find_endpoints(&Address::name("hidden")).is_empty());
        assert!(scheme.find_endpoints(&Address::name("anon")).is_empty());
    }

    #[test]
    fn test_index_follows_revisions() {
        let source = Arc::new(InMemoryDataSource::new(vec![named("a", "/a")]));
        let scheme = EndpointNameScheme::new(Arc::clone(&source) as Arc<dyn EndpointDataSource>);
        assert_eq!(scheme.find_endpoints(&Address::name("a")).len(), 1);

        source.publish(vec![named("b", "/b")]);
        assert!(scheme.find_endpoints(&Address::name("a")).is_empty());
        assert_eq!(scheme.find_endpoints(&Address::name("b")).len(), 1);
    }

    #[test]
    fn test_other_kinds_not_found() {
        let source = Arc::new(InMemoryDataSource::new(vec![named("a", "/a")]));
        let scheme = EndpointNameScheme::new(source);
        assert!(scheme.find_endpoints(&Address::Endpoints(Vec::new())).is_empty());
    }
}
