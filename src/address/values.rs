//! Route-values addressing.

use std::sync::Arc;

use super::{Address, EndpointAddressScheme, RouteValuesAddress};
use crate::cache::DataSourceDependentCache;
use crate::core::eq_ignore_case;
use crate::endpoint::{EndpointDataSource, RouteEndpoint};

/// Finds endpoints whose filter defaults agree with the supplied values.
///
/// A filter default (`area = "Admin"` on a pattern with no `{area}`) is
/// satisfied by an explicit value equal to it, or by an equal ambient value
/// when no explicit value is given. Candidates come out sorted by
/// [`RouteEndpoint::order`]; equal orders keep data source order.
pub struct RouteValuesScheme {
    candidates: DataSourceDependentCache<Vec<Arc<RouteEndpoint>>>,
}

impl RouteValuesScheme {
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        Self {
            candidates: DataSourceDependentCache::new(source, |endpoints| {
                let mut sorted: Vec<_> = endpoints
                    .iter()
                    .filter(|e| !e.metadata.suppress_link_generation)
                    .cloned()
                    .collect();
                sorted.sort_by_key(|e| e.order);
                sorted
            }),
        }
    }
}

fn accepts(endpoint: &RouteEndpoint, address: &RouteValuesAddress) -> bool {
    if let Some(route_name) = &address.route_name {
        let named = endpoint
            .metadata
            .name
            .as_deref()
            .is_some_and(|name| eq_ignore_case(name, route_name));
        if !named {
            return false;
        }
    }

    endpoint.pattern.filters().all(|(key, default)| {
        let value = address
            .explicit_values
            .get(key)
            .or_else(|| address.ambient_values.as_ref().and_then(|a| a.get(key)));
        value.is_some_and(|v| v.route_eq(default))
    })
}

impl EndpointAddressScheme for RouteValuesScheme {
    fn find_endpoints(&self, address: &Address) -> Vec<Arc<RouteEndpoint>> {
        let Address::RouteValues(address) = address else {
            return Vec::new();
        };
        self.candidates
            .ensure_initialized()
            .value()
            .iter()
            .filter(|e| accepts(e, address))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for RouteValuesScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteValuesScheme")
            .field("candidates", &self.candidates)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RouteValues;
    use crate::endpoint::InMemoryDataSource;
    use crate::pattern::RoutePattern;

    fn area_endpoint(area: &str, text: &str) -> Arc<RouteEndpoint> {
        let pattern = RoutePattern::builder(text).default("area", area).build().unwrap();
        RouteEndpoint::new(text, pattern).into_shared()
    }

    fn scheme(endpoints: Vec<Arc<RouteEndpoint>>) -> RouteValuesScheme {
        RouteValuesScheme::new(Arc::new(InMemoryDataSource::new(endpoints)))
    }

    fn address(explicit: RouteValues, ambient: Option<RouteValues>) -> Address {
        Address::RouteValues(RouteValuesAddress {
            route_name: None,
            explicit_values: explicit,
            ambient_values: ambient,
        })
    }

    #[test]
    fn test_filters_must_match() {
        let admin = area_endpoint("Admin", "/admin/{page}");
        let shop = area_endpoint("Shop", "/shop/{page}");
        let s = scheme(vec![admin.clone(), shop.clone()]);

        let found = s.find_endpoints(&address(RouteValues::from([("area", "shop")]), None));
        assert_eq!(found.len(), 1);
        assert!(Arc::ptr_eq(&found[0], &shop));

        // no value anywhere satisfies nothing
        assert!(s.find_endpoints(&address(RouteValues::new(), None)).is_empty());
    }

    #[test]
    fn test_ambient_used_when_explicit_absent() {
        let admin = area_endpoint("Admin", "/admin/{page}");
        let s = scheme(vec![admin]);
        let ambient = RouteValues::from([("area", "Admin")]);

        assert_eq!(
            s.find_endpoints(&address(RouteValues::new(), Some(ambient.clone())))
                .len(),
            1
        );
        // explicit wins over ambient
        let explicit = RouteValues::from([("area", "Shop")]);
        assert!(s.find_endpoints(&address(explicit, Some(ambient))).is_empty());
    }

    #[test]
    fn test_sorted_by_order_stable() {
        let make = |text: &str, order| {
            RouteEndpoint::new(text, RoutePattern::parse(text).unwrap())
                .with_order(order)
                .into_shared()
        };
        let late = make("/late", 10);
        let first = make("/first", 0);
        let second = make("/second", 0);
        let s = scheme(vec![late.clone(), first.clone(), second.clone()]);

        let found = s.find_endpoints(&address(RouteValues::new(), None));
        let names: Vec<_> = found.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["/first", "/second", "/late"]);
    }

    #[test]
    fn test_route_name_narrows() {
        let named = RouteEndpoint::new("a", RoutePattern::parse("/a").unwrap())
            .with_name("Default")
            .into_shared();
        let other = RouteEndpoint::new("b", RoutePattern::parse("/b").unwrap()).into_shared();
        let s = scheme(vec![named.clone(), other]);

        let found = s.find_endpoints(&Address::route_values(Some("default"), RouteValues::new()));
        assert_eq!(found.len(), 1);
        assert!(Arc::ptr_eq(&found[0], &named));
    }

    #[test]
    fn test_suppressed_skipped() {
        let hidden = RouteEndpoint::new("h", RoutePattern::parse("/h").unwrap())
            .suppress_link_generation()
            .into_shared();
        let s = scheme(vec![hidden]);
        assert!(s.find_endpoints(&address(RouteValues::new(), None)).is_empty());
    }
}
