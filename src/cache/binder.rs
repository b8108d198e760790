//! Per-endpoint [`TemplateBinder`] cache.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use super::DataSourceDependentCache;
use crate::binder::TemplateBinder;
use crate::endpoint::{EndpointDataSource, EndpointRef, RouteEndpoint};

type BinderMap = DashMap<EndpointRef, Arc<TemplateBinder>, FxBuildHasher>;

/// Builds the binder for an endpoint on first lookup.
pub type BinderFactory = dyn Fn(&RouteEndpoint) -> TemplateBinder + Send + Sync;

/// Maps endpoints to binders, wiped whenever the endpoint set changes.
///
/// No per-entry eviction: growth is bounded by the live endpoint count.
pub struct TemplateBinderCache {
    cache: DataSourceDependentCache<BinderMap>,
    factory: Box<BinderFactory>,
}

impl TemplateBinderCache {
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        Self::with_factory(source, |endpoint| {
            TemplateBinder::new(endpoint.pattern.clone())
        })
    }

    pub fn with_factory(
        source: Arc<dyn EndpointDataSource>,
        factory: impl Fn(&RouteEndpoint) -> TemplateBinder + Send + Sync + 'static,
    ) -> Self {
        Self {
            // Nothing to build up front, entries fill in on demand
            cache: DataSourceDependentCache::new(source, |_| {
                DashMap::with_hasher(FxBuildHasher)
            }),
            factory: Box::new(factory),
        }
    }

    /// Get or create the binder for `endpoint`.
    ///
    /// Concurrent first lookups may each build a binder; one of them is
    /// kept and every caller gets an equivalent binder.
    pub fn get(&self, endpoint: &Arc<RouteEndpoint>) -> Arc<TemplateBinder> {
        let snapshot = self.cache.ensure_initialized();
        let map = snapshot.value();
        let key = EndpointRef(Arc::clone(endpoint));

        if let Some(binder) = map.get(&key) {
            return Arc::clone(binder.value());
        }

        // Build outside the shard lock
        let binder = Arc::new((self.factory)(endpoint));
        Arc::clone(map.entry(key).or_insert(binder).value())
    }

    /// Forget every binder.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Number of binders in the current snapshot.
    pub fn len(&self) -> usize {
        self.cache.ensure_initialized().value().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TemplateBinderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateBinderCache")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteOptions;
    use crate::core::RouteValues;
    use crate::endpoint::InMemoryDataSource;
    use crate::pattern::RoutePattern;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn endpoint(text: &str) -> Arc<RouteEndpoint> {
        RouteEndpoint::new(text, RoutePattern::parse(text).unwrap()).into_shared()
    }

    #[test]
    fn test_get_or_create_reuses() {
        let e = endpoint("/items/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let cache = TemplateBinderCache::new(source);
        assert!(cache.is_empty());

        let a = cache.get(&e);
        let b = cache.get(&e);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_endpoints_get_distinct_binders() {
        let e1 = endpoint("/items/{id}");
        let e2 = endpoint("/items/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e1.clone(), e2.clone()]));
        let cache = TemplateBinderCache::new(source);
        assert!(!Arc::ptr_eq(&cache.get(&e1), &cache.get(&e2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_publish_yields_fresh_binder() {
        let e = endpoint("/items/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let cache = TemplateBinderCache::new(Arc::clone(&source) as Arc<dyn EndpointDataSource>);

        let before = cache.get(&e);
        source.touch();
        assert!(cache.is_empty());
        let after = cache.get(&e);
        assert!(!Arc::ptr_eq(&before, &after));

        // in-flight holders keep a working binder
        let values = RouteValues::from([("id", 1)]);
        assert_eq!(
            before.get_values(None, &values).map(|r| r.accepted),
            after.get_values(None, &values).map(|r| r.accepted)
        );
    }

    #[test]
    fn test_invalidate_yields_fresh_binder() {
        let e = endpoint("/a");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let cache = TemplateBinderCache::new(source);
        let before = cache.get(&e);
        cache.invalidate();
        assert!(!Arc::ptr_eq(&before, &cache.get(&e)));
    }

    #[test]
    fn test_concurrent_lookups_share_one_entry() {
        let e = endpoint("/items/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let cache = TemplateBinderCache::with_factory(source, move |endpoint| {
            counter.fetch_add(1, Ordering::SeqCst);
            TemplateBinder::new(endpoint.pattern.clone())
        });

        let binders: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| cache.get(&e))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(built.load(Ordering::SeqCst) >= 1);
        assert_eq!(cache.len(), 1);
        let kept = cache.get(&e);
        assert!(binders.iter().all(|b| Arc::ptr_eq(b, &kept)));
    }

    #[test]
    fn test_lookups_during_revision_changes() {
        let e = endpoint("/items/{id}");
        let source = Arc::new(InMemoryDataSource::new(vec![e.clone()]));
        let cache = TemplateBinderCache::new(Arc::clone(&source) as Arc<dyn EndpointDataSource>);
        let options = RouteOptions::default();

        std::thread::scope(|s| {
            for t in 0..6 {
                let (cache, e, options) = (&cache, &e, &options);
                s.spawn(move || {
                    for i in 0..5_000 {
                        let id = t * 10_000 + i;
                        let values = RouteValues::from([("id", id)]);
                        let binder = cache.get(e);
                        let accepted = binder.get_values(None, &values).unwrap().accepted;
                        let bound = binder.try_bind_values(&accepted, options).unwrap();
                        assert_eq!(bound.path, format!("/items/{id}"));
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..1_000 {
                    source.touch();
                }
            });
        });

        let a = cache.get(&e);
        let b = cache.get(&e);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
