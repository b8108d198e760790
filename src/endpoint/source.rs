//! Endpoint data sources.
//!
//! A data source publishes a [`Revision`] next to its endpoints. Caches that
//! depend on the endpoint set compare revisions and start over when it moves.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use super::RouteEndpoint;

/// Opaque change token. Any difference means the endpoint set changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(pub u64);

/// Supplier of the current endpoint collection.
pub trait EndpointDataSource: Send + Sync {
    fn endpoints(&self) -> Arc<[Arc<RouteEndpoint>]>;

    fn revision(&self) -> Revision;

    /// Endpoints together with the revision they belong to.
    ///
    /// Sources that publish concurrently override this to read both from
    /// one snapshot.
    fn current(&self) -> (Revision, Arc<[Arc<RouteEndpoint>]>) {
        (self.revision(), self.endpoints())
    }
}

#[derive(Debug)]
struct Published {
    revision: Revision,
    endpoints: Arc<[Arc<RouteEndpoint>]>,
}

/// Data source backed by an atomically replaced snapshot.
///
/// Readers get the endpoints and revision of one snapshot; `publish` swaps
/// in a new snapshot with the next revision.
#[derive(Debug)]
pub struct InMemoryDataSource {
    current: ArcSwap<Published>,
    next_revision: AtomicU64,
}

impl InMemoryDataSource {
    pub fn new(endpoints: Vec<Arc<RouteEndpoint>>) -> Self {
        Self {
            current: ArcSwap::from_pointee(Published {
                revision: Revision(0),
                endpoints: endpoints.into(),
            }),
            next_revision: AtomicU64::new(1),
        }
    }

    /// Replace the endpoint set. Returns the new revision.
    pub fn publish(&self, endpoints: Vec<Arc<RouteEndpoint>>) -> Revision {
        let revision = Revision(self.next_revision.fetch_add(1, Ordering::AcqRel));
        self.current.store(Arc::new(Published {
            revision,
            endpoints: endpoints.into(),
        }));
        revision
    }

    /// Republish the current endpoints under a new revision.
    pub fn touch(&self) -> Revision {
        let endpoints = self.endpoints().to_vec();
        self.publish(endpoints)
    }
}

impl Default for InMemoryDataSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EndpointDataSource for InMemoryDataSource {
    fn endpoints(&self) -> Arc<[Arc<RouteEndpoint>]> {
        self.current.load().endpoints.clone()
    }

    fn revision(&self) -> Revision {
        self.current.load().revision
    }

    fn current(&self) -> (Revision, Arc<[Arc<RouteEndpoint>]>) {
        let published = self.current.load();
        (published.revision, published.endpoints.clone())
    }
}
