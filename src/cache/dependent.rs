//! Values derived from the endpoint set, rebuilt when the set changes.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::endpoint::{EndpointDataSource, Revision, RouteEndpoint};

type Initializer<T> = dyn Fn(&[Arc<RouteEndpoint>]) -> T + Send + Sync;

/// One immutable generation of a derived value.
#[derive(Debug)]
pub struct Snapshot<T> {
    revision: Revision,
    value: T,
}

impl<T> Snapshot<T> {
    #[inline]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Lazily built value tied to a data source revision.
///
/// Readers load the current snapshot once per lookup. A revision change
/// swaps in a brand-new snapshot atomically; snapshots already handed out
/// stay valid for whoever holds them.
pub struct DataSourceDependentCache<T> {
    source: Arc<dyn EndpointDataSource>,
    init: Box<Initializer<T>>,
    current: ArcSwapOption<Snapshot<T>>,
}

impl<T> DataSourceDependentCache<T> {
    pub fn new(
        source: Arc<dyn EndpointDataSource>,
        init: impl Fn(&[Arc<RouteEndpoint>]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            init: Box::new(init),
            current: ArcSwapOption::empty(),
        }
    }

    /// Current snapshot, building a fresh one if the source moved on.
    pub fn ensure_initialized(&self) -> Arc<Snapshot<T>> {
        let current = self.current.load_full();
        if let Some(snapshot) = &current
            && snapshot.revision == self.source.revision()
        {
            return Arc::clone(snapshot);
        }

        let (revision, endpoints) = self.source.current();
        let fresh = Arc::new(Snapshot {
            revision,
            value: (self.init)(&endpoints),
        });

        let previous = self.current.compare_and_swap(&current, Some(Arc::clone(&fresh)));
        let won = match (&*previous, &current) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if won {
            return fresh;
        }

        // Another reader installed a snapshot first; share it if it is for
        // the same revision, otherwise keep ours for this lookup.
        match &*previous {
            Some(winner) if winner.revision == revision => Arc::clone(winner),
            _ => fresh,
        }
    }

    /// Drop the current snapshot. The next lookup starts from scratch.
    pub fn invalidate(&self) {
        self.current.store(None);
    }

    /// Revision of the installed snapshot, if any.
    pub fn revision(&self) -> Option<Revision> {
        self.current.load().as_ref().map(|s| s.revision)
    }
}

impl<T> fmt::Debug for DataSourceDependentCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceDependentCache")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
