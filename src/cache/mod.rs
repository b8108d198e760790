//! Caches that live as long as one generation of the endpoint set.

mod binder;
mod dependent;

pub use binder::{BinderFactory, TemplateBinderCache};
pub use dependent::{DataSourceDependentCache, Snapshot};
