//! Routelink - outbound link generation for route templates.
//!
//! Give it an endpoint name (or route values, or an explicit endpoint set)
//! plus route values, get back a path or an absolute URI:
//!
//! ```ignore
//! let source = Arc::new(InMemoryDataSource::new(vec![
//!     RouteEndpoint::new("items", RoutePattern::parse("/items/{id}")?)
//!         .with_name("item")
//!         .into_shared(),
//! ]));
//! let links = LinkGenerator::new(source);
//!
//! let values = RouteValues::from([("id", "7"), ("sort", "asc")]);
//! assert_eq!(
//!     links.path_by_name("item", &values, None, None, None).as_deref(),
//!     Some("/items/7?sort=asc")
//! );
//! ```
//!
//! # Module Structure
//!
//! - [`core`]: route values, URL string newtypes, request context
//! - [`pattern`]: route template parsing and constraints
//! - [`endpoint`]: endpoints and their data source
//! - [`binder`]: value resolution, constraint checks, template expansion
//! - [`cache`]: per-endpoint-set caches (binders, name index)
//! - [`address`]: address kinds and the schemes that resolve them
//! - [`generator`]: the link generator and path/URI assembly
//! - [`config`]: global and per-call options
//! - [`diagnostics`]: structured link events

pub mod address;
pub mod binder;
pub mod cache;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod generator;
pub mod logger;
pub mod pattern;

pub use address::{Address, AddressKind, AddressSchemes, EndpointAddressScheme, RouteValuesAddress};
pub use binder::{BoundTemplate, TemplateBinder, TemplateValuesResult};
pub use config::{LinkOptions, RouteOptions};
pub use crate::core::{
    FragmentString, HostString, PathString, QueryString, RequestContext, RouteValue, RouteValues,
};
pub use diagnostics::{ConsoleSink, DiagnosticSink, LinkEvent, MemorySink, NullSink};
pub use endpoint::{EndpointDataSource, EndpointMetadata, InMemoryDataSource, RouteEndpoint};
pub use error::{BindFailure, LinkError};
pub use generator::{LinkGenerationTemplate, LinkGenerator, build_absolute, build_relative};
pub use pattern::{RouteConstraint, RoutePattern};
