//! Address resolution: from a logical address to candidate endpoints.
//!
//! # Address kinds
//!
//! | Kind          | Scheme                      | Candidate order        |
//! |---------------|-----------------------------|------------------------|
//! | `Name`        | [`EndpointNameScheme`]      | data source order      |
//! | `RouteValues` | [`RouteValuesScheme`]       | `order`, then source   |
//! | `Endpoints`   | [`ExplicitEndpointsScheme`] | as given               |
//!
//! Schemes are registered up front in an [`AddressSchemes`] registry and
//! handed to the generator at construction. A kind without a registered
//! scheme resolves to nothing.

mod name;
mod values;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use name::EndpointNameScheme;
pub use values::RouteValuesScheme;

use crate::core::RouteValues;
use crate::endpoint::{EndpointDataSource, RouteEndpoint};

// ============================================================================
// Address
// ============================================================================

/// Route-values address: explicit and ambient values, optionally narrowed
/// to endpoints with a given name.
#[derive(Debug, Clone, Default)]
pub struct RouteValuesAddress {
    pub route_name: Option<String>,
    pub explicit_values: RouteValues,
    pub ambient_values: Option<RouteValues>,
}

/// What the caller wants a link to.
#[derive(Debug, Clone)]
pub enum Address {
    Name(String),
    RouteValues(RouteValuesAddress),
    Endpoints(Vec<Arc<RouteEndpoint>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Name,
    RouteValues,
    Endpoints,
}

impl Address {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn route_values(route_name: Option<&str>, explicit_values: RouteValues) -> Self {
        Self::RouteValues(RouteValuesAddress {
            route_name: route_name.map(str::to_string),
            explicit_values,
            ambient_values: None,
        })
    }

    pub const fn kind(&self) -> AddressKind {
        match self {
            Self::Name(_) => AddressKind::Name,
            Self::RouteValues(_) => AddressKind::RouteValues,
            Self::Endpoints(_) => AddressKind::Endpoints,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name `{name}`"),
            Self::RouteValues(address) => {
                write!(f, "route values {}", address.explicit_values.to_diagnostic_string())?;
                if let Some(name) = &address.route_name {
                    write!(f, " (route `{name}`)")?;
                }
                Ok(())
            }
            Self::Endpoints(endpoints) => {
                f.write_str("endpoints [")?;
                for (i, endpoint) in endpoints.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{endpoint}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// Schemes
// ============================================================================

/// Resolves one kind of [`Address`] into an ordered candidate list.
///
/// Addresses of another kind resolve to an empty list.
pub trait EndpointAddressScheme: Send + Sync {
    fn find_endpoints(&self, address: &Address) -> Vec<Arc<RouteEndpoint>>;
}

/// Passes an explicit endpoint set through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEndpointsScheme;

impl EndpointAddressScheme for ExplicitEndpointsScheme {
    fn find_endpoints(&self, address: &Address) -> Vec<Arc<RouteEndpoint>> {
        match address {
            Address::Endpoints(endpoints) => endpoints.clone(),
            _ => Vec::new(),
        }
    }
}

/// Registry from address kind to scheme.
#[derive(Clone, Default)]
pub struct AddressSchemes {
    schemes: FxHashMap<AddressKind, Arc<dyn EndpointAddressScheme>>,
}

impl AddressSchemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three built-in schemes over one data source.
    pub fn with_defaults(source: Arc<dyn EndpointDataSource>) -> Self {
        Self::new()
            .register(AddressKind::Name, EndpointNameScheme::new(Arc::clone(&source)))
            .register(AddressKind::RouteValues, RouteValuesScheme::new(source))
            .register(AddressKind::Endpoints, ExplicitEndpointsScheme)
    }

    /// Register (or replace) the scheme for `kind`.
    pub fn register(
        mut self,
        kind: AddressKind,
        scheme: impl EndpointAddressScheme + 'static,
    ) -> Self {
        self.schemes.insert(kind, Arc::new(scheme));
        self
    }

    pub fn contains(&self, kind: AddressKind) -> bool {
        self.schemes.contains_key(&kind)
    }

    pub fn find_endpoints(&self, address: &Address) -> Vec<Arc<RouteEndpoint>> {
        self.schemes
            .get(&address.kind())
            .map(|scheme| scheme.find_endpoints(address))
            .unwrap_or_default()
    }
}

impl fmt::Debug for AddressSchemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressSchemes")
            .field("kinds", &self.schemes.keys().collect::<Vec<_>>())
            .finish()
    }
}
