//! Core types - pure abstractions shared across the codebase.

mod context;
mod url;
mod value;

pub use context::RequestContext;
pub use self::url::{FragmentString, HostString, PathString, QueryString};
pub use value::{RouteValue, RouteValues};

pub(crate) use self::url::{encode_path, encode_query_component, encode_segment};
pub(crate) use value::eq_ignore_case;
