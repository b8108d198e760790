//! Error types.
//!
//! - [`LinkError`]: caller mistakes, reported before any endpoint is consulted
//! - [`BindFailure`]: why one candidate endpoint could not produce a link
//!
//! Not-found is never an error; generation returns `None` instead.

use thiserror::Error;

/// Usage errors at the generator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("a scheme must be provided")]
    MissingScheme,

    #[error("a host must be provided")]
    MissingHost,

    #[error("path base `{0}` must be empty or start with `/`")]
    InvalidPathBase(String),

    #[error("fragment `{0}` must be empty or start with `#`")]
    InvalidFragment(String),

    #[error("query `{0}` must be empty or start with `?`")]
    InvalidQuery(String),
}

/// Per-candidate binding failure.
///
/// Recoverable: the generator moves on to the next candidate and only
/// reports the failure through diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindFailure {
    #[error("a required route value is missing or differs from its required default")]
    MissingRequiredValue,

    #[error("constraint {constraint} for parameter `{parameter}` failed")]
    ConstraintFailed {
        parameter: String,
        constraint: String,
    },

    #[error("template expansion failed, usually a missing or empty value in a complex segment")]
    ExpansionFailed,
}
