//! Parameter constraints.
//!
//! Only the invocation contract matters to link generation: a constraint
//! sees the full combined values (ambient + explicit + defaults) and the
//! optional request, and answers yes or no.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::PatternError;
use crate::core::{RequestContext, RouteValues};

/// Predicate attached to a route parameter.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    fn matches(
        &self,
        parameter: &str,
        values: &RouteValues,
        request: Option<&RequestContext>,
    ) -> bool;

    /// Short description used in diagnostics.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

// ============================================================================
// Regex
// ============================================================================

/// Anchored, case-insensitive regex over the invariant string form of the value.
///
/// A missing value is matched as the empty string.
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    source: String,
    regex: Regex,
}

impl RegexConstraint {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::InvalidRegex(pattern.to_string(), e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }
}

impl RouteConstraint for RegexConstraint {
    fn matches(&self, parameter: &str, values: &RouteValues, _: Option<&RequestContext>) -> bool {
        let part = values.get(parameter).and_then(|v| v.to_part());
        self.regex.is_match(part.as_deref().unwrap_or_default())
    }

    fn describe(&self) -> String {
        format!("regex({})", self.source)
    }
}

// ============================================================================
// Required
// ============================================================================

/// The value must be present and non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredConstraint;

impl RouteConstraint for RequiredConstraint {
    fn matches(&self, parameter: &str, values: &RouteValues, _: Option<&RequestContext>) -> bool {
        values.get(parameter).is_some_and(|v| v.is_non_empty())
    }

    fn describe(&self) -> String {
        "required".to_string()
    }
}

// ============================================================================
// Closures
// ============================================================================

/// Named closure constraint.
pub struct FnConstraint<F> {
    name: String,
    f: F,
}

impl<F> FnConstraint<F>
where
    F: Fn(&str, &RouteValues, Option<&RequestContext>) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnConstraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConstraint").field("name", &self.name).finish()
    }
}

impl<F> RouteConstraint for FnConstraint<F>
where
    F: Fn(&str, &RouteValues, Option<&RequestContext>) -> bool + Send + Sync,
{
    fn matches(
        &self,
        parameter: &str,
        values: &RouteValues,
        request: Option<&RequestContext>,
    ) -> bool {
        (self.f)(parameter, values, request)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_is_anchored_and_case_insensitive() {
        let c = RegexConstraint::new("[a-z]+").unwrap();
        assert!(c.matches("slug", &RouteValues::from([("slug", "Hello")]), None));
        assert!(!c.matches("slug", &RouteValues::from([("slug", "hello-world")]), None));
        assert_eq!(c.describe(), "regex([a-z]+)");
    }

    #[test]
    fn test_regex_matches_numbers_and_missing() {
        let digits = RegexConstraint::new(r"\d+").unwrap();
        assert!(digits.matches("id", &RouteValues::from([("id", 42)]), None));
        assert!(!digits.matches("id", &RouteValues::new(), None));

        let maybe = RegexConstraint::new(r"\d*").unwrap();
        assert!(maybe.matches("id", &RouteValues::new(), None));
    }

    #[test]
    fn test_regex_invalid() {
        assert!(matches!(
            RegexConstraint::new("("),
            Err(PatternError::InvalidRegex(..))
        ));
    }

    #[test]
    fn test_required() {
        assert!(RequiredConstraint.matches("a", &RouteValues::from([("a", "x")]), None));
        assert!(!RequiredConstraint.matches("a", &RouteValues::from([("a", "")]), None));
        assert!(!RequiredConstraint.matches("a", &RouteValues::new(), None));
    }

    #[test]
    fn test_fn_constraint_sees_request() {
        let https_only = FnConstraint::new("https", |_: &str, _: &RouteValues, req: Option<&RequestContext>| {
            req.is_some_and(|r| r.scheme == "https")
        });
        let req = RequestContext::new("https", "example.com");
        assert!(https_only.matches("x", &RouteValues::new(), Some(&req)));
        assert!(!https_only.matches("x", &RouteValues::new(), None));
        assert_eq!(https_only.describe(), "https");
    }
}
