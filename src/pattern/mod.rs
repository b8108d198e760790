//! Compiled route patterns.
//!
//! A [`RoutePattern`] is an ordered list of [`PathSegment`]s, each an ordered
//! list of [`PatternPart`]s:
//!
//! ```text
//! /blog/{year}/{slug}.{format?}
//!  ^^^^ ^^^^^^ ^^^^^^^^^^^^^^^^
//!  lit  param  param + optional separator "." + optional param
//! ```
//!
//! Defaults that name no parameter act as *filters*: explicit values for
//! those keys must equal the default or the pattern cannot produce a link.

mod constraint;
mod parse;

use std::sync::Arc;

use thiserror::Error;

pub use constraint::{FnConstraint, RegexConstraint, RequiredConstraint, RouteConstraint};

use crate::core::{RouteValue, RouteValues, eq_ignore_case};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route template `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("unbalanced brace in route segment `{0}`")]
    UnbalancedBrace(String),

    #[error("invalid parameter name `{0}`")]
    InvalidParameterName(String),

    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),

    #[error("catch-all parameter `{0}` must be the last part of the template")]
    CatchAllNotLast(String),

    #[error("segment `{0}` has two consecutive parameters without a separating literal")]
    AdjacentParameters(String),

    #[error("optional parameter `{0}` must be the last part of its segment")]
    OptionalNotLast(String),

    #[error("optional parameter `{0}` shares a segment and must follow `{{name}}.`")]
    OptionalWithoutPeriod(String),

    #[error("optional parameter `{0}` cannot have a default value")]
    OptionalWithDefault(String),

    #[error("parameter `{0}` has both an inline default and a different builder default")]
    ConflictingDefault(String),

    #[error("inline constraint on `{0}` is not supported, attach it with the pattern builder")]
    InlineConstraint(String),

    #[error("constraint names unknown parameter `{0}`")]
    UnknownConstraintParameter(String),

    #[error("invalid regex constraint `{0}`: {1}")]
    InvalidRegex(String, String),
}

// ============================================================================
// Parts & Segments
// ============================================================================

/// A route parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPart {
    pub name: String,
    pub default: Option<RouteValue>,
    pub optional: bool,
    /// Consumes the rest of the path; `/` inside the value is kept as-is.
    pub catch_all: bool,
}

impl ParameterPart {
    /// Required parameters must have a value before expansion.
    #[inline]
    pub fn is_required(&self) -> bool {
        !self.optional && !self.catch_all
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternPart {
    Literal(String),
    /// The `.` in `{name}.{ext?}`. Dropped when the trailing optional
    /// parameter has no value.
    Separator(String),
    Parameter(ParameterPart),
}

impl PatternPart {
    pub fn as_parameter(&self) -> Option<&ParameterPart> {
        match self {
            Self::Parameter(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub parts: Vec<PatternPart>,
}

/// A constraint attached to a parameter (or to any key of the combined values).
#[derive(Debug, Clone)]
pub struct ConstraintBinding {
    pub parameter: String,
    pub constraint: Arc<dyn RouteConstraint>,
}

// ============================================================================
// RoutePattern
// ============================================================================

/// Immutable compiled route template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw_text: String,
    segments: Vec<PathSegment>,
    /// Parameters in declaration order.
    parameters: Vec<ParameterPart>,
    /// Parameter defaults plus filter defaults.
    defaults: RouteValues,
    constraints: Vec<ConstraintBinding>,
}

impl RoutePattern {
    /// Parse a template without extra defaults or constraints.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        Self::builder(text).build()
    }

    pub fn builder(text: impl Into<String>) -> RoutePatternBuilder {
        RoutePatternBuilder {
            text: text.into(),
            defaults: RouteValues::new(),
            constraints: Vec::new(),
        }
    }

    #[inline]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn parameters(&self) -> &[ParameterPart] {
        &self.parameters
    }

    #[inline]
    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    #[inline]
    pub fn constraints(&self) -> &[ConstraintBinding] {
        &self.constraints
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterPart> {
        self.parameters.iter().find(|p| eq_ignore_case(&p.name, name))
    }

    /// Defaults whose key is not a parameter.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &RouteValue)> {
        self.defaults
            .iter()
            .filter(|(key, _)| self.parameter(key).is_none())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Adds defaults and constraints on top of a textual template.
#[derive(Debug)]
pub struct RoutePatternBuilder {
    text: String,
    defaults: RouteValues,
    constraints: Vec<ConstraintBinding>,
}

impl RoutePatternBuilder {
    /// Default for a parameter, or a filter default when no parameter has that name.
    pub fn default(mut self, key: impl Into<String>, value: impl Into<RouteValue>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Constraints run in the order they are added.
    pub fn constraint(
        mut self,
        parameter: impl Into<String>,
        constraint: impl RouteConstraint + 'static,
    ) -> Self {
        self.constraints.push(ConstraintBinding {
            parameter: parameter.into(),
            constraint: Arc::new(constraint),
        });
        self
    }

    pub fn build(self) -> Result<RoutePattern, PatternError> {
        let mut segments = parse::parse_segments(&self.text)?;

        // Merge builder defaults into the parameters they name
        let mut defaults = RouteValues::new();
        for segment in &mut segments {
            for part in &mut segment.parts {
                let PatternPart::Parameter(param) = part else {
                    continue;
                };
                if let Some(value) = self.defaults.get(&param.name) {
                    if matches!(&param.default, Some(inline) if !inline.route_eq(value)) {
                        return Err(PatternError::ConflictingDefault(param.name.clone()));
                    }
                    if param.optional {
                        return Err(PatternError::OptionalWithDefault(param.name.clone()));
                    }
                    param.default = Some(value.clone());
                }
                if let Some(value) = &param.default {
                    defaults.insert(param.name.clone(), value.clone());
                }
            }
        }

        let parameters: Vec<ParameterPart> = segments
            .iter()
            .flat_map(|s| s.parts.iter())
            .filter_map(PatternPart::as_parameter)
            .cloned()
            .collect();

        for (key, value) in self.defaults.iter() {
            if !parameters.iter().any(|p| eq_ignore_case(&p.name, key)) {
                defaults.insert(key, value.clone());
            }
        }

        for binding in &self.constraints {
            let known = parameters.iter().any(|p| eq_ignore_case(&p.name, &binding.parameter))
                || defaults.contains_key(&binding.parameter);
            if !known {
                return Err(PatternError::UnknownConstraintParameter(
                    binding.parameter.clone(),
                ));
            }
        }

        Ok(RoutePattern {
            raw_text: self.text,
            segments,
            parameters,
            defaults,
            constraints: self.constraints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_in_declaration_order() {
        let pattern = RoutePattern::parse("/{controller}/{action}/{id?}").unwrap();
        let names: Vec<_> = pattern.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["controller", "action", "id"]);
        assert!(pattern.parameter("ID").unwrap().optional);
    }

    #[test]
    fn test_builder_defaults_merge() {
        let pattern = RoutePattern::builder("{controller}/{action=Index}")
            .default("controller", "Home")
            .default("area", "Admin")
            .build()
            .unwrap();

        assert_eq!(
            pattern.parameter("controller").unwrap().default,
            Some(RouteValue::from("Home"))
        );
        assert_eq!(pattern.defaults().get("action"), Some(&RouteValue::from("Index")));
        let filters: Vec<_> = pattern.filters().map(|(k, _)| k).collect();
        assert_eq!(filters, ["area"]);
    }

    #[test]
    fn test_builder_rejects_conflicting_default() {
        let err = RoutePattern::builder("{action=Index}")
            .default("action", "List")
            .build()
            .unwrap_err();
        assert_eq!(err, PatternError::ConflictingDefault("action".into()));

        // same value (case-insensitive) is fine
        assert!(
            RoutePattern::builder("{action=Index}")
                .default("action", "index")
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_builder_rejects_default_on_optional() {
        let err = RoutePattern::builder("{id?}").default("id", 1).build().unwrap_err();
        assert_eq!(err, PatternError::OptionalWithDefault("id".into()));
    }

    #[test]
    fn test_builder_rejects_unknown_constraint() {
        let err = RoutePattern::builder("/items/{id}")
            .constraint("slug", RequiredConstraint)
            .build()
            .unwrap_err();
        assert_eq!(err, PatternError::UnknownConstraintParameter("slug".into()));
    }

    #[test]
    fn test_constraints_keep_order() {
        let pattern = RoutePattern::builder("/{a}/{b}")
            .constraint("b", RequiredConstraint)
            .constraint("a", RequiredConstraint)
            .build()
            .unwrap();
        let order: Vec<_> = pattern.constraints().iter().map(|c| c.parameter.as_str()).collect();
        assert_eq!(order, ["b", "a"]);
    }
}
