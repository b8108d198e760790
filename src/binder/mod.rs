//! Template binding: turning route values into a path and query string.
//!
//! A [`TemplateBinder`] wraps one [`RoutePattern`] and runs three stages per
//! generation attempt:
//!
//! | Stage                                       | Failure                 |
//! |---------------------------------------------|-------------------------|
//! | [`get_values`](TemplateBinder::get_values)  | `MissingRequiredValue`  |
//! | [`try_process_constraints`](TemplateBinder::try_process_constraints) | `ConstraintFailed` |
//! | [`try_bind_values`](TemplateBinder::try_bind_values) | `ExpansionFailed` |
//!
//! Binders hold no per-call state and are shared across threads.

mod context;

use std::fmt::Write;

use crate::config::RouteOptions;
use crate::core::{QueryString, RequestContext, RouteValue, RouteValues, encode_query_component};
use crate::error::BindFailure;
use crate::pattern::{PatternPart, RoutePattern};

use context::UriBuildingContext;

/// Values produced by [`TemplateBinder::get_values`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateValuesResult {
    /// Parameter values for the path followed by supplementary values that
    /// become the query string.
    pub accepted: RouteValues,
    /// Everything constraints get to see.
    pub combined: RouteValues,
}

/// Output of a successful expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTemplate {
    /// Encoded path, always starting with `/`.
    pub path: String,
    pub query: QueryString,
}

#[derive(Debug)]
pub struct TemplateBinder {
    pattern: RoutePattern,
}

impl TemplateBinder {
    pub fn new(pattern: RoutePattern) -> Self {
        Self { pattern }
    }

    #[inline]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    // ========================================================================
    // Stage 1: value resolution
    // ========================================================================

    /// Merge ambient and explicit values with the pattern defaults.
    ///
    /// Parameters are walked in declaration order and ambient values are
    /// inherited until the first parameter whose explicit value differs from
    /// the ambient one (or that has no value from any source). From there
    /// on only explicit values count.
    pub fn get_values(
        &self,
        ambient: Option<&RouteValues>,
        values: &RouteValues,
    ) -> Result<TemplateValuesResult, BindFailure> {
        let pattern = &self.pattern;
        let mut accepted = RouteValues::with_capacity(values.len() + pattern.parameters().len());

        for param in pattern.parameters() {
            let explicit = values.get(&param.name);
            let current = ambient.and_then(|a| a.get(&param.name));

            if let (Some(explicit), Some(current)) = (explicit, current)
                && !explicit.route_eq(current)
            {
                break;
            }
            if explicit.is_none() && current.is_none() && param.default.is_none() {
                break;
            }

            match explicit {
                Some(value) if value.is_non_empty() => {
                    accepted.insert(param.name.as_str(), value.clone());
                }
                Some(_) => {}
                None => {
                    if let Some(current) = current {
                        accepted.insert(param.name.as_str(), current.clone());
                    }
                }
            }
        }

        // Explicit values the walk did not reach, parameters or not
        for (key, value) in values.iter() {
            if value.is_non_empty() {
                accepted.try_insert(key, value);
            }
        }

        for param in pattern.parameters().iter().filter(|p| p.is_required()) {
            if !accepted.contains_key(&param.name)
                && let Some(default) = &param.default
            {
                accepted.insert(param.name.as_str(), default.clone());
            }
        }

        if pattern
            .parameters()
            .iter()
            .any(|p| p.is_required() && !accepted.contains_key(&p.name))
        {
            return Err(BindFailure::MissingRequiredValue);
        }

        for (key, default) in pattern.filters() {
            if let Some(value) = values.get(key)
                && !value.route_eq(default)
            {
                return Err(BindFailure::MissingRequiredValue);
            }
        }

        let mut combined = accepted.clone();
        if let Some(ambient) = ambient {
            // Ambient parameter values were either accepted above or invalidated
            for (key, value) in ambient.iter() {
                if value.is_non_empty() && pattern.parameter(key).is_none() {
                    combined.try_insert(key, value);
                }
            }
        }
        for (key, value) in pattern.defaults().iter() {
            combined.try_insert(key, value);
        }

        Ok(TemplateValuesResult { accepted, combined })
    }

    // ========================================================================
    // Stage 2: constraints
    // ========================================================================

    /// Run constraints in declaration order, stopping at the first failure.
    pub fn try_process_constraints(
        &self,
        request: Option<&RequestContext>,
        combined: &RouteValues,
    ) -> Result<(), BindFailure> {
        for binding in self.pattern.constraints() {
            if !binding.constraint.matches(&binding.parameter, combined, request) {
                return Err(BindFailure::ConstraintFailed {
                    parameter: binding.parameter.clone(),
                    constraint: binding.constraint.describe(),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Stage 3: expansion
    // ========================================================================

    /// Expand accepted values into a path and query string.
    pub fn try_bind_values(
        &self,
        accepted: &RouteValues,
        options: &RouteOptions,
    ) -> Result<BoundTemplate, BindFailure> {
        let mut path = self.bind_path(accepted)?;
        let mut query = self.bind_query(accepted);

        if options.lowercase_urls {
            path = path.to_lowercase();
            if options.lowercase_query_strings {
                query = query.to_lowercase();
            }
        }
        if options.append_trailing_slash && !path.ends_with('/') {
            path.push('/');
        }

        Ok(BoundTemplate {
            path,
            query: QueryString::from_encoded_unchecked(query),
        })
    }

    fn bind_path(&self, accepted: &RouteValues) -> Result<String, BindFailure> {
        let mut ctx = UriBuildingContext::new();

        for segment in self.pattern.segments() {
            for (i, part) in segment.parts.iter().enumerate() {
                let param = match part {
                    PatternPart::Literal(text) | PatternPart::Separator(text) => {
                        if !ctx.accept(text, true) {
                            return Err(BindFailure::ExpansionFailed);
                        }
                        continue;
                    }
                    PatternPart::Parameter(param) => param,
                };

                let value = accepted.get(&param.name);
                let text = match value {
                    Some(RouteValue::List(_)) => return Err(BindFailure::ExpansionFailed),
                    Some(value) => value.to_part().unwrap_or_default(),
                    None => Default::default(),
                };

                let same_as_default = matches!(
                    (value, self.pattern.defaults().get(&param.name)),
                    (Some(value), Some(default)) if value.route_eq(default)
                );

                if same_as_default {
                    if !ctx.buffer(&text) {
                        return Err(BindFailure::ExpansionFailed);
                    }
                } else if !ctx.accept(&text, !param.catch_all) {
                    // `{name}.{ext?}` without ext: drop the "." and carry on
                    let after_separator =
                        i > 0 && matches!(segment.parts[i - 1], PatternPart::Separator(_));
                    if param.optional && after_separator {
                        ctx.remove_last();
                    } else {
                        return Err(BindFailure::ExpansionFailed);
                    }
                }
            }
            ctx.end_segment();
        }

        Ok(ctx.into_path())
    }

    /// Accepted values the path did not consume, in insertion order.
    fn bind_query(&self, accepted: &RouteValues) -> String {
        let mut query = String::new();
        let mut push = |key: &str, value: &RouteValue| {
            let Some(text) = value.to_part().filter(|t| !t.is_empty()) else {
                return;
            };
            query.push(if query.is_empty() { '?' } else { '&' });
            write!(
                query,
                "{}={}",
                encode_query_component(key),
                encode_query_component(&text)
            )
            .ok();
        };

        for (key, value) in accepted.iter() {
            if self.pattern.parameter(key).is_some() || self.pattern.defaults().contains_key(key) {
                continue;
            }
            match value {
                RouteValue::List(items) => items.iter().for_each(|item| push(key, item)),
                value => push(key, value),
            }
        }
        query
    }
}
