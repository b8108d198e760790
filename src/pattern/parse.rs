//! Textual route template parser.
//!
//! Supported syntax:
//!
//! | Syntax          | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `text`          | Literal                                   |
//! | `{name}`        | Required parameter                        |
//! | `{name?}`       | Optional parameter                        |
//! | `{name=value}`  | Parameter with default                    |
//! | `{*name}`       | Catch-all (also `{**name}`), must be last |
//! | `{a}.{b?}`      | Optional part after a `.` separator       |
//! | `{{` / `}}`     | Escaped braces                            |

use std::mem;

use super::{ParameterPart, PathSegment, PatternError, PatternPart};
use crate::core::{RouteValue, eq_ignore_case};

const INVALID_NAME_CHARS: &[char] = &['/', '{', '}', '?', '*', '=', ':'];

pub(super) fn parse_segments(text: &str) -> Result<Vec<PathSegment>, PatternError> {
    let trimmed = text
        .strip_prefix("~/")
        .or_else(|| text.strip_prefix('/'))
        .unwrap_or(text);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let raw_segments: Vec<&str> = trimmed.split('/').collect();
    let last_segment = raw_segments.len() - 1;
    let mut segments = Vec::with_capacity(raw_segments.len());
    let mut seen: Vec<String> = Vec::new();

    for (i, raw) in raw_segments.iter().enumerate() {
        if raw.is_empty() {
            return Err(PatternError::EmptySegment(text.to_string()));
        }
        let segment = parse_segment(raw)?;

        let last_part = segment.parts.len() - 1;
        for (j, part) in segment.parts.iter().enumerate() {
            let PatternPart::Parameter(param) = part else {
                continue;
            };
            if param.catch_all && (i != last_segment || j != last_part) {
                return Err(PatternError::CatchAllNotLast(param.name.clone()));
            }
            if seen.iter().any(|name| eq_ignore_case(name, &param.name)) {
                return Err(PatternError::DuplicateParameter(param.name.clone()));
            }
            seen.push(param.name.clone());
        }
        segments.push(segment);
    }

    Ok(segments)
}

fn parse_segment(raw: &str) -> Result<PathSegment, PatternError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(PatternPart::Literal(mem::take(&mut literal)));
                }
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(PatternError::UnbalancedBrace(raw.to_string()));
                        }
                        Some(c) => inner.push(c),
                    }
                }
                if matches!(parts.last(), Some(PatternPart::Parameter(_))) {
                    return Err(PatternError::AdjacentParameters(raw.to_string()));
                }
                parts.push(PatternPart::Parameter(parse_parameter(&inner)?));
            }
            '}' => return Err(PatternError::UnbalancedBrace(raw.to_string())),
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(PatternPart::Literal(literal));
    }

    let len = parts.len();
    if len > 1 {
        for (i, part) in parts.iter().enumerate() {
            if let PatternPart::Parameter(p) = part
                && p.optional
                && i != len - 1
            {
                return Err(PatternError::OptionalNotLast(p.name.clone()));
            }
        }

        // Only `{a}.{b?}`: the period must sit between two parameters
        if let PatternPart::Parameter(p) = &parts[len - 1]
            && p.optional
        {
            let period = matches!(&parts[len - 2], PatternPart::Literal(text) if text == ".");
            let after_parameter = len > 2 && matches!(parts[len - 3], PatternPart::Parameter(_));
            if !(period && after_parameter) {
                return Err(PatternError::OptionalWithoutPeriod(p.name.clone()));
            }
            parts[len - 2] = PatternPart::Separator(".".to_string());
        }
    }

    Ok(PathSegment { parts })
}

fn parse_parameter(inner: &str) -> Result<ParameterPart, PatternError> {
    let (rest, catch_all) = match inner.strip_prefix("**").or_else(|| inner.strip_prefix('*')) {
        Some(rest) => (rest, true),
        None => (inner, false),
    };
    let (head, default) = match rest.split_once('=') {
        Some((head, default)) => (head, Some(default)),
        None => (rest, None),
    };
    let (name, optional) = match head.strip_suffix('?') {
        Some(name) => (name, true),
        None => (head, false),
    };

    if let Some((name, _)) = name.split_once(':') {
        return Err(PatternError::InlineConstraint(name.to_string()));
    }
    if name.is_empty() || name.contains(INVALID_NAME_CHARS) {
        return Err(PatternError::InvalidParameterName(inner.to_string()));
    }
    if optional && default.is_some() {
        return Err(PatternError::OptionalWithDefault(name.to_string()));
    }

    Ok(ParameterPart {
        name: name.to_string(),
        default: default.map(|d| RouteValue::String(d.to_string())),
        optional,
        catch_all,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str) -> PatternPart {
        PatternPart::Parameter(ParameterPart {
            name: name.to_string(),
            default: None,
            optional: false,
            catch_all: false,
        })
    }

    #[test]
    fn test_root_templates() {
        assert!(parse_segments("").unwrap().is_empty());
        assert!(parse_segments("/").unwrap().is_empty());
        assert!(parse_segments("~/").unwrap().is_empty());
    }

    #[test]
    fn test_literal_and_parameters() {
        let segments = parse_segments("/products/{id}").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].parts, vec![PatternPart::Literal("products".into())]);
        assert_eq!(segments[1].parts, vec![param("id")]);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert_eq!(parse_segments("a/b/").unwrap().len(), 2);
    }

    #[test]
    fn test_optional_default_catch_all() {
        let segments = parse_segments("{controller=Home}/{id?}/{**path}").unwrap();
        let params: Vec<_> = segments
            .iter()
            .flat_map(|s| s.parts.iter())
            .filter_map(PatternPart::as_parameter)
            .collect();
        assert_eq!(params[0].default, Some(RouteValue::from("Home")));
        assert!(params[1].optional);
        assert!(params[2].catch_all);
        assert_eq!(params[2].name, "path");
    }

    #[test]
    fn test_complex_segment_separator() {
        let segments = parse_segments("files/{name}.{ext?}").unwrap();
        let parts = &segments[1].parts;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], PatternPart::Separator(".".into()));
    }

    #[test]
    fn test_optional_needs_period_after_parameter() {
        assert!(matches!(
            parse_segments("api/v{version?}"),
            Err(PatternError::OptionalWithoutPeriod(name)) if name == "version"
        ));
        assert!(matches!(
            parse_segments("{name}-{ext?}"),
            Err(PatternError::OptionalWithoutPeriod(_))
        ));
        assert!(matches!(
            parse_segments("x.{ext?}"),
            Err(PatternError::OptionalWithoutPeriod(_))
        ));
        assert!(parse_segments("api/{version?}").is_ok());
    }

    #[test]
    fn test_literal_before_required_stays_literal() {
        let segments = parse_segments("v{version}-{build}").unwrap();
        let parts = &segments[0].parts;
        assert_eq!(parts[0], PatternPart::Literal("v".into()));
        assert_eq!(parts[2], PatternPart::Literal("-".into()));
    }

    #[test]
    fn test_escaped_braces() {
        let segments = parse_segments("{{literal}}").unwrap();
        assert_eq!(segments[0].parts, vec![PatternPart::Literal("{literal}".into())]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_segments("a//b"), Err(PatternError::EmptySegment(_))));
        assert!(matches!(parse_segments("{id"), Err(PatternError::UnbalancedBrace(_))));
        assert!(matches!(parse_segments("id}"), Err(PatternError::UnbalancedBrace(_))));
        assert!(matches!(parse_segments("{}"), Err(PatternError::InvalidParameterName(_))));
        assert!(matches!(
            parse_segments("{a}/{A}"),
            Err(PatternError::DuplicateParameter(_))
        ));
        assert!(matches!(
            parse_segments("{*rest}/tail"),
            Err(PatternError::CatchAllNotLast(_))
        ));
        assert!(matches!(
            parse_segments("{a}{b}"),
            Err(PatternError::AdjacentParameters(_))
        ));
        assert!(matches!(
            parse_segments("{a?}.{b}"),
            Err(PatternError::OptionalNotLast(_))
        ));
        assert!(matches!(
            parse_segments("{id?=3}"),
            Err(PatternError::OptionalWithDefault(_))
        ));
        assert!(matches!(
            parse_segments("{id:int}"),
            Err(PatternError::InlineConstraint(_))
        ));
    }
}
