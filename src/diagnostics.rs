//! Structured link generation events.
//!
//! The generator reports what it did through a [`DiagnosticSink`]. Events
//! carry already-formatted fields; the generator asks [`DiagnosticSink::enabled`]
//! before building them, so a disabled sink costs one call per event site.
//!
//! | Id  | Event                          |
//! |-----|--------------------------------|
//! | 100 | `EndpointsFound`               |
//! | 101 | `EndpointsNotFound`            |
//! | 102 | `TemplateSucceeded`            |
//! | 103 | `TemplateFailedRequiredValues` |
//! | 104 | `TemplateFailedExpansion`      |
//! | 105 | `LinkGenerationSucceeded`      |
//! | 106 | `LinkGenerationFailed`         |
//! | 107 | `TemplateFailedConstraint`     |

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::{log, logger};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum LinkEvent {
    EndpointsFound {
        address: String,
        endpoints: Vec<String>,
    },
    EndpointsNotFound {
        address: String,
    },
    TemplateSucceeded {
        template: String,
        endpoint: String,
        path: String,
        query: String,
    },
    TemplateFailedRequiredValues {
        template: String,
        endpoint: String,
        ambient_values: String,
        values: String,
        defaults: String,
    },
    TemplateFailedConstraint {
        template: String,
        endpoint: String,
        parameter: String,
        constraint: String,
        values: String,
    },
    TemplateFailedExpansion {
        template: String,
        endpoint: String,
        values: String,
    },
    LinkGenerationSucceeded {
        endpoints: Vec<String>,
        uri: String,
    },
    LinkGenerationFailed {
        endpoints: Vec<String>,
    },
}

impl LinkEvent {
    /// Stable numeric event id.
    pub const fn id(&self) -> u16 {
        match self {
            Self::EndpointsFound { .. } => 100,
            Self::EndpointsNotFound { .. } => 101,
            Self::TemplateSucceeded { .. } => 102,
            Self::TemplateFailedRequiredValues { .. } => 103,
            Self::TemplateFailedExpansion { .. } => 104,
            Self::LinkGenerationSucceeded { .. } => 105,
            Self::LinkGenerationFailed { .. } => 106,
            Self::TemplateFailedConstraint { .. } => 107,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::EndpointsFound { .. } => "EndpointsFound",
            Self::EndpointsNotFound { .. } => "EndpointsNotFound",
            Self::TemplateSucceeded { .. } => "TemplateSucceeded",
            Self::TemplateFailedRequiredValues { .. } => "TemplateFailedRequiredValues",
            Self::TemplateFailedExpansion { .. } => "TemplateFailedExpansion",
            Self::LinkGenerationSucceeded { .. } => "LinkGenerationSucceeded",
            Self::LinkGenerationFailed { .. } => "LinkGenerationFailed",
            Self::TemplateFailedConstraint { .. } => "TemplateFailedConstraint",
        }
    }

    /// One JSON object per event, `{"id":..,"event":..,...fields}`.
    pub fn to_json(&self) -> String {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert("id".to_string(), self.id().into());
        }
        value.to_string()
    }
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndpointsFound { address, endpoints } => write!(
                f,
                "Found the endpoints {} for address {address}",
                endpoints.join(", ")
            ),
            Self::EndpointsNotFound { address } => {
                write!(f, "No endpoints found for address {address}")
            }
            Self::TemplateSucceeded {
                template,
                endpoint,
                path,
                query,
            } => write!(
                f,
                "Successfully processed template {template} for {endpoint} resulting in {path} and {query}"
            ),
            Self::TemplateFailedRequiredValues {
                template,
                endpoint,
                ambient_values,
                values,
                defaults,
            } => write!(
                f,
                "Failed to process the template {template} for {endpoint}. \
                 A required route value is missing, or has a different value from the required default values. \
                 Supplied ambient values {ambient_values} and {values} with default values {defaults}"
            ),
            Self::TemplateFailedConstraint {
                template,
                endpoint,
                parameter,
                constraint,
                values,
            } => write!(
                f,
                "Failed to process the template {template} for {endpoint}. \
                 The constraint {constraint} for parameter {parameter} failed with values {values}"
            ),
            Self::TemplateFailedExpansion {
                template,
                endpoint,
                values,
            } => write!(
                f,
                "Failed to process the template {template} for {endpoint}. \
                 The failure occurred while expanding the template with values {values}. \
                 This is usually due to a missing or empty value in a complex segment"
            ),
            Self::LinkGenerationSucceeded { endpoints, uri } => write!(
                f,
                "Link generation succeeded for endpoints {} with result {uri}",
                endpoints.join(", ")
            ),
            Self::LinkGenerationFailed { endpoints } => write!(
                f,
                "Link generation failed for endpoints {}",
                endpoints.join(", ")
            ),
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Receiver of link events.
pub trait DiagnosticSink: Send + Sync {
    /// Callers skip building events when this returns `false`.
    fn enabled(&self) -> bool;

    fn emit(&self, event: &LinkEvent);
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    #[inline]
    fn enabled(&self) -> bool {
        false
    }

    #[inline]
    fn emit(&self, _: &LinkEvent) {}
}

/// Writes events through the logger while verbose mode is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    /// Emit JSON lines instead of human-readable messages.
    pub json: bool,
}

impl ConsoleSink {
    pub const fn json() -> Self {
        Self { json: true }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn enabled(&self) -> bool {
        logger::is_verbose()
    }

    fn emit(&self, event: &LinkEvent) {
        if self.json {
            log!("link"; "{}", event.to_json());
        } else {
            log!("link"; "({}) {event}", event.id());
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.events.lock().clone()
    }

    pub fn ids(&self) -> Vec<u16> {
        self.events.lock().iter().map(LinkEvent::id).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn enabled(&self) -> bool {
        true
    }

    fn emit(&self, event: &LinkEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_names() {
        let event = LinkEvent::EndpointsNotFound {
            address: "name(home)".into(),
        };
        assert_eq!(event.id(), 101);
        assert_eq!(event.name(), "EndpointsNotFound");
        assert_eq!(event.to_string(), "No endpoints found for address name(home)");
    }

    #[test]
    fn test_to_json() {
        let event = LinkEvent::LinkGenerationFailed {
            endpoints: vec!["a".into(), "b".into()],
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["event"], "LinkGenerationFailed");
        assert_eq!(value["id"], 106);
        assert_eq!(value["endpoints"][1], "b");
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        assert!(sink.enabled());
        sink.emit(&LinkEvent::EndpointsNotFound { address: "x".into() });
        sink.emit(&LinkEvent::LinkGenerationFailed { endpoints: vec![] });
        assert_eq!(sink.ids(), [101, 106]);
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_sink_is_disabled() {
        assert!(!NullSink.enabled());
    }
}
