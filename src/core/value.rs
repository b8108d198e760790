//! Route values - the currency of link generation.
//!
//! Three [`RouteValues`] participate in every generation call:
//!
//! - ambient values (from the current request, optional)
//! - explicit values (supplied by the caller)
//! - default values (declared on the route pattern)
//!
//! Keys are case-insensitive and the map remembers insertion order, which
//! decides the order of generated query parameters.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ============================================================================
// RouteValue
// ============================================================================

/// A single route value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteValue {
    /// Explicit absence. Clears an ambient value without supplying a new one.
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Multi-valued; only meaningful in the query string (`k=a&k=b`).
    List(Vec<RouteValue>),
}

impl RouteValue {
    /// Non-empty route parts are everything except `Null` and `""`.
    #[inline]
    pub fn is_non_empty(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Route equality: strings compare case-insensitively, everything else
    /// structurally. `Null` only equals `Null`.
    pub fn route_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => eq_ignore_case(a, b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.route_eq(y))
            }
            (a, b) => a == b,
        }
    }

    /// Invariant string form used in paths and query strings.
    ///
    /// Returns `None` for `Null` and for lists, which have no single-part form.
    pub fn to_part(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "True" } else { "False" })),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
        }
    }
}

impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            other => f.write_str(other.to_part().as_deref().unwrap_or_default()),
        }
    }
}

impl From<&str> for RouteValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for RouteValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for RouteValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for RouteValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for RouteValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for RouteValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<RouteValue>> From<Option<T>> for RouteValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<RouteValue>> From<Vec<T>> for RouteValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Case-insensitive comparison without allocating.
#[inline]
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ============================================================================
// RouteValues
// ============================================================================

/// Most routes carry a handful of values; keep them inline.
type Entries = SmallVec<[(String, RouteValue); 4]>;

/// Insertion-ordered map from case-insensitive key to [`RouteValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteValues {
    entries: Entries,
}

impl RouteValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| eq_ignore_case(k, key))
    }

    pub fn get(&self, key: &str) -> Option<&RouteValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace. A replaced entry keeps its original position and key spelling.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RouteValue>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only if the key is not present yet. Returns whether it was inserted.
    pub fn try_insert(&mut self, key: &str, value: &RouteValue) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.entries.push((key.to_string(), value.clone()));
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<RouteValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Diagnostic form: `{ "a": "1", "b": "2" }`, sorted by key.
    pub fn to_diagnostic_string(&self) -> String {
        if self.is_empty() {
            return "{ }".to_string();
        }
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
        let body = sorted
            .iter()
            .map(|(k, v)| format!("\"{k}\": \"{v}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{ {body} }}")
    }
}

impl<K: Into<String>, V: Into<RouteValue>> FromIterator<(K, V)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl<K: Into<String>, V: Into<RouteValue>, const N: usize> From<[(K, V); N]> for RouteValues {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a RouteValues {
    type Item = (&'a str, &'a RouteValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a RouteValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl Serialize for RouteValues {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RouteValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // preserve_order keeps the document order here
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut values = Self::with_capacity(map.len());
        for (k, v) in map {
            let v: RouteValue = serde_json::from_value(v).map_err(serde::de::Error::custom)?;
            values.insert(k, v);
        }
        Ok(values)
    }
}
