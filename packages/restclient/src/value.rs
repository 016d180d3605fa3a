//! The decoded body of a response.
//!
//! A decoder turns the raw body text into a [`Value`], a dynamically-typed
//! tree. The access layer only distinguishes three shapes (see
//! [`ValueKind`]): mappings are looked up by name, sequences by position and
//! scalars cannot be looked up at all.

use std::fmt;

use indexmap::IndexMap;

use crate::{Error, Result};

/// A tree-shaped value produced by a decoder.
///
/// # Design Notes
///
/// - Uses `IndexMap` so that mapping keys iterate in the order the decoder
///   produced them (for JSON, document order)
/// - Uses `i64` for integers and falls back to `Float` for anything else
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys, in insertion order.
    Map(IndexMap<String, Value>),
}

/// The coarse shape of a [`Value`], as seen by the access layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Mapping,
    Sequence,
    Scalar,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Mapping => "mapping",
            ValueKind::Sequence => "sequence",
            ValueKind::Scalar => "scalar",
        }
    }
}

/// A key into a mapping or a position in a sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{}", name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(IndexMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Map(_) => ValueKind::Mapping,
            Value::Array(_) => ValueKind::Sequence,
            _ => ValueKind::Scalar,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a direct child by key.
    ///
    /// A name is only meaningful for a mapping, although a numeric name such as
    /// `"0"` also addresses a sequence position. An index addresses a sequence
    /// position, or the mapping entry whose name is that number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when `self` is a scalar.
    pub fn lookup(&self, key: &Key) -> Result<Option<&Value>> {
        match (self, key) {
            (Value::Map(map), Key::Name(name)) => Ok(map.get(name)),
            (Value::Map(map), Key::Index(index)) => Ok(map.get(&index.to_string())),
            (Value::Array(arr), Key::Index(index)) => Ok(arr.get(*index)),
            (Value::Array(arr), Key::Name(name)) => {
                Ok(name.parse::<usize>().ok().and_then(|index| arr.get(index)))
            }
            (scalar, key) => Err(Error::TypeMismatch {
                key: key.to_string(),
                kind: scalar.kind().as_str(),
            }),
        }
    }

    /// The keys of this value in iteration order.
    ///
    /// Scalars have no keys.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Map(map) => map.keys().cloned().map(Key::Name).collect(),
            Value::Array(arr) => (0..arr.len()).map(Key::Index).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of direct children (0 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Value::Map(map) => map.len(),
            Value::Array(arr) => arr.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    // Beyond i64::MAX: keep the digits rather than round to f64
                    Value::String(n.to_string())
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds() {
        assert_eq!(Value::map().kind(), ValueKind::Mapping);
        assert_eq!(Value::array().kind(), ValueKind::Sequence);
        assert_eq!(Value::Null.kind(), ValueKind::Scalar);
        assert_eq!(Value::from("x").kind(), ValueKind::Scalar);
    }

    #[test]
    fn json_conversion_preserves_key_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        assert_eq!(
            value.keys(),
            vec![Key::from("zeta"), Key::from("alpha"), Key::from("mid")]
        );
    }

    #[test]
    fn json_numbers() {
        assert_eq!(Value::from(json!(42)), Value::Integer(42));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn json_integer_beyond_i64_keeps_its_digits() {
        let value = Value::from(json!({"id": u64::MAX}));
        assert_eq!(
            value.lookup(&Key::from("id")).unwrap(),
            Some(&Value::from("18446744073709551615"))
        );
        assert_eq!(Value::from(json!(i64::MAX as u64)), Value::Integer(i64::MAX));
    }

    #[test]
    fn accessors() {
        let value = Value::from(json!({"flag": true, "ratio": 0.5, "count": 2, "list": []}));
        assert!(value.is_map());
        assert!(!value.is_array());

        let field = |name: &str| value.lookup(&Key::from(name)).unwrap().unwrap();
        assert_eq!(field("flag").as_bool(), Some(true));
        assert_eq!(field("ratio").as_f64(), Some(0.5));
        assert_eq!(field("count").as_f64(), Some(2.0));
        assert_eq!(field("count").as_bool(), None);
        assert!(field("list").is_array());
        assert!(field("list").is_empty());
    }

    #[test]
    fn lookup_in_map() {
        let value = Value::from(json!({"a": 1, "0": "zero"}));
        assert_eq!(value.lookup(&Key::from("a")).unwrap(), Some(&Value::Integer(1)));
        assert_eq!(value.lookup(&Key::from("missing")).unwrap(), None);
        assert_eq!(
            value.lookup(&Key::Index(0)).unwrap(),
            Some(&Value::from("zero"))
        );
    }

    #[test]
    fn lookup_in_array() {
        let value = Value::from(json!(["x", "y"]));
        assert_eq!(value.lookup(&Key::Index(1)).unwrap(), Some(&Value::from("y")));
        assert_eq!(value.lookup(&Key::from("0")).unwrap(), Some(&Value::from("x")));
        assert_eq!(value.lookup(&Key::Index(5)).unwrap(), None);
        assert_eq!(value.lookup(&Key::from("x")).unwrap(), None);
    }

    #[test]
    fn lookup_in_scalar_is_type_mismatch() {
        let value = Value::from("hello");
        let err = value.lookup(&Key::from("a")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { kind: "scalar", .. }));
    }

    #[test]
    fn scalar_has_no_keys() {
        assert!(Value::Integer(3).keys().is_empty());
        assert_eq!(Value::Integer(3).len(), 0);
    }

    #[test]
    fn back_to_json() {
        let original = json!({"name": "Alice", "tags": ["a", "b"], "age": 30});
        let value = Value::from(original.clone());
        assert_eq!(serde_json::Value::from(value), original);
    }
}
