//! Body decoders and the registry that maps format names to them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;
use crate::{Error, Result};

/// Format name of the built-in JSON decoder.
pub const JSON: &str = "json";

/// Turns a raw response body into a [`Value`].
///
/// Any `Fn(&str) -> Result<Value, Error>` closure is a decoder, so most
/// callers never implement this trait by hand:
///
/// ```rust
/// use restclient::{DecoderRegistry, Value};
///
/// let mut registry = DecoderRegistry::new();
/// registry.register("text", |body: &str| -> restclient::Result<Value> {
///     Ok(Value::from(body.trim()))
/// });
///
/// assert!(registry.contains("text"));
/// ```
pub trait Decoder: Send + Sync {
    fn decode(&self, body: &str) -> Result<Value>;
}

impl<F> Decoder for F
where
    F: Fn(&str) -> Result<Value> + Send + Sync,
{
    fn decode(&self, body: &str) -> Result<Value> {
        self(body)
    }
}

/// Decodes JSON text into a [`Value`], keeping object keys in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Value> {
        let json: serde_json::Value =
            serde_json::from_str(body).map_err(|e| Error::decode(JSON, e))?;
        Ok(Value::from(json))
    }
}

/// Maps format names to decoders.
///
/// Registering a format that already exists replaces its decoder. A new
/// registry contains the built-in `json` decoder.
///
/// No native object-serialization format is registered. Register a decoder
/// for one explicitly if the server is trusted.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: BTreeMap<String, Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// Create a registry holding the built-in decoders.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(JSON, JsonDecoder);
        registry
    }

    /// Create a registry with no decoders at all.
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, format: impl Into<String>, decoder: impl Decoder + 'static) {
        self.register_arc(format, Arc::new(decoder));
    }

    pub fn register_arc(&mut self, format: impl Into<String>, decoder: Arc<dyn Decoder>) {
        let format = format.into();
        log::debug!("Registering decoder for '{}'", format);
        self.decoders.insert(format, decoder);
    }

    /// Look up the decoder for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] when nothing is registered for it.
    pub fn get(&self, format: &str) -> Result<Arc<dyn Decoder>> {
        self.decoders
            .get(format)
            .cloned()
            .ok_or_else(|| Error::UnsupportedFormat {
                format: format.to_string(),
            })
    }

    pub fn contains(&self, format: &str) -> bool {
        self.decoders.contains_key(format)
    }

    /// Registered format names, sorted.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Overlay every entry of `other` onto this registry.
    pub fn extend(&mut self, other: &DecoderRegistry) {
        for (format, decoder) in &other.decoders {
            self.decoders.insert(format.clone(), Arc::clone(decoder));
        }
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_is_built_in() {
        let registry = DecoderRegistry::new();
        let value = registry.get("json").unwrap().decode(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(value, Value::from(json!({"a": [1, 2]})));
    }

    #[test]
    fn native_serialization_is_not_built_in() {
        let registry = DecoderRegistry::new();
        assert_eq!(registry.formats().collect::<Vec<_>>(), vec!["json"]);
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let registry = DecoderRegistry::new();
        let err = registry.get("unknown").err().unwrap();
        assert!(matches!(err, Error::UnsupportedFormat { format } if format == "unknown"));
    }

    #[test]
    fn later_registration_overrides() {
        let mut registry = DecoderRegistry::new();
        registry.register("json", |_: &str| -> Result<Value> { Ok(Value::from("overridden")) });

        let value = registry.get("json").unwrap().decode("{}").unwrap();
        assert_eq!(value, Value::from("overridden"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = JsonDecoder.decode("{not json").unwrap_err();
        assert!(matches!(err, Error::Decode { format, .. } if format == "json"));
    }

    #[test]
    fn extend_overlays_entries() {
        let mut registry = DecoderRegistry::new();
        let mut extra = DecoderRegistry::empty();
        extra.register("csv", |body: &str| -> Result<Value> {
            Ok(Value::Array(body.split(',').map(Value::from).collect()))
        });

        registry.extend(&extra);

        assert!(registry.contains("json"));
        let value = registry.get("csv").unwrap().decode("a,b").unwrap();
        assert_eq!(value, Value::Array(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn empty_registry_has_nothing() {
        assert!(DecoderRegistry::empty().is_empty());
    }
}
