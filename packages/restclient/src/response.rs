//! The response wrapper and its lazily decoded body.
//!
//! A [`Response`] keeps the raw body untouched until something asks for the
//! decoded structure. The first call to [`Response::decode`], a lookup or a
//! [`Cursor::rewind`] resolves the format, runs the decoder and caches the
//! result for the lifetime of the response.
//!
//! ```rust
//! use std::sync::Arc;
//! use restclient::{ClientConfig, RawTransfer, Response, Value};
//!
//! let transfer = RawTransfer {
//!     output: "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"a\":1,\"b\":2}".into(),
//!     ..Default::default()
//! };
//! let response = Response::new(Arc::new(ClientConfig::new()), transfer);
//!
//! assert_eq!(response.get("a").unwrap(), Some(&Value::Integer(1)));
//!
//! let keys: Vec<String> = response.iter().unwrap().map(|(k, _)| k.to_string()).collect();
//! assert_eq!(keys, vec!["a", "b"]);
//! ```

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::format::FormatResolver;
use crate::headers::{self, ParsedHeaders, RawParts};
use crate::types::{RawTransfer, TransferInfo};
use crate::value::{Key, Value};
use crate::{Error, Result};

/// The result of one executed request.
#[derive(Debug)]
pub struct Response {
    status_line: String,
    body: String,
    headers: ParsedHeaders,
    info: TransferInfo,
    error: String,
    config: Arc<ClientConfig>,
    decoded: OnceLock<Value>,
    // Serialises first decodes so the decoder runs at most once.
    decode_lock: Mutex<()>,
}

impl Response {
    /// Wrap a raw transfer, splitting its output into headers and body.
    pub fn new(config: Arc<ClientConfig>, transfer: RawTransfer) -> Self {
        let parts = headers::parse(&transfer.output);
        Self::from_parts(config, parts, transfer.info, transfer.error)
    }

    pub fn from_parts(
        config: Arc<ClientConfig>,
        parts: RawParts,
        info: TransferInfo,
        error: String,
    ) -> Self {
        Self {
            status_line: parts.status_line,
            body: parts.body,
            headers: parts.headers,
            info,
            error,
            config,
            decoded: OnceLock::new(),
            decode_lock: Mutex::new(()),
        }
    }

    /// The raw response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &ParsedHeaders {
        &self.headers
    }

    pub fn info(&self) -> &TransferInfo {
        &self.info
    }

    /// The transport error, empty when the transfer succeeded.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// HTTP status code, 0 when no response was received.
    pub fn status(&self) -> u16 {
        self.info.status
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.info.status)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the body has been decoded yet.
    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }

    /// Decode the body, or return the cached result of the first decode.
    ///
    /// A failed decode is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// - [`Error::NoResponse`] when the body is empty
    /// - [`Error::UndeterminedFormat`] when no format can be resolved
    /// - [`Error::UnsupportedFormat`] when no decoder is registered for it
    /// - whatever the decoder itself returns
    pub fn decode(&self) -> Result<&Value> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }

        let _guard = self
            .decode_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished decoding while we waited.
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }

        let format = FormatResolver::new(self.config.format.as_deref(), self.config.format_regex())
            .resolve(&self.headers, &self.body)?;
        let decoder = self.config.decoders().get(&format)?;

        log::debug!("Decoding {} byte response as '{}'", self.body.len(), format);
        let value = decoder.decode(&self.body)?;

        Ok(self.decoded.get_or_init(|| value))
    }

    /// Decode the body and map it onto a serde type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let json = serde_json::Value::from(self.decode()?.clone());
        Ok(serde_json::from_value(json)?)
    }

    /// Look up a key in the decoded body.
    ///
    /// Returns `Ok(None)` when the key is missing.
    ///
    /// # Errors
    ///
    /// Any decode error, or [`Error::TypeMismatch`] when the body decoded to a
    /// scalar.
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<&Value>> {
        self.decode()?.lookup(&key.into())
    }

    /// Whether the decoded body has a non-null value at `key`.
    pub fn has(&self, key: impl Into<Key>) -> Result<bool> {
        Ok(self.get(key)?.is_some_and(|value| !value.is_null()))
    }

    /// Always fails: decoded data is read-only.
    pub fn set(&self, _key: impl Into<Key>, _value: impl Into<Value>) -> Result<()> {
        Err(Error::ImmutableResponse)
    }

    /// Always fails: decoded data is read-only.
    pub fn unset(&self, _key: impl Into<Key>) -> Result<()> {
        Err(Error::ImmutableResponse)
    }

    /// Iterate over the decoded body's `(key, value)` pairs.
    ///
    /// A scalar body yields nothing.
    pub fn iter(&self) -> Result<Entries<'_>> {
        Ok(Entries {
            value: self.decode()?,
            position: 0,
        })
    }

    /// A rewindable cursor over the decoded body.
    ///
    /// The cursor starts out invalid; call [`Cursor::rewind`] to decode and
    /// position it on the first entry.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            response: self,
            value: None,
            keys: Vec::new(),
            position: 0,
        }
    }
}

/// Iterator over the entries of a decoded body.
#[derive(Debug, Clone)]
pub struct Entries<'r> {
    value: &'r Value,
    position: usize,
}

impl<'r> Iterator for Entries<'r> {
    type Item = (Key, &'r Value);

    fn next(&mut self) -> Option<Self::Item> {
        let value: &'r Value = self.value;
        let position = self.position;
        let entry = match value {
            Value::Map(map) => map
                .get_index(position)
                .map(|(name, value)| (Key::Name(name.clone()), value)),
            Value::Array(arr) => arr
                .get(position)
                .map(|value| (Key::Index(position), value)),
            _ => None,
        }?;
        self.position += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.value.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// An explicit cursor over a decoded body.
///
/// The key order is computed once per [`rewind`](Cursor::rewind) and lookups
/// through [`current`](Cursor::current) never move the cursor.
#[derive(Debug)]
pub struct Cursor<'r> {
    response: &'r Response,
    value: Option<&'r Value>,
    keys: Vec<Key>,
    position: usize,
}

impl<'r> Cursor<'r> {
    /// Decode the body if needed and move to the first entry.
    pub fn rewind(&mut self) -> Result<()> {
        let value = self.response.decode()?;
        self.keys = value.keys();
        self.value = Some(value);
        self.position = 0;
        Ok(())
    }

    /// Whether the cursor points at an entry, null values included.
    pub fn valid(&self) -> bool {
        self.value.is_some() && self.position < self.keys.len()
    }

    pub fn key(&self) -> Option<&Key> {
        self.keys.get(self.position)
    }

    pub fn current(&self) -> Option<&'r Value> {
        let key = self.key()?;
        self.value?.lookup(key).ok().flatten()
    }

    /// Move to the next entry.
    pub fn advance(&mut self) {
        if self.position < self.keys.len() {
            self.position += 1;
        }
    }
}
