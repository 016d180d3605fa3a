//! # restclient
//!
//! A small REST client that builds requests from a shared configuration and
//! decodes responses lazily, choosing the decoder from the response's
//! content type.
//!
//! ## Making requests
//!
//! ```ignore
//! use restclient::{Client, ClientConfig, Parameters};
//!
//! let client = Client::new(
//!     ClientConfig::new()
//!         .with_base_url("https://api.example.com")
//!         .with_header("Authorization", "Bearer t"),
//! );
//!
//! let response = client.get("/users", [("page", "2")], &[])?;
//! println!("{}", response.status());
//!
//! // Decoded on first access, then cached
//! let first = response.get(0usize)?;
//! ```
//!
//! ## Decoders
//!
//! Only JSON is decoded out of the box. Other formats are added per client:
//!
//! ```rust
//! use restclient::{DecoderRegistry, Result, Value};
//!
//! let mut registry = DecoderRegistry::new();
//! registry.register("text", |body: &str| -> Result<Value> { Ok(Value::from(body)) });
//! assert!(registry.contains("json"));
//! assert!(registry.contains("text"));
//! ```
//!
//! ## Transports
//!
//! Requests are executed by an [`HttpExecutor`]. [`ReqwestExecutor`] is the
//! default; with the `test-utils` feature, `executor::mock::MockExecutor`
//! records requests and returns canned transfers.
//!
//! ```rust
//! use std::sync::Arc;
//! use restclient::{ClientConfig, RawTransfer, Response, Value};
//!
//! let raw = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"a\":1}";
//! let transfer = RawTransfer { output: raw.to_string(), ..Default::default() };
//! let response = Response::new(Arc::new(ClientConfig::new()), transfer);
//!
//! assert_eq!(response.get("a").unwrap(), Some(&Value::Integer(1)));
//! ```

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod format;
pub mod headers;
pub mod query;
pub mod request;
pub mod response;
pub mod types;
pub mod value;

// Re-export main types
pub use client::Client;
pub use config::{ClientConfig, ClientOption, ClientSettings};
pub use decoder::{Decoder, DecoderRegistry, JsonDecoder};
pub use error::{Error, Result};
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use format::FormatResolver;
pub use headers::{HeaderValue, ParsedHeaders};
pub use request::RequestBuilder;
pub use response::{Cursor, Entries, Response};
pub use types::{
    Method, OptionValue, Parameters, RawTransfer, RequestDescriptor, StringMap, TransferInfo,
    TransportOption, TransportOptions,
};
pub use value::{Key, Value, ValueKind};
