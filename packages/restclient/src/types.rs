use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Ordered string→string mapping used for headers and parameters.
pub type StringMap = IndexMap<String, String>;

/// HTTP method for requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    /// Any other verb, stored upper-cased.
    Custom(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::Custom(verb) => verb,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            other => Method::Custom(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(method: String) -> Self {
        Method::from(method.as_str())
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl TryFrom<&Method> for http::Method {
    type Error = http::method::InvalidMethod;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        Ok(match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
            Method::PATCH => http::Method::PATCH,
            Method::HEAD => http::Method::HEAD,
            Method::OPTIONS => http::Method::OPTIONS,
            Method::Custom(verb) => http::Method::from_bytes(verb.as_bytes())?,
        })
    }
}

/// Call-specific request parameters.
///
/// A map is merged over the client's default parameters and query-encoded.
/// A raw string is sent verbatim and never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameters {
    Map(StringMap),
    Raw(String),
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::Map(StringMap::new())
    }
}

impl From<StringMap> for Parameters {
    fn from(map: StringMap) -> Self {
        Parameters::Map(map)
    }
}

impl From<&str> for Parameters {
    fn from(raw: &str) -> Self {
        Parameters::Raw(raw.to_string())
    }
}

impl From<String> for Parameters {
    fn from(raw: String) -> Self {
        Parameters::Raw(raw)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Parameters {
    fn from(pairs: [(K, V); N]) -> Self {
        Parameters::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Parameters {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Parameters::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A transport knob, named after the curl option it stands in for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportOption {
    Url,
    Post,
    CustomRequest,
    PostFields,
    HttpHeader,
    UserAgent,
    UserPwd,
    /// Whole-request timeout in seconds.
    Timeout,
    /// Connect timeout in seconds.
    ConnectTimeout,
    FollowLocation,
    MaxRedirects,
    /// Passed through to the executor untouched.
    Custom(String),
}

impl TransportOption {
    pub fn as_str(&self) -> &str {
        match self {
            TransportOption::Url => "url",
            TransportOption::Post => "post",
            TransportOption::CustomRequest => "custom_request",
            TransportOption::PostFields => "post_fields",
            TransportOption::HttpHeader => "http_header",
            TransportOption::UserAgent => "user_agent",
            TransportOption::UserPwd => "user_pwd",
            TransportOption::Timeout => "timeout",
            TransportOption::ConnectTimeout => "connect_timeout",
            TransportOption::FollowLocation => "follow_location",
            TransportOption::MaxRedirects => "max_redirects",
            TransportOption::Custom(name) => name,
        }
    }
}

impl fmt::Display for TransportOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TransportOption {
    fn from(name: &str) -> Self {
        match name {
            "url" => TransportOption::Url,
            "post" => TransportOption::Post,
            "custom_request" => TransportOption::CustomRequest,
            "post_fields" => TransportOption::PostFields,
            "http_header" => TransportOption::HttpHeader,
            "user_agent" => TransportOption::UserAgent,
            "user_pwd" => TransportOption::UserPwd,
            "timeout" => TransportOption::Timeout,
            "connect_timeout" => TransportOption::ConnectTimeout,
            "follow_location" => TransportOption::FollowLocation,
            "max_redirects" => TransportOption::MaxRedirects,
            other => TransportOption::Custom(other.to_string()),
        }
    }
}

impl From<String> for TransportOption {
    fn from(name: String) -> Self {
        TransportOption::from(name.as_str())
    }
}

impl From<TransportOption> for String {
    fn from(option: TransportOption) -> Self {
        option.as_str().to_string()
    }
}

/// The value of a transport option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(list) => Some(list),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Int(i.into())
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(list: Vec<String>) -> Self {
        OptionValue::List(list)
    }
}

/// An opaque set of transport options.
///
/// Merging is an overlay: every entry of the other set replaces the entry
/// with the same key, and every other entry is kept as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportOptions(BTreeMap<TransportOption, OptionValue>);

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: TransportOption, value: impl Into<OptionValue>) -> Self {
        self.set(option, value);
        self
    }

    pub fn set(&mut self, option: TransportOption, value: impl Into<OptionValue>) {
        self.0.insert(option, value.into());
    }

    pub fn get(&self, option: &TransportOption) -> Option<&OptionValue> {
        self.0.get(option)
    }

    pub fn remove(&mut self, option: &TransportOption) -> Option<OptionValue> {
        self.0.remove(option)
    }

    pub fn overlay(&mut self, other: &TransportOptions) {
        for (option, value) in other.iter() {
            self.0.insert(option.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransportOption, &OptionValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read an option holding a number of seconds.
    pub fn seconds(&self, option: &TransportOption) -> Option<Duration> {
        self.get(option)
            .and_then(OptionValue::as_int)
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
    }
}

impl<const N: usize> From<[(TransportOption, OptionValue); N]> for TransportOptions {
    fn from(entries: [(TransportOption, OptionValue); N]) -> Self {
        Self(entries.into_iter().collect())
    }
}

/// A transport-agnostic description of one request.
///
/// Built by [`RequestBuilder`](crate::request::RequestBuilder) and handed to an
/// [`HttpExecutor`](crate::HttpExecutor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,

    /// Final URL, including any query string.
    pub url: String,

    /// Header lines in `name:value` form, in send order. Names may repeat.
    pub headers: Vec<String>,

    /// Request body. Set for every method except GET.
    pub body: Option<String>,

    pub user_agent: String,

    /// Basic-auth credentials in `user:password` form.
    pub credentials: Option<String>,

    /// Options the descriptor does not model as fields.
    pub options: TransportOptions,
}

impl RequestDescriptor {
    /// Iterate over the header lines split into trimmed `(name, value)` pairs.
    ///
    /// Lines without a colon are skipped.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().filter_map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
        })
    }

    /// Split the credentials into user and password.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_deref()
            .map(|c| c.split_once(':').unwrap_or((c, "")))
    }

    /// Overlay transport options onto this descriptor.
    ///
    /// Options that correspond to a field replace that field; all others are
    /// stored in [`options`](Self::options).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransportOption`] when a field-backed option
    /// holds a value of the wrong shape.
    pub fn overlay(&mut self, options: &TransportOptions) -> Result<()> {
        for (option, value) in options.iter() {
            let invalid = |expected: &str| Error::InvalidTransportOption {
                option: option.to_string(),
                message: format!("expected {}, got {:?}", expected, value),
            };

            match option {
                TransportOption::Url => {
                    self.url = value.as_text().ok_or_else(|| invalid("text"))?.to_string();
                }
                TransportOption::Post => {
                    if value.as_bool().ok_or_else(|| invalid("bool"))? {
                        self.method = Method::POST;
                    } else if self.method == Method::POST {
                        self.method = Method::GET;
                    }
                }
                TransportOption::CustomRequest => {
                    self.method = Method::from(value.as_text().ok_or_else(|| invalid("text"))?);
                }
                TransportOption::PostFields => {
                    self.body = Some(value.as_text().ok_or_else(|| invalid("text"))?.to_string());
                }
                TransportOption::HttpHeader => {
                    self.headers = value.as_list().ok_or_else(|| invalid("list"))?.to_vec();
                }
                TransportOption::UserAgent => {
                    self.user_agent = value.as_text().ok_or_else(|| invalid("text"))?.to_string();
                }
                TransportOption::UserPwd => {
                    self.credentials =
                        Some(value.as_text().ok_or_else(|| invalid("text"))?.to_string());
                }
                _ => self.options.set(option.clone(), value.clone()),
            }
        }
        Ok(())
    }
}

/// Transport metadata for one exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferInfo {
    /// HTTP status code, 0 when no response was received.
    pub status: u16,

    /// URL of the final request, after redirects.
    pub effective_url: String,

    /// Time spent on the exchange.
    pub total_time: Duration,

    /// Size of the raw header block in bytes.
    pub header_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Everything an executor hands back for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransfer {
    /// Status line, header lines, a blank line, then the body.
    pub output: String,

    pub info: TransferInfo,

    /// Transport error, empty when none.
    pub error: String,
}

impl RawTransfer {
    /// A transfer that never produced output.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }
}
