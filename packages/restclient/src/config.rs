//! Client configuration.
//!
//! [`ClientConfig`] is built in code with the `with_*` builders, or loaded
//! from a serialized [`ClientSettings`]:
//!
//! ```rust
//! use restclient::{ClientConfig, ClientSettings};
//!
//! let settings: ClientSettings = serde_json::from_str(r#"{
//!     "base_url": "https://api.example.com",
//!     "format": "json",
//!     "headers": {"Authorization": "Bearer t"},
//!     "transport_options": {"timeout": 5}
//! }"#).unwrap();
//!
//! let config = ClientConfig::try_from(settings).unwrap();
//! assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::decoder::{Decoder, DecoderRegistry};
use crate::format::{validate_pattern, DEFAULT_FORMAT_REGEX};
use crate::types::{OptionValue, StringMap, TransportOption, TransportOptions};
use crate::Result;

pub const DEFAULT_USER_AGENT: &str = concat!("restclient/", env!("CARGO_PKG_VERSION"));

/// Everything a [`Client`](crate::Client) needs to build requests and decode
/// responses.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent with every request, before any call-specific headers.
    pub headers: StringMap,

    /// Merged under call-specific parameters given as a map.
    pub parameters: StringMap,

    /// Overlaid onto every request last.
    pub transport_options: TransportOptions,

    pub user_agent: String,

    pub base_url: Option<String>,

    /// Forces the decoding format and is appended to every URL as `.format`.
    pub format: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    format_regex: Regex,
    decoders: DecoderRegistry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            headers: StringMap::new(),
            parameters: StringMap::new(),
            transport_options: TransportOptions::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: None,
            format: None,
            username: None,
            password: None,
            format_regex: DEFAULT_FORMAT_REGEX.clone(),
            decoders: DecoderRegistry::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_transport_option(
        mut self,
        option: TransportOption,
        value: impl Into<OptionValue>,
    ) -> Self {
        self.transport_options.set(option, value);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Replace the content-type pattern used for format detection.
    ///
    /// # Errors
    ///
    /// Fails if `pattern` does not compile or has fewer than two capture
    /// groups.
    pub fn with_format_regex(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        validate_pattern(&regex)?;
        self.format_regex = regex;
        Ok(self)
    }

    pub fn with_decoder(mut self, format: impl Into<String>, decoder: impl Decoder + 'static) -> Self {
        self.decoders.register(format, decoder);
        self
    }

    /// Overlay `decoders` onto the current registry.
    pub fn with_decoders(mut self, decoders: &DecoderRegistry) -> Self {
        self.decoders.extend(decoders);
        self
    }

    pub fn format_regex(&self) -> &Regex {
        &self.format_regex
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    pub fn register_decoder(&mut self, format: impl Into<String>, decoder: impl Decoder + 'static) {
        self.decoders.register(format, decoder);
    }

    /// `user:password` when both are set and non-empty.
    pub fn credentials(&self) -> Option<String> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(format!("{}:{}", user, password))
            }
            _ => None,
        }
    }

    /// Replace a single configuration entry.
    ///
    /// Replacing the decoders overlays the given registry onto a fresh set of
    /// built-ins, so the built-in formats stay available unless overridden.
    ///
    /// # Errors
    ///
    /// Fails if a new format pattern has fewer than two capture groups.
    pub fn set(&mut self, option: ClientOption) -> Result<()> {
        match option {
            ClientOption::Headers(headers) => self.headers = headers,
            ClientOption::Parameters(parameters) => self.parameters = parameters,
            ClientOption::TransportOptions(options) => self.transport_options = options,
            ClientOption::UserAgent(user_agent) => self.user_agent = user_agent,
            ClientOption::BaseUrl(base_url) => self.base_url = base_url,
            ClientOption::Format(format) => self.format = format,
            ClientOption::FormatRegex(regex) => {
                validate_pattern(&regex)?;
                self.format_regex = regex;
            }
            ClientOption::Decoders(decoders) => {
                let mut registry = DecoderRegistry::new();
                registry.extend(&decoders);
                self.decoders = registry;
            }
            ClientOption::Username(username) => self.username = username,
            ClientOption::Password(password) => self.password = password,
        }
        Ok(())
    }
}

/// A single configuration entry, for [`ClientConfig::set`].
#[derive(Debug, Clone)]
pub enum ClientOption {
    Headers(StringMap),
    Parameters(StringMap),
    TransportOptions(TransportOptions),
    UserAgent(String),
    BaseUrl(Option<String>),
    Format(Option<String>),
    FormatRegex(Regex),
    Decoders(DecoderRegistry),
    Username(Option<String>),
    Password(Option<String>),
}

/// Serializable client settings.
///
/// Decoders are code and cannot be loaded this way; register them on the
/// resulting [`ClientConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(skip_serializing_if = "StringMap::is_empty")]
    pub headers: StringMap,

    #[serde(skip_serializing_if = "StringMap::is_empty")]
    pub parameters: StringMap,

    #[serde(alias = "curl_options", skip_serializing_if = "TransportOptions::is_empty")]
    pub transport_options: TransportOptions,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_regex: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl TryFrom<ClientSettings> for ClientConfig {
    type Error = crate::Error;

    fn try_from(settings: ClientSettings) -> Result<Self> {
        let mut config = ClientConfig {
            headers: settings.headers,
            parameters: settings.parameters,
            transport_options: settings.transport_options,
            base_url: settings.base_url,
            format: settings.format,
            username: settings.username,
            password: settings.password,
            ..ClientConfig::default()
        };

        if let Some(user_agent) = settings.user_agent {
            config.user_agent = user_agent;
        }

        if let Some(pattern) = settings.format_regex {
            config = config.with_format_regex(&pattern)?;
        }

        Ok(config)
    }
}

impl ClientConfig {
    /// Load settings from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ClientSettings = serde_json::from_str(json)?;
        ClientConfig::try_from(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::Error;

    #[test]
    fn defaults() {
        let config = ClientConfig::new();
        assert!(config.headers.is_empty());
        assert!(config.base_url.is_none());
        assert!(config.format.is_none());
        assert!(config.decoders().contains("json"));
        assert!(config.user_agent.starts_with("restclient/"));
        assert_eq!(config.format_regex().as_str(), crate::format::DEFAULT_FORMAT_PATTERN);
    }

    #[test]
    fn credentials_need_both_parts() {
        assert_eq!(ClientConfig::new().credentials(), None);

        let mut config = ClientConfig::new();
        config.username = Some("user".to_string());
        assert_eq!(config.credentials(), None);

        let config = ClientConfig::new().with_basic_auth("user", "secret");
        assert_eq!(config.credentials(), Some("user:secret".to_string()));

        let config = ClientConfig::new().with_basic_auth("user", "");
        assert_eq!(config.credentials(), None);
    }

    #[test]
    fn format_regex_needs_two_groups() {
        let err = ClientConfig::new().with_format_regex(r"(\w+)").unwrap_err();
        assert!(matches!(err, Error::InvalidFormatPattern { .. }));

        let err = ClientConfig::new().with_format_regex(r"(\w+").unwrap_err();
        assert!(matches!(err, Error::Regex(_)));
    }

    #[test]
    fn set_single_option() {
        let mut config = ClientConfig::new();
        config
            .set(ClientOption::BaseUrl(Some("http://h".to_string())))
            .unwrap();
        config.set(ClientOption::Format(Some("json".to_string()))).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://h"));
        assert_eq!(config.format.as_deref(), Some("json"));
    }

    #[test]
    fn set_decoders_keeps_built_ins() {
        let mut supplied = DecoderRegistry::empty();
        supplied.register("text", |body: &str| -> Result<Value> { Ok(Value::from(body)) });

        let mut config = ClientConfig::new();
        config.set(ClientOption::Decoders(supplied)).unwrap();

        assert!(config.decoders().contains("json"));
        assert!(config.decoders().contains("text"));
    }

    #[test]
    fn set_rejects_bad_pattern() {
        let mut config = ClientConfig::new();
        let result = config.set(ClientOption::FormatRegex(Regex::new("x").unwrap()));
        assert!(result.is_err());
        assert_eq!(config.format_regex().as_str(), crate::format::DEFAULT_FORMAT_PATTERN);
    }

    #[test]
    fn settings_from_json() {
        let config = ClientConfig::from_json(
            r#"{
                "base_url": "http://h",
                "headers": {"B": "2", "A": "1"},
                "curl_options": {"timeout": 3},
                "user_agent": "tests/1.0",
                "format_regex": "(\\w+)/(\\w+)"
            }"#,
        )
        .unwrap();

        assert_eq!(config.headers.keys().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(
            config.transport_options.get(&TransportOption::Timeout),
            Some(&OptionValue::Int(3))
        );
        assert_eq!(config.user_agent, "tests/1.0");
        assert_eq!(config.format_regex().as_str(), r"(\w+)/(\w+)");
        assert!(config.decoders().contains("json"));
    }

    #[test]
    fn settings_with_bad_json_fail() {
        let err = ClientConfig::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
