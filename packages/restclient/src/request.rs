//! Turning a call into a [`RequestDescriptor`].

use crate::config::ClientConfig;
use crate::query;
use crate::types::{Method, Parameters, RequestDescriptor};
use crate::Result;

/// Builds request descriptors from a client configuration.
pub struct RequestBuilder<'a> {
    config: &'a ClientConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a ClientConfig) -> Self {
        Self { config }
    }

    /// Build the descriptor for one call.
    ///
    /// The steps run in a fixed order:
    ///
    /// 1. A configured format is appended to `url` as `.format`.
    /// 2. A parameter map is merged over the configured defaults and encoded;
    ///    a raw parameter string is used as is.
    /// 3. POST and every other non-GET method carry the parameters as the body.
    ///    GET appends them as a query string, joined with `&` when `url`
    ///    already contains a `?`.
    /// 4. The base URL is prefixed, adding a `/` only when neither side has one.
    /// 5. Basic-auth credentials are attached when both parts are configured.
    /// 6. Configured transport options are overlaid last.
    ///
    /// # Errors
    ///
    /// Fails if a configured transport option has the wrong shape for the
    /// field it overrides.
    pub fn build(
        &self,
        url: &str,
        method: &Method,
        parameters: &Parameters,
        headers: &[(&str, &str)],
    ) -> Result<RequestDescriptor> {
        let config = self.config;
        let mut request_url = url.to_string();

        if let Some(format) = config.format.as_deref().filter(|f| !f.is_empty()) {
            request_url.push('.');
            request_url.push_str(format);
        }

        let parameters = match parameters {
            Parameters::Map(call) => {
                let mut merged = config.parameters.clone();
                for (key, value) in call {
                    merged.insert(key.clone(), value.clone());
                }
                query::encode(&merged)
            }
            Parameters::Raw(raw) => raw.clone(),
        };

        let mut body = None;
        match method {
            Method::GET => {
                if !parameters.is_empty() {
                    // TODO: check for an existing query component instead of any '?'
                    request_url.push(if url.contains('?') { '&' } else { '?' });
                    request_url.push_str(&parameters);
                }
            }
            _ => body = Some(parameters),
        }

        if let Some(base_url) = config.base_url.as_deref().filter(|b| !b.is_empty()) {
            if !request_url.starts_with('/') && !base_url.ends_with('/') {
                request_url.insert(0, '/');
            }
            request_url.insert_str(0, base_url);
        }

        let header_lines = config
            .headers
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value))
            .chain(headers.iter().map(|(name, value)| format!("{}:{}", name, value)))
            .collect();

        let mut descriptor = RequestDescriptor {
            method: method.clone(),
            url: request_url,
            headers: header_lines,
            body,
            user_agent: config.user_agent.clone(),
            credentials: config.credentials(),
            ..Default::default()
        };

        descriptor.overlay(&config.transport_options)?;

        log::debug!("Built {} request for {}", descriptor.method, descriptor.url);
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OptionValue, TransportOption};
    use crate::Error;

    fn build(
        config: &ClientConfig,
        url: &str,
        method: Method,
        parameters: impl Into<Parameters>,
    ) -> RequestDescriptor {
        RequestBuilder::new(config)
            .build(url, &method, &parameters.into(), &[])
            .unwrap()
    }

    fn base() -> ClientConfig {
        ClientConfig::new().with_base_url("http://h")
    }

    #[test]
    fn get_appends_query_string() {
        let request = build(&base(), "/x", Method::GET, [("a", "1")]);
        assert_eq!(request.url, "http://h/x?a=1");
        assert_eq!(request.body, None);
    }

    #[test]
    fn get_uses_ampersand_when_url_has_query() {
        let request = build(&base(), "/x?y=1", Method::GET, [("a", "1")]);
        assert_eq!(request.url, "http://h/x?y=1&a=1");
    }

    #[test]
    fn get_without_parameters_leaves_url_alone() {
        let request = build(&base(), "/x", Method::GET, Parameters::default());
        assert_eq!(request.url, "http://h/x");
    }

    #[test]
    fn post_puts_parameters_in_body() {
        let request = build(&base(), "/x", Method::POST, [("a", "1")]);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://h/x");
        assert_eq!(request.body.as_deref(), Some("a=1"));
    }

    #[test]
    fn other_methods_put_parameters_in_body() {
        let request = build(&base(), "/x", Method::PUT, [("a", "1")]);
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body.as_deref(), Some("a=1"));

        let request = build(&base(), "/x", Method::DELETE, Parameters::default());
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.body.as_deref(), Some(""));
    }

    #[test]
    fn raw_parameters_bypass_defaults() {
        let config = base().with_parameter("api_key", "k");

        let request = build(&config, "/x", Method::GET, "a=1&b=2");
        assert_eq!(request.url, "http://h/x?a=1&b=2");

        let request = build(&config, "/x", Method::GET, [("a", "1")]);
        assert_eq!(request.url, "http://h/x?api_key=k&a=1");
    }

    #[test]
    fn call_parameters_override_defaults_in_place() {
        let config = base().with_parameter("a", "default").with_parameter("b", "2");
        let request = build(&config, "/x", Method::POST, [("c", "3"), ("a", "1")]);
        assert_eq!(request.body.as_deref(), Some("a=1&b=2&c=3"));
    }

    #[test]
    fn format_suffix_comes_before_query() {
        let config = base().with_format("json");
        let request = build(&config, "/items", Method::GET, [("page", "2")]);
        assert_eq!(request.url, "http://h/items.json?page=2");
    }

    #[test]
    fn base_url_joining() {
        let request = build(&base(), "x", Method::GET, Parameters::default());
        assert_eq!(request.url, "http://h/x");

        let config = ClientConfig::new().with_base_url("http://h/");
        let request = build(&config, "x", Method::GET, Parameters::default());
        assert_eq!(request.url, "http://h/x");

        // Both sides have a slash: nothing is removed.
        let request = build(&config, "/x", Method::GET, Parameters::default());
        assert_eq!(request.url, "http://h//x");
    }

    #[test]
    fn without_base_url_the_url_is_used_as_is() {
        let request = build(&ClientConfig::new(), "http://other/x", Method::GET, [("a", "b c")]);
        assert_eq!(request.url, "http://other/x?a=b%20c");
    }

    #[test]
    fn headers_are_config_then_call_with_duplicates() {
        let config = base()
            .with_header("Authorization", "Bearer t")
            .with_header("Accept", "application/json");
        let request = RequestBuilder::new(&config)
            .build(
                "/x",
                &Method::GET,
                &Parameters::default(),
                &[("Accept", "text/plain"), ("X-Extra", "1")],
            )
            .unwrap();

        assert_eq!(
            request.headers,
            vec![
                "Authorization:Bearer t",
                "Accept:application/json",
                "Accept:text/plain",
                "X-Extra:1",
            ]
        );
    }

    #[test]
    fn credentials_and_user_agent() {
        let config = base().with_basic_auth("user", "pw").with_user_agent("agent/1");
        let request = build(&config, "/x", Method::GET, Parameters::default());
        assert_eq!(request.credentials.as_deref(), Some("user:pw"));
        assert_eq!(request.user_agent, "agent/1");
    }

    #[test]
    fn transport_options_override_derived_fields() {
        let config = base()
            .with_transport_option(TransportOption::Url, "http://override/y")
            .with_transport_option(TransportOption::Timeout, 9)
            .with_transport_option(TransportOption::Custom("proxy".into()), "http://p:3128");
        let request = build(&config, "/x", Method::GET, [("a", "1")]);

        assert_eq!(request.url, "http://override/y");
        assert_eq!(request.options.get(&TransportOption::Timeout), Some(&OptionValue::Int(9)));
        assert_eq!(
            request.options.get(&TransportOption::Custom("proxy".into())),
            Some(&OptionValue::from("http://p:3128"))
        );
    }

    #[test]
    fn malformed_transport_option_fails() {
        let config = base().with_transport_option(TransportOption::HttpHeader, "not a list");
        let err = RequestBuilder::new(&config)
            .build("/x", &Method::GET, &Parameters::default(), &[])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransportOption { .. }));
    }
}
