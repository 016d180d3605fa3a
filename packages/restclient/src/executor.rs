//! HTTP execution abstraction.
//!
//! The client never talks to the network itself. It hands a
//! [`RequestDescriptor`] to an [`HttpExecutor`] and gets back the raw output
//! stream plus transfer metadata. This makes the transport swappable and lets
//! tests run without network calls.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;

use crate::types::{OptionValue, RawTransfer, RequestDescriptor, TransferInfo, TransportOption};

/// Content type sent with a body when the caller did not set one.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Trait for executing HTTP requests.
///
/// Implementations can use real HTTP clients or mock responses for testing.
pub trait HttpExecutor: Send + Sync {
    /// Execute a request and return the raw transfer.
    ///
    /// The output stream holds the status line, the header lines, a blank line
    /// and then the body. Returns `Err` with a message if the transport fails.
    fn execute(&self, request: &RequestDescriptor) -> Result<RawTransfer, String>;
}

/// Production HTTP executor using blocking reqwest.
///
/// Every call builds its own `reqwest` client from the request's transport
/// options and drops it when the call returns, so no connection state is
/// shared between requests.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    timeout: Duration,
}

impl ReqwestExecutor {
    /// Create a new executor with the given default timeout.
    ///
    /// A `timeout` transport option on a request takes precedence.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Self {
        Self::new(Duration::from_secs(30))
    }

    fn client_for(&self, request: &RequestDescriptor) -> Result<Client, String> {
        let options = &request.options;

        let mut builder = Client::builder()
            .timeout(options.seconds(&TransportOption::Timeout).unwrap_or(self.timeout));

        // An explicit User-Agent header line replaces the configured agent.
        let has_user_agent_header = request
            .header_pairs()
            .any(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT.as_str()));
        if !has_user_agent_header {
            builder = builder.user_agent(request.user_agent.as_str());
        }

        if let Some(connect_timeout) = options.seconds(&TransportOption::ConnectTimeout) {
            builder = builder.connect_timeout(connect_timeout);
        }

        let follow = options
            .get(&TransportOption::FollowLocation)
            .and_then(OptionValue::as_bool)
            .unwrap_or(true);
        let policy = if follow {
            let max = options
                .get(&TransportOption::MaxRedirects)
                .and_then(OptionValue::as_int)
                .and_then(|max| usize::try_from(max).ok())
                .unwrap_or(DEFAULT_MAX_REDIRECTS);
            Policy::limited(max)
        } else {
            Policy::none()
        };
        builder = builder.redirect(policy);

        for (option, _) in options.iter() {
            if let TransportOption::Custom(name) = option {
                log::debug!("Ignoring transport option '{}' unknown to reqwest", name);
            }
        }

        builder.build().map_err(|e| e.to_string())
    }
}

impl Default for ReqwestExecutor {
    fn default() -> Self {
        Self::with_default_timeout()
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &RequestDescriptor) -> Result<RawTransfer, String> {
        let started = Instant::now();
        let url = url::Url::parse(&request.url).map_err(|e| e.to_string())?;
        let client = self.client_for(request)?;
        let method = http::Method::try_from(&request.method).map_err(|e| e.to_string())?;

        let mut headers = HeaderMap::new();
        for (name, value) in request.header_pairs() {
            let header_name = HeaderName::try_from(name).map_err(|e| e.to_string())?;
            let header_value = HeaderValue::try_from(value).map_err(|e| e.to_string())?;
            headers.append(header_name, header_value);
        }

        if request.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }

        let mut req_builder = client.request(method, url).headers(headers);

        if let Some((user, password)) = request.basic_auth() {
            req_builder = req_builder.basic_auth(user, Some(password));
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        log::debug!("Sending {} {}", request.method, request.url);
        let response = req_builder.send().map_err(|e| e.to_string())?;

        let status = response.status();
        let mut output = format!(
            "{:?} {} {}\r\n",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        for (name, value) in response.headers() {
            output.push_str(name.as_str());
            output.push_str(": ");
            output.push_str(&String::from_utf8_lossy(value.as_bytes()));
            output.push_str("\r\n");
        }
        output.push_str("\r\n");
        let header_size = output.len();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let effective_url = response.url().to_string();

        let body_text = response.text().map_err(|e| e.to_string())?;
        output.push_str(&body_text);

        Ok(RawTransfer {
            output,
            info: TransferInfo {
                status: status.as_u16(),
                effective_url,
                total_time: started.elapsed(),
                header_size,
                content_type,
            },
            error: String::new(),
        })
    }
}

/// Mock HTTP executor for testing.
///
/// Returns predefined transfers based on request matching.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// A mock HTTP executor that returns predefined transfers.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Transfers keyed by request URL.
        responses: Arc<Mutex<HashMap<String, RawTransfer>>>,
        /// Default transfer when no match found.
        default_response: Arc<Mutex<Option<RawTransfer>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<RequestDescriptor>>>,
        /// Error message to fail every request with.
        failure: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        /// Create a new mock executor.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a transfer for a specific URL.
        pub fn with_response(self, url: impl Into<String>, response: RawTransfer) -> Self {
            self.responses.lock().unwrap().insert(url.into(), response);
            self
        }

        /// Set a default transfer when no URL matches.
        pub fn with_default_response(self, response: RawTransfer) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<RequestDescriptor> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Build a transfer from its parts.
        pub fn transfer(status: u16, reason: &str, headers: &[(&str, &str)], body: &str) -> RawTransfer {
            let mut output = format!("HTTP/1.1 {} {}\r\n", status, reason);
            for (name, value) in headers {
                output.push_str(&format!("{}: {}\r\n", name, value));
            }
            output.push_str("\r\n");
            let header_size = output.len();
            output.push_str(body);

            let content_type = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
                .map(|(_, value)| value.to_string());

            RawTransfer {
                output,
                info: TransferInfo {
                    status,
                    header_size,
                    content_type,
                    ..Default::default()
                },
                error: String::new(),
            }
        }

        /// A 200 response carrying `body` as JSON.
        pub fn json_response(body: serde_json::Value) -> RawTransfer {
            Self::transfer(
                200,
                "OK",
                &[("Content-Type", "application/json")],
                &body.to_string(),
            )
        }

        /// A 404 Not Found response with no body.
        pub fn not_found() -> RawTransfer {
            Self::transfer(404, "Not Found", &[], "")
        }
    }

    impl HttpExecutor for MockExecutor {
        fn execute(&self, request: &RequestDescriptor) -> Result<RawTransfer, String> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(message);
            }

            if let Some(response) = self.responses.lock().unwrap().get(&request.url) {
                let mut response = response.clone();
                response.info.effective_url = request.url.clone();
                return Ok(response);
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                let mut response = response.clone();
                response.info.effective_url = request.url.clone();
                return Ok(response);
            }

            Ok(Self::not_found())
        }
    }
}
