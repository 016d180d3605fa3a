use std::sync::Arc;

use crate::config::{ClientConfig, ClientOption};
use crate::decoder::Decoder;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::types::{Method, Parameters, RawTransfer};
use crate::Result;

/// A REST client bound to one configuration.
///
/// ```ignore
/// use restclient::{Client, ClientConfig, Parameters};
///
/// let client = Client::new(
///     ClientConfig::new()
///         .with_base_url("https://api.example.com")
///         .with_header("Authorization", "Bearer t")
///         .with_format("json"),
/// );
///
/// // GET https://api.example.com/items.json?page=2
/// let response = client.get("/items", [("page", "2")], &[])?;
/// if response.has_error() {
///     eprintln!("transport failed: {}", response.error());
/// }
/// for (key, value) in response.iter()? {
///     println!("{key}: {value:?}");
/// }
/// ```
pub struct Client {
    config: Arc<ClientConfig>,
    executor: Box<dyn HttpExecutor>,
}

impl Client {
    /// Create a client that executes requests with reqwest.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_executor(config, ReqwestExecutor::with_default_timeout())
    }

    pub fn with_executor(config: ClientConfig, executor: impl HttpExecutor + 'static) -> Self {
        Self {
            config: Arc::new(config),
            executor: Box::new(executor),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace one configuration entry.
    ///
    /// Responses already returned keep the configuration they were created
    /// with.
    pub fn set_option(&mut self, option: ClientOption) -> Result<()> {
        Arc::make_mut(&mut self.config).set(option)
    }

    /// Register (or replace) the decoder for `format`.
    pub fn register_decoder(&mut self, format: impl Into<String>, decoder: impl Decoder + 'static) {
        Arc::make_mut(&mut self.config).register_decoder(format, decoder);
    }

    /// Execute a GET request.
    pub fn get(
        &self,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(url, Method::GET, parameters, headers)
    }

    /// Execute a POST request.
    pub fn post(
        &self,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(url, Method::POST, parameters, headers)
    }

    /// Execute a PUT request.
    pub fn put(
        &self,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(url, Method::PUT, parameters, headers)
    }

    /// Execute a DELETE request.
    pub fn delete(
        &self,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(url, Method::DELETE, parameters, headers)
    }

    /// Execute a request with any method.
    ///
    /// Transport failures do not fail this call: they are recorded on the
    /// returned [`Response`] and must be checked with [`Response::error`].
    ///
    /// # Errors
    ///
    /// Fails only if the request cannot be built from the configuration.
    pub fn execute(
        &self,
        url: &str,
        method: impl Into<Method>,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let method = method.into();
        let descriptor =
            RequestBuilder::new(&self.config).build(url, &method, &parameters.into(), headers)?;

        let transfer = match self.executor.execute(&descriptor) {
            Ok(transfer) => transfer,
            Err(error) => {
                log::warn!("{} {} failed: {}", descriptor.method, descriptor.url, error);
                RawTransfer::failed(error)
            }
        };

        log::debug!(
            "{} {} returned status {}",
            descriptor.method,
            descriptor.url,
            transfer.info.status
        );
        Ok(Response::new(Arc::clone(&self.config), transfer))
    }
}
