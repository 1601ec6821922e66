//! Vendor HTTP client builder with middleware.

use std::time::Duration;

use log::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::BackoffPolicy;
use crate::error::{http_error, Error, HttpErrorKind};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retries for transient failures.
    pub max_retries: u32,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 0,
            user_agent: format!("voice-router/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client with middleware, shared by all requests to one vendor.
pub type ProviderClient = reqwest_middleware::ClientWithMiddleware;

/// Builder for vendor HTTP clients.
///
/// Credentials are not baked into the client; each request carries its own
/// authentication header so callers can check for it before sending.
pub struct ProviderClientBuilder {
    config: HttpClientConfig,
    default_headers: Vec<(String, String)>,
}

impl ProviderClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            default_headers: Vec::new(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Add a header sent with every request.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<ProviderClient, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                warn!("Invalid default header name {name}: {err:?}");
                http_error(HttpErrorKind::InvalidHeader, "invalid default header name")
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                warn!("Invalid value for default header {name}: {err:?}");
                http_error(HttpErrorKind::InvalidHeader, "invalid default header value")
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .default_headers(headers)
            .build()?;

        let retry_policy = BackoffPolicy::new(self.config.max_retries);
        let client_with_middleware = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(client_with_middleware)
    }
}

impl Default for ProviderClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
