//! Per-provider adapter configuration.

use std::time::Duration;

use secrecy::SecretString;
use transcription::{PollingConfig, StreamingTimeouts};

/// Settings an adapter is built from.
///
/// Only the API key is required; everything else defaults to the vendor's
/// public endpoints, a 60 second HTTP timeout, no transport retries, the
/// standard polling budget and the standard streaming timeouts.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: SecretString,
    /// Overrides the vendor REST base URL, e.g. for a proxy or a mock server.
    pub base_url: Option<String>,
    /// Overrides the vendor WebSocket base URL.
    pub streaming_url: Option<String>,
    pub timeout: Duration,
    /// Retries for transient transport failures (connection errors, 5xx, 429).
    pub max_retries: u32,
    /// Extra headers sent with every REST request.
    pub headers: Vec<(String, String)>,
    pub polling: PollingConfig,
    pub streaming: StreamingTimeouts,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: None,
            streaming_url: None,
            timeout: Duration::from_secs(60),
            max_retries: 0,
            headers: Vec::new(),
            polling: PollingConfig::default(),
            streaming: StreamingTimeouts::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_streaming_url(mut self, streaming_url: impl Into<String>) -> Self {
        self.streaming_url = Some(streaming_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_streaming_timeouts(mut self, streaming: StreamingTimeouts) -> Self {
        self.streaming = streaming;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::new("key");

        assert_eq!(config.api_key.expose_secret(), "key");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.polling, PollingConfig::default());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
