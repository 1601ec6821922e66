//! REST plumbing shared by the vendor adapters.

use log::*;
use provider_auth::api_key::{ApiKeyAuth, ProviderAuth};
use provider_auth::http::{ProviderClient, ProviderClientBuilder};
use provider_auth::providers::endpoints_for;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use transcription::types::TranscriptionProvider;
use transcription::{Error, RequestOptions};
use url::Url;

use crate::config::ProviderConfig;

/// A decoded vendor body together with the JSON it was decoded from.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub body: T,
    pub raw: Value,
}

/// HTTP client, base URL and credentials for one vendor.
pub(crate) struct VendorHttp {
    provider: TranscriptionProvider,
    client: ProviderClient,
    base_url: String,
    streaming_url: Option<String>,
    auth: ApiKeyAuth,
}

impl VendorHttp {
    pub fn new(provider: TranscriptionProvider, config: &ProviderConfig) -> Result<Self, Error> {
        let endpoints = endpoints_for(provider.api_key_provider());

        let base_url = config
            .base_url
            .clone()
            .unwrap_or(endpoints.base_url);
        Url::parse(&base_url).map_err(|err| {
            warn!("Invalid {provider} base URL {base_url}: {err}");
            Error::Configuration(format!("invalid base URL `{base_url}`: {err}"))
        })?;

        let streaming_url = config.streaming_url.clone().or(endpoints.streaming_url);
        if let Some(streaming_url) = &streaming_url {
            Url::parse(streaming_url).map_err(|err| {
                warn!("Invalid {provider} streaming URL {streaming_url}: {err}");
                Error::Configuration(format!("invalid streaming URL `{streaming_url}`: {err}"))
            })?;
        }

        let mut builder = ProviderClientBuilder::new()
            .with_timeout(config.timeout)
            .with_max_retries(config.max_retries);
        for (name, value) in &config.headers {
            builder = builder.with_default_header(name, value);
        }
        let client = builder.build()?;

        Ok(Self {
            provider,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            streaming_url,
            auth: ApiKeyAuth::for_provider(provider.api_key_provider(), config.api_key.clone()),
        })
    }

    pub fn auth(&self) -> &ApiKeyAuth {
        &self.auth
    }

    pub fn streaming_url(&self) -> Option<&str> {
        self.streaming_url.as_deref()
    }

    /// Options for [`api_wrapper`](transcription::api_wrapper) carrying the vendor credential.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::authenticated(&self.auth)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        options: &RequestOptions,
    ) -> Result<Fetched<T>, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .headers(options.headers.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach {} at {}: {:?}", self.provider, url, e);
                Error::from(e)
            })?;

        self.decode(response).await
    }

    pub async fn post<B, T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
        options: &RequestOptions,
    ) -> Result<Fetched<T>, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .headers(options.headers.clone())
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach {} at {}: {:?}", self.provider, url, e);
                Error::from(e)
            })?;

        self.decode(response).await
    }

    /// Issue a DELETE; any success status counts, the body is ignored.
    pub async fn delete(&self, path: &str, options: &RequestOptions) -> Result<(), Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let response = self
            .client
            .delete(&url)
            .headers(options.headers.clone())
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach {} at {}: {:?}", self.provider, url, e);
                Error::from(e)
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.failure(response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Fetched<T>, Error> {
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        let raw: Value = response.json().await.map_err(|e| {
            warn!("Failed to read {} response: {:?}", self.provider, e);
            Error::Deserialization(format!("invalid response from {}: {e}", self.provider))
        })?;
        let body = serde_json::from_value(raw.clone()).map_err(|e| {
            warn!("Unexpected {} response shape: {:?}", self.provider, e);
            Error::Deserialization(format!("unexpected response from {}: {e}", self.provider))
        })?;

        Ok(Fetched { body, raw })
    }

    async fn failure(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!("{} API ({}): {}", self.provider, status.as_u16(), error_text);

        Error::Http {
            status: status.as_u16(),
            message: vendor_message(status, &error_text),
        }
    }
}

/// Best human-readable message in a vendor error body.
///
/// Vendors disagree on the field: AssemblyAI uses `error`, Gladia `message`,
/// Deepgram `err_msg` or `reason`.
fn vendor_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["error", "message", "err_msg", "reason"]
            .iter()
            .find_map(|field| json.get(*field).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde::Deserialize;
    use serde_json::json;
    use transcription::ErrorCode;

    #[derive(Debug, Deserialize)]
    struct Job {
        id: String,
    }

    fn http(server: &Server) -> VendorHttp {
        let config = ProviderConfig::new("test-key").with_base_url(server.url());
        VendorHttp::new(TranscriptionProvider::AssemblyAi, &config).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let config = ProviderConfig::new("key").with_base_url("not a url");
        let err = VendorHttp::new(TranscriptionProvider::Gladia, &config)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_default_endpoints_are_used() {
        let http =
            VendorHttp::new(TranscriptionProvider::Deepgram, &ProviderConfig::new("k")).unwrap();
        assert_eq!(http.url("/v1/listen"), "https://api.deepgram.com/v1/listen");
        assert_eq!(
            http.streaming_url(),
            Some("wss://api.deepgram.com/v1/listen")
        );
    }

    #[tokio::test]
    async fn test_get_sends_auth_header_and_keeps_raw() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/transcript/abc")
            .match_header("authorization", "test-key")
            .with_status(200)
            .with_body(r#"{"id": "abc", "extra": 1}"#)
            .create_async()
            .await;

        let http = http(&server);
        let fetched: Fetched<Job> = http
            .get("/v2/transcript/abc", &[], &http.request_options())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(fetched.body.id, "abc");
        assert_eq!(fetched.raw, json!({"id": "abc", "extra": 1}));
    }

    #[tokio::test]
    async fn test_post_sends_query_and_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/listen")
            .match_query(Matcher::UrlEncoded("punctuate".into(), "true".into()))
            .match_body(Matcher::Json(json!({"url": "https://example.com/a.wav"})))
            .with_status(200)
            .with_body(r#"{"id": "job"}"#)
            .create_async()
            .await;

        let http = http(&server);
        let fetched: Fetched<Job> = http
            .post(
                "/v1/listen",
                &[("punctuate", "true".to_string())],
                &json!({"url": "https://example.com/a.wav"}),
                &http.request_options(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(fetched.body.id, "job");
    }

    #[tokio::test]
    async fn test_vendor_error_body_becomes_http_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/transcript/abc")
            .with_status(401)
            .with_body(r#"{"error": "Authentication error, API token missing/invalid"}"#)
            .create_async()
            .await;

        let http = http(&server);
        let err = http
            .get::<Job>("/v2/transcript/abc", &[], &http.request_options())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.status_code(), Some(401));
        assert!(err
            .to_string()
            .contains("Authentication error, API token missing/invalid"));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_deserialization_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/transcript/abc")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let http = http(&server);
        let err = http
            .get::<Job>("/v2/transcript/abc", &[], &http.request_options())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_success_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v2/pre-recorded/abc")
            .with_status(202)
            .create_async()
            .await;

        let http = http(&server);
        http.delete("/v2/pre-recorded/abc", &http.request_options())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_vendor_message_fallbacks() {
        assert_eq!(
            vendor_message(StatusCode::BAD_REQUEST, r#"{"message": "bad audio"}"#),
            "bad audio"
        );
        assert_eq!(
            vendor_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(vendor_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}
