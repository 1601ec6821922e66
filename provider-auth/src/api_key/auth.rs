//! API key authentication trait and implementation.

use log::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Speech-to-text vendors that authenticate with an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyProvider {
    Gladia,
    AssemblyAi,
    Deepgram,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::Gladia => "gladia",
            ApiKeyProvider::AssemblyAi => "assemblyai",
            ApiKeyProvider::Deepgram => "deepgram",
        }
    }

    /// Header name and value prefix the vendor expects its key in.
    fn header_convention(&self) -> (&'static str, Option<&'static str>) {
        match self {
            ApiKeyProvider::Gladia => ("x-gladia-key", None),
            ApiKeyProvider::AssemblyAi => ("authorization", None),
            ApiKeyProvider::Deepgram => ("authorization", Some("Token")),
        }
    }
}

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "Authorization: Token xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
}

/// Trait for producing the authentication header of a vendor request.
///
/// Implementations handle vendor-specific authentication patterns like:
/// - Gladia: `x-gladia-key: xxx`
/// - AssemblyAI: `authorization: xxx`
/// - Deepgram: `Authorization: Token xxx`
pub trait ProviderAuth: Send + Sync {
    /// Get the provider identifier.
    fn provider(&self) -> ApiKeyProvider;

    /// Get the authentication method used by this provider.
    fn auth_method(&self) -> AuthMethod;

    /// Name of the header that carries the credential.
    fn header_name(&self) -> HeaderName;

    /// Build the credential header value, marked sensitive so it never shows up in debug output.
    fn header_value(&self) -> Result<HeaderValue, Error>;

    /// Insert the credential header into `headers`.
    ///
    /// An empty key is left out entirely so that callers checking for the header
    /// can report the key as missing instead of sending an unauthenticated request.
    fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), Error>;
}

/// API key authentication implementation.
///
/// # Examples
///
/// ```rust,ignore
/// // Deepgram: Authorization: Token xxx
/// let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Deepgram, SecretString::new(key));
///
/// // A self-hosted gateway with its own header
/// let auth = ApiKeyAuth::new(ApiKeyProvider::Gladia, SecretString::new(key), "x-api-key", None);
/// ```
pub struct ApiKeyAuth {
    provider: ApiKeyProvider,
    api_key: SecretString,
    header_name: String,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    /// Create an authenticator using the vendor's standard header convention.
    pub fn for_provider(provider: ApiKeyProvider, api_key: SecretString) -> Self {
        let (header_name, prefix) = provider.header_convention();
        Self::new(provider, api_key, header_name, prefix)
    }

    /// Create an authenticator with an explicit header name and value prefix.
    pub fn new(
        provider: ApiKeyProvider,
        api_key: SecretString,
        header_name: &str,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            provider,
            api_key,
            header_name: header_name.to_ascii_lowercase(),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    /// Get a reference to the API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Whether a non-blank key was configured.
    pub fn has_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::ApiKeyHeader {
            header_name: self.header_name.clone(),
            prefix: self.prefix.clone(),
        }
    }

    fn header_name(&self) -> HeaderName {
        HeaderName::from_bytes(self.header_name.as_bytes())
            .unwrap_or(reqwest::header::AUTHORIZATION)
    }

    fn header_value(&self) -> Result<HeaderValue, Error> {
        if !self.has_key() {
            return Err(api_key_error(
                ApiKeyErrorKind::Missing,
                &format!("no API key configured for {}", self.provider.as_str()),
            ));
        }

        let raw = match &self.prefix {
            Some(prefix) => format!("{} {}", prefix, self.api_key.expose_secret()),
            None => self.api_key.expose_secret().to_string(),
        };

        let mut value = HeaderValue::from_str(&raw).map_err(|err| {
            warn!(
                "API key for {} is not a valid header value: {:?}",
                self.provider.as_str(),
                err
            );
            api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                "API key contains characters not allowed in a header",
            )
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        if !self.has_key() {
            debug!(
                "Skipping auth header for {}: no API key configured",
                self.provider.as_str()
            );
            return Ok(());
        }
        headers.insert(self.header_name(), self.header_value()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn key(value: &str) -> SecretString {
        SecretString::new(value.to_string())
    }

    #[test]
    fn test_api_key_provider_as_str() {
        assert_eq!(ApiKeyProvider::Gladia.as_str(), "gladia");
        assert_eq!(ApiKeyProvider::AssemblyAi.as_str(), "assemblyai");
        assert_eq!(ApiKeyProvider::Deepgram.as_str(), "deepgram");
    }

    #[test]
    fn test_deepgram_uses_token_prefix() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Deepgram, key("dg_key"));

        assert_eq!(auth.header_name(), reqwest::header::AUTHORIZATION);
        assert_eq!(auth.prefix, Some("Token".to_string()));
        assert_eq!(auth.header_value().unwrap(), "Token dg_key");
    }

    #[test]
    fn test_gladia_uses_custom_header_without_prefix() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Gladia, key("gl_key"));

        assert_eq!(auth.header_name().as_str(), "x-gladia-key");
        assert_eq!(auth.prefix, None);
        assert_eq!(auth.header_value().unwrap(), "gl_key");
    }

    #[test]
    fn test_header_value_is_sensitive() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::AssemblyAi, key("aai_key"));
        assert!(auth.header_value().unwrap().is_sensitive());
    }

    #[test]
    fn test_authenticate_inserts_header() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::AssemblyAi, key("aai_key"));
        let mut headers = HeaderMap::new();

        auth.authenticate(&mut headers).unwrap();

        assert_eq!(headers.get("authorization").unwrap(), "aai_key");
    }

    #[test]
    fn test_authenticate_skips_blank_key() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Gladia, key("   "));
        let mut headers = HeaderMap::new();

        auth.authenticate(&mut headers).unwrap();

        assert!(headers.is_empty());
        let err = auth.header_value().unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::ApiKey(ApiKeyErrorKind::Missing));
    }

    #[test]
    fn test_invalid_header_characters_rejected() {
        let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Gladia, key("bad\nkey"));
        let err = auth.header_value().unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::ApiKey(ApiKeyErrorKind::InvalidFormat)
        );
    }

    #[test]
    fn test_custom_header_name_is_normalized() {
        let auth = ApiKeyAuth::new(ApiKeyProvider::Gladia, key("k"), "X-Api-Key", Some(""));
        assert_eq!(
            auth.auth_method(),
            AuthMethod::ApiKeyHeader {
                header_name: "x-api-key".to_string(),
                prefix: None,
            }
        );
    }
}
