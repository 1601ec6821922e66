//! Error types for transcription operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal error type that adapters, the poller and the streaming layer produce.
///
/// Public batch operations never return this directly. It is converted into a
/// [`TranscriptionError`] and carried inside a failed response, so every variant
/// maps onto exactly one [`ErrorCode`].
#[derive(Debug)]
pub enum Error {
    /// The vendor rejected the credentials (HTTP 401/403 or an invalid key format).
    Authentication(String),

    /// No API key was configured for the vendor.
    MissingApiKey(String),

    /// Connection failures, DNS failures, dropped sockets.
    Network(String),

    /// The vendor answered with a non-success HTTP status.
    Http { status: u16, message: String },

    /// Invalid client-side configuration such as a malformed base URL.
    Configuration(String),

    /// The vendor reported a business-level failure in a successful HTTP response.
    Provider(String),

    /// The operation exceeded its time budget.
    Timeout(String),

    /// The requested transcript does not exist.
    NotFound(String),

    /// The vendor or adapter does not offer the requested operation.
    NotSupported(String),

    /// The caller supplied input the adapter cannot accept.
    InvalidInput(String),

    /// WebSocket transport failures.
    WebSocket(String),

    /// Failed to serialize a vendor request.
    Serialization(String),

    /// Failed to deserialize a vendor response.
    Deserialization(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wire error code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Authentication(_) => ErrorCode::Unauthorized,
            Error::MissingApiKey(_) => ErrorCode::MissingApiKey,
            Error::Network(_) => ErrorCode::HttpError,
            Error::Http { status, .. } if *status == 401 || *status == 403 => {
                ErrorCode::Unauthorized
            }
            Error::Http { .. } | Error::NotFound(_) => ErrorCode::HttpError,
            Error::Configuration(_) => ErrorCode::ValidationError,
            Error::Provider(_) => ErrorCode::ProviderError,
            Error::Timeout(_) => ErrorCode::ConnectionTimeout,
            Error::NotSupported(_) => ErrorCode::NotSupported,
            Error::InvalidInput(_) => ErrorCode::InvalidInput,
            Error::WebSocket(_) => ErrorCode::WebsocketError,
            Error::Deserialization(_) => ErrorCode::ParseError,
            Error::Serialization(_) | Error::Other(_) => ErrorCode::UnknownError,
        }
    }

    /// HTTP status associated with the failure, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::MissingApiKey(msg) => write!(f, "Missing API key: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::WebSocket(msg) => write!(f, "WebSocket error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_decode() {
            Error::Deserialization(err.to_string())
        } else if let Some(status) = err.status() {
            Error::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_builder() {
            Error::Configuration(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => Error::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Serialization(err.to_string())
        } else {
            Error::Deserialization(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(err.to_string())
    }
}

impl From<provider_auth::Error> for Error {
    fn from(err: provider_auth::Error) -> Self {
        use provider_auth::error::{ApiKeyErrorKind, HttpErrorKind};
        use provider_auth::ErrorKind;

        let message = err.to_string();
        match err.error_kind {
            ErrorKind::ApiKey(ApiKeyErrorKind::Missing) => Error::MissingApiKey(message),
            ErrorKind::ApiKey(ApiKeyErrorKind::InvalidFormat) => Error::Authentication(message),
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
            | ErrorKind::Http(HttpErrorKind::InvalidHeader) => Error::Configuration(message),
            ErrorKind::Http(_) => Error::Network(message),
        }
    }
}

/// Stable error codes reported in failed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "TRANSCRIPTION_ERROR")]
    TranscriptionError,
    #[serde(rename = "POLLING_TIMEOUT")]
    PollingTimeout,
    #[serde(rename = "PARSE_ERROR")]
    ParseError,
    #[serde(rename = "WEBSOCKET_ERROR")]
    WebsocketError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(rename = "MISSING_API_KEY")]
    MissingApiKey,
    #[serde(rename = "Unauthorized")]
    Unauthorized,
    #[serde(rename = "HTTP_ERROR")]
    HttpError,
    #[serde(rename = "UNKNOWN_ERROR")]
    UnknownError,
    #[serde(rename = "CONNECTION_TIMEOUT")]
    ConnectionTimeout,
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    #[serde(rename = "NOT_SUPPORTED")]
    NotSupported,
    #[serde(rename = "PROVIDER_ERROR")]
    ProviderError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TranscriptionError => "TRANSCRIPTION_ERROR",
            ErrorCode::PollingTimeout => "POLLING_TIMEOUT",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::WebsocketError => "WEBSOCKET_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::MissingApiKey => "MISSING_API_KEY",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::HttpError => "HTTP_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotSupported => "NOT_SUPPORTED",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
        }
    }

    /// Message used when a failure carries no vendor detail.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::TranscriptionError => "Transcription failed",
            ErrorCode::PollingTimeout => "Transcription did not complete within the polling budget",
            ErrorCode::ParseError => "Failed to parse provider message",
            ErrorCode::WebsocketError => "WebSocket connection error",
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::MissingApiKey => "API key is required",
            ErrorCode::Unauthorized => "Provider rejected the credentials",
            ErrorCode::HttpError => "HTTP request failed",
            ErrorCode::UnknownError => "An unknown error occurred",
            ErrorCode::ConnectionTimeout => "Connection timed out",
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::NotSupported => "Operation not supported by this provider",
            ErrorCode::ProviderError => "Provider returned an error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure payload carried by failed responses and streaming error callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl TranscriptionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    /// Error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for TranscriptionError {}

impl From<Error> for TranscriptionError {
    fn from(err: Error) -> Self {
        let error = TranscriptionError::new(err.code(), err.to_string());
        match err.status_code() {
            Some(status) => error.with_status_code(status),
            None => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_serializes_to_wire_string() {
        assert_eq!(
            serde_json::to_value(ErrorCode::PollingTimeout).unwrap(),
            json!("POLLING_TIMEOUT")
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::Unauthorized).unwrap(),
            json!("Unauthorized")
        );
    }

    #[test]
    fn test_as_str_matches_serde_name() {
        for code in [
            ErrorCode::TranscriptionError,
            ErrorCode::ParseError,
            ErrorCode::MissingApiKey,
            ErrorCode::Unauthorized,
            ErrorCode::NotSupported,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), json!(code.as_str()));
        }
    }

    #[test]
    fn test_http_unauthorized_maps_to_unauthorized_code() {
        let err = Error::Http {
            status: 401,
            message: "invalid key".to_string(),
        };
        let converted = TranscriptionError::from(err);

        assert_eq!(converted.code, ErrorCode::Unauthorized);
        assert_eq!(converted.status_code, Some(401));
    }

    #[test]
    fn test_http_server_error_maps_to_http_error() {
        let converted = TranscriptionError::from(Error::Http {
            status: 502,
            message: "bad gateway".to_string(),
        });

        assert_eq!(converted.code, ErrorCode::HttpError);
        assert_eq!(converted.status_code, Some(502));
        assert!(converted.message.contains("bad gateway"));
    }

    #[test]
    fn test_missing_api_key_from_auth_error() {
        let auth_err = provider_auth::error::api_key_error(
            provider_auth::error::ApiKeyErrorKind::Missing,
            "no API key configured for gladia",
        );
        let err = Error::from(auth_err);

        assert_eq!(err.code(), ErrorCode::MissingApiKey);
    }

    #[test]
    fn test_malformed_json_maps_to_parse_error() {
        let err: Error = serde_json::from_str::<Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let value =
            serde_json::to_value(TranscriptionError::from_code(ErrorCode::InvalidInput)).unwrap();
        assert_eq!(
            value,
            json!({"code": "INVALID_INPUT", "message": "Invalid input"})
        );
    }
}
