//! Error types for the `provider-auth` crate.
//!
//! A root Error struct carries an error kind and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for provider-auth crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in provider-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    ApiKey(ApiKeyErrorKind),
    Http(HttpErrorKind),
}

/// Errors from API key authentication operations.
#[derive(Debug, PartialEq)]
pub enum ApiKeyErrorKind {
    Missing,
    InvalidFormat,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    InvalidHeader,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let detail = self
            .source
            .as_ref()
            .map(|source| format!(": {source}"))
            .unwrap_or_default();
        match &self.error_kind {
            ErrorKind::ApiKey(kind) => write!(f, "API key error ({:?}){}", kind, detail),
            ErrorKind::Http(kind) => write!(f, "HTTP error ({:?}){}", kind, detail),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create API key errors.
pub fn api_key_error(kind: ApiKeyErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::ApiKey(kind),
    }
}

/// Helper function to create HTTP client errors.
pub fn http_error(kind: HttpErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Http(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source_message() {
        let err = api_key_error(ApiKeyErrorKind::Missing, "no key for gladia");
        assert_eq!(err.to_string(), "API key error (Missing): no key for gladia");
    }

    #[test]
    fn test_source_is_exposed() {
        let err = http_error(HttpErrorKind::InvalidHeader, "bad header");
        assert!(StdError::source(&err).is_some());
    }
}
