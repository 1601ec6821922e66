//! Uniform success/failure envelope for vendor HTTP operations.
//!
//! [`api_wrapper`] is the single place where a vendor call can fail. It checks
//! the authentication precondition, validates parameters, runs the operation and
//! folds every error, including a panic, into an [`ApiResponse`].

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use log::*;
use provider_auth::api_key::ProviderAuth;
use reqwest::header::{HeaderMap, HeaderName};
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, ErrorCode, TranscriptionError};

/// Either the operation's data or the reason it failed, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(TranscriptionError),
}

impl<T> ApiResponse<T> {
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiResponse::Failure(TranscriptionError::new(code, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Success(data) => Some(data),
            ApiResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TranscriptionError> {
        match self {
            ApiResponse::Success(_) => None,
            ApiResponse::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, TranscriptionError> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::Failure(error) => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Success(data) => ApiResponse::Success(f(data)),
            ApiResponse::Failure(error) => ApiResponse::Failure(error),
        }
    }
}

impl<T> From<Result<T, TranscriptionError>> for ApiResponse<T> {
    fn from(result: Result<T, TranscriptionError>) -> Self {
        match result {
            Ok(data) => ApiResponse::Success(data),
            Err(error) => ApiResponse::Failure(error),
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResponse", 2)?;
        match self {
            ApiResponse::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            ApiResponse::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ApiResponseWire<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<TranscriptionError>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ApiResponseWire::<T>::deserialize(deserializer)?;
        match (wire.success, wire.data, wire.error) {
            (true, Some(data), None) => Ok(ApiResponse::Success(data)),
            (false, None, Some(error)) => Ok(ApiResponse::Failure(error)),
            (success, data, error) => Err(D::Error::custom(format!(
                "expected exactly one of `data` or `error` matching success={success}, got data={} error={}",
                data.is_some(),
                error.is_some()
            ))),
        }
    }
}

/// Single validation problem found in request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validation applied to operation parameters before any request is made.
pub trait Schema<P>: Send + Sync {
    fn validate(&self, params: &P) -> Result<(), Vec<ValidationIssue>>;
}

/// Headers sent with a vendor request, and which of them must be present.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    /// Header whose absence (or emptiness) means the call is made without credentials.
    pub required_header: Option<HeaderName>,
}

impl RequestOptions {
    /// Options carrying the credential header of `auth`, which becomes required.
    pub fn authenticated(auth: &dyn ProviderAuth) -> Self {
        let mut headers = HeaderMap::new();
        if let Err(err) = auth.authenticate(&mut headers) {
            warn!(
                "Could not build {} auth header: {}",
                auth.provider().as_str(),
                err
            );
        }
        Self {
            headers,
            required_header: Some(auth.header_name()),
        }
    }

    fn missing_required_header(&self) -> Option<&HeaderName> {
        let name = self.required_header.as_ref()?;
        match self.headers.get(name) {
            Some(value) if !value.as_bytes().iter().all(u8::is_ascii_whitespace) => None,
            _ => Some(name),
        }
    }
}

/// Run a vendor operation and normalize its outcome.
///
/// The operation is not invoked when the required header is missing
/// (`MISSING_API_KEY`) or when `schema` rejects `params` (`VALIDATION_ERROR`,
/// with the issues in `details`). Operation errors are converted through
/// [`Error`]; panics become `UNKNOWN_ERROR`.
pub async fn api_wrapper<P, T, E, F, Fut>(
    operation: F,
    schema: Option<&dyn Schema<P>>,
    params: P,
    options: RequestOptions,
) -> ApiResponse<T>
where
    F: FnOnce(P, RequestOptions) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    if let Some(header) = options.missing_required_header() {
        warn!("Refusing vendor call: required header `{header}` is missing");
        return ApiResponse::failure(
            ErrorCode::MissingApiKey,
            format!("API key is required (missing `{header}` header)"),
        );
    }

    if let Some(schema) = schema {
        if let Err(issues) = schema.validate(&params) {
            debug!("Request validation failed with {} issue(s)", issues.len());
            let details = serde_json::to_value(&issues).unwrap_or_default();
            let message = issues
                .iter()
                .map(|issue| format!("{}: {}", issue.path, issue.message))
                .collect::<Vec<_>>()
                .join("; ");
            return ApiResponse::Failure(
                TranscriptionError::new(ErrorCode::ValidationError, message).with_details(details),
            );
        }
    }

    let future = match panic::catch_unwind(AssertUnwindSafe(|| operation(params, options))) {
        Ok(future) => future,
        Err(payload) => return ApiResponse::Failure(panic_error(payload)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(data)) => ApiResponse::Success(data),
        Ok(Err(err)) => {
            let err: Error = err.into();
            debug!("Vendor operation failed: {err}");
            ApiResponse::Failure(err.into())
        }
        Err(payload) => ApiResponse::Failure(panic_error(payload)),
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> TranscriptionError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    error!("Vendor operation panicked: {:?}", message);
    match message {
        Some(message) => TranscriptionError::new(ErrorCode::UnknownError, message),
        None => TranscriptionError::from_code(ErrorCode::UnknownError),
    }
}
