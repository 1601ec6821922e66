//! Normalization of vendor completion callbacks.
//!
//! Vendors that were given a `webhook_url` call it when a job changes state.
//! [`WebhookRouter`] turns those payloads into a [`UnifiedWebhookEvent`],
//! either detecting the vendor from the payload shape or for a named vendor.

mod assembly_ai;
mod gladia;

use std::fmt;

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use transcription::types::{TranscriptData, TranscriptionProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "transcription.created")]
    TranscriptionCreated,
    #[serde(rename = "transcription.processing")]
    TranscriptionProcessing,
    #[serde(rename = "transcription.completed")]
    TranscriptionCompleted,
    #[serde(rename = "transcription.failed")]
    TranscriptionFailed,
}

/// Vendor-neutral view of one callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedWebhookEvent {
    pub success: bool,
    pub provider: TranscriptionProvider,
    pub event_type: WebhookEventType,
    /// Job state. Vendors that only notify (AssemblyAI) carry no transcript content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TranscriptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the callback was normalized.
    pub timestamp: DateTime<Utc>,
    pub raw: Value,
}

impl UnifiedWebhookEvent {
    fn new(
        provider: TranscriptionProvider,
        event_type: WebhookEventType,
        data: TranscriptData,
        raw: &Value,
    ) -> Self {
        Self {
            success: event_type != WebhookEventType::TranscriptionFailed,
            provider,
            event_type,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            raw: raw.clone(),
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug)]
pub enum WebhookError {
    Json(serde_json::Error),
    InvalidPayload(String),
    UnknownEvent(String),
    /// The payload matches no known vendor shape.
    UnknownProvider,
    UnsupportedProvider(TranscriptionProvider),
}

impl fmt::Display for WebhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookError::Json(err) => write!(f, "Webhook body is not valid JSON: {}", err),
            WebhookError::InvalidPayload(msg) => write!(f, "Invalid webhook payload: {}", msg),
            WebhookError::UnknownEvent(event) => write!(f, "Unknown webhook event: {}", event),
            WebhookError::UnknownProvider => write!(f, "Could not detect webhook provider"),
            WebhookError::UnsupportedProvider(provider) => {
                write!(f, "Webhooks from {} are not supported", provider)
            }
        }
    }
}

impl std::error::Error for WebhookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebhookError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Json(err)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookRouter;

impl WebhookRouter {
    pub fn new() -> Self {
        Self
    }

    /// Parse a callback body, detecting the vendor from its shape.
    pub fn route(&self, body: &[u8]) -> Result<UnifiedWebhookEvent, WebhookError> {
        let payload: Value = serde_json::from_slice(body)?;
        let provider = detect(&payload).ok_or_else(|| {
            warn!("Received webhook with unrecognized shape");
            WebhookError::UnknownProvider
        })?;
        debug!("Detected {provider} webhook");
        parse_value(provider, &payload)
    }

    /// Parse a callback body known to come from `provider`.
    pub fn parse(
        &self,
        provider: TranscriptionProvider,
        body: &[u8],
    ) -> Result<UnifiedWebhookEvent, WebhookError> {
        let payload: Value = serde_json::from_slice(body)?;
        parse_value(provider, &payload)
    }
}

fn detect(payload: &Value) -> Option<TranscriptionProvider> {
    let event = payload.get("event").and_then(Value::as_str);
    if event.is_some_and(|event| event.starts_with("transcription.")) {
        return Some(TranscriptionProvider::Gladia);
    }
    if payload.get("transcript_id").is_some() && payload.get("status").is_some() {
        return Some(TranscriptionProvider::AssemblyAi);
    }
    None
}

fn parse_value(
    provider: TranscriptionProvider,
    payload: &Value,
) -> Result<UnifiedWebhookEvent, WebhookError> {
    let event = match provider {
        TranscriptionProvider::Gladia => gladia::parse(payload)?,
        TranscriptionProvider::AssemblyAi => assembly_ai::parse(payload)?,
        TranscriptionProvider::Deepgram => {
            return Err(WebhookError::UnsupportedProvider(provider));
        }
    };
    info!(
        "Parsed {} webhook {:?} for job {}",
        provider,
        event.event_type,
        event.data.as_ref().map(|data| data.id.as_str()).unwrap_or("?")
    );
    Ok(event)
}
