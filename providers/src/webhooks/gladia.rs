use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use transcription::types::{TranscriptData, TranscriptionProvider, TranscriptionStatus};

use super::{UnifiedWebhookEvent, WebhookError, WebhookEventType};
use crate::gladia::result_data;
use crate::gladia::types::TranscriptionResult;

#[derive(Debug, Deserialize)]
struct Callback {
    id: String,
    event: String,
    #[serde(default)]
    payload: Option<TranscriptionResult>,
    #[serde(default)]
    error: Option<CallbackError>,
    #[serde(default)]
    custom_metadata: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct CallbackError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

pub(super) fn parse(payload: &Value) -> Result<UnifiedWebhookEvent, WebhookError> {
    let callback = Callback::deserialize(payload)
        .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
    let metadata = callback.custom_metadata.unwrap_or_default();

    match callback.event.as_str() {
        "transcription.created" => {
            let mut data = TranscriptData::pending(callback.id, TranscriptionStatus::Queued);
            data.metadata = metadata;
            Ok(event(WebhookEventType::TranscriptionCreated, data, payload))
        }
        "transcription.success" => {
            let result = callback.payload.ok_or_else(|| {
                WebhookError::InvalidPayload("success event without a payload".to_string())
            })?;
            let mut data = result_data(callback.id, &result);
            data.metadata = metadata;
            Ok(event(WebhookEventType::TranscriptionCompleted, data, payload))
        }
        "transcription.error" => {
            let error = callback.error.unwrap_or(CallbackError {
                message: None,
                code: None,
            });
            let mut data = TranscriptData::pending(callback.id, TranscriptionStatus::Error);
            data.metadata = metadata;
            if let Some(code) = error.code {
                data.metadata.insert("error_code".to_string(), json!(code));
            }
            Ok(event(WebhookEventType::TranscriptionFailed, data, payload).with_error(
                error
                    .message
                    .unwrap_or_else(|| "Transcription failed".to_string()),
            ))
        }
        other => Err(WebhookError::UnknownEvent(other.to_string())),
    }
}

fn event(event_type: WebhookEventType, data: TranscriptData, raw: &Value) -> UnifiedWebhookEvent {
    UnifiedWebhookEvent::new(TranscriptionProvider::Gladia, event_type, data, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_callback() {
        let payload = json!({
            "id": "job-1",
            "event": "transcription.success",
            "custom_metadata": {"call_id": "42"},
            "payload": {
                "metadata": {"audio_duration": 8.5},
                "transcription": {
                    "full_transcript": "Salut",
                    "languages": ["fr"],
                    "utterances": [{
                        "text": "Salut", "start": 0.2, "end": 0.7, "confidence": 0.9, "speaker": 0,
                        "words": [{"word": "Salut", "start": 0.2, "end": 0.7, "confidence": 0.9}]
                    }]
                },
                "summarization": {"success": true, "results": "Greeting"}
            }
        });

        let event = parse(&payload).unwrap();

        assert!(event.success);
        assert_eq!(event.raw, payload);
        let data = event.data.unwrap();
        assert_eq!(data.status, TranscriptionStatus::Completed);
        assert_eq!(data.duration, Some(8.5));
        assert_eq!(data.words[0].speaker.as_deref(), Some("0"));
        assert_eq!(data.speakers[0].id, "0");
        assert_eq!(data.summary.as_deref(), Some("Greeting"));
        assert_eq!(data.metadata.get("call_id"), Some(&json!("42")));
    }

    #[test]
    fn test_error_callback() {
        let payload = json!({
            "id": "job-2",
            "event": "transcription.error",
            "error": {"code": 500, "message": "Audio could not be decoded"}
        });

        let event = parse(&payload).unwrap();

        assert!(!event.success);
        assert_eq!(event.event_type, WebhookEventType::TranscriptionFailed);
        assert_eq!(event.error.as_deref(), Some("Audio could not be decoded"));
        let data = event.data.unwrap();
        assert_eq!(data.status, TranscriptionStatus::Error);
        assert_eq!(data.metadata.get("error_code"), Some(&json!(500)));
    }

    #[test]
    fn test_success_without_payload_is_invalid() {
        let payload = json!({"id": "job-3", "event": "transcription.success"});
        assert!(matches!(parse(&payload), Err(WebhookError::InvalidPayload(_))));
    }

    #[test]
    fn test_unknown_event() {
        let payload = json!({"id": "job-4", "event": "transcription.archived"});
        assert!(
            matches!(parse(&payload), Err(WebhookError::UnknownEvent(e)) if e == "transcription.archived")
        );
    }
}
