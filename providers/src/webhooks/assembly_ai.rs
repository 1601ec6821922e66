//! AssemblyAI callbacks only announce a status change; the transcript itself
//! is fetched with `get_transcript`.

use serde::Deserialize;
use serde_json::Value;
use transcription::types::{TranscriptData, TranscriptionProvider, TranscriptionStatus};

use super::{UnifiedWebhookEvent, WebhookError, WebhookEventType};

#[derive(Debug, Deserialize)]
struct Callback {
    transcript_id: String,
    status: String,
}

pub(super) fn parse(payload: &Value) -> Result<UnifiedWebhookEvent, WebhookError> {
    let callback = Callback::deserialize(payload)
        .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;

    let (event_type, status) = match callback.status.as_str() {
        "queued" => (
            WebhookEventType::TranscriptionCreated,
            TranscriptionStatus::Queued,
        ),
        "processing" => (
            WebhookEventType::TranscriptionProcessing,
            TranscriptionStatus::Processing,
        ),
        "completed" => (
            WebhookEventType::TranscriptionCompleted,
            TranscriptionStatus::Completed,
        ),
        "error" => (
            WebhookEventType::TranscriptionFailed,
            TranscriptionStatus::Error,
        ),
        other => return Err(WebhookError::UnknownEvent(other.to_string())),
    };

    let event = UnifiedWebhookEvent::new(
        TranscriptionProvider::AssemblyAi,
        event_type,
        TranscriptData::pending(callback.transcript_id, status),
        payload,
    );
    Ok(match status {
        TranscriptionStatus::Error => event.with_error("Transcription failed"),
        _ => event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_callback() {
        let event = parse(&json!({"transcript_id": "tr-9", "status": "error"})).unwrap();

        assert!(!event.success);
        assert_eq!(event.event_type, WebhookEventType::TranscriptionFailed);
        assert_eq!(event.error.as_deref(), Some("Transcription failed"));
        assert_eq!(event.data.unwrap().status, TranscriptionStatus::Error);
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        assert!(matches!(
            parse(&json!({"status": "completed"})),
            Err(WebhookError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_unknown_status() {
        assert!(matches!(
            parse(&json!({"transcript_id": "tr-9", "status": "archived"})),
            Err(WebhookError::UnknownEvent(_))
        ));
    }
}
