//! Types for batch transcription requests and their unified results.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiResponse;
use crate::error::TranscriptionError;
use crate::types::capabilities::TranscriptionProvider;

/// Processing status of a transcription job.
///
/// Jobs move Queued → Processing → Completed, or end in Error. Vendors that
/// use other names (`done`, `failed`) are mapped onto these four states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Error,
}

impl TranscriptionStatus {
    /// Whether the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranscriptionStatus::Completed | TranscriptionStatus::Error
        )
    }
}

/// Caller options for a batch transcription.
///
/// Every field is optional; adapters translate what their vendor understands and
/// silently ignore the rest (see [`ProviderCapabilities`](crate::types::ProviderCapabilities)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscribeOptions {
    /// BCP-47 style language code such as `en` or `fr`.
    pub language: Option<String>,
    pub language_detection: bool,
    pub diarization: bool,
    pub speakers_expected: Option<u32>,
    pub custom_vocabulary: Vec<String>,
    pub summarization: bool,
    pub sentiment_analysis: bool,
    pub entity_detection: bool,
    pub pii_redaction: bool,
    /// When set the job is submitted and returned as queued; the vendor calls this URL on completion.
    pub webhook_url: Option<String>,
    pub word_timestamps: bool,
    /// Free-form caller metadata, forwarded to vendors that accept it.
    pub metadata: HashMap<String, Value>,
}

/// Single recognized word. Times are in seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// Continuous stretch of speech, usually from one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Normalized transcript content shared by every provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptData {
    pub id: String,
    pub text: String,
    pub status: TranscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Audio duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<Speaker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub utterances: Vec<Utterance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TranscriptData {
    /// Placeholder returned for a job that was accepted but has no content yet.
    pub fn pending(id: impl Into<String>, status: TranscriptionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            ..Default::default()
        }
    }
}

/// Result of every batch adapter operation.
///
/// Serializes as `{success, provider, data | error, raw?}`. Exactly one of
/// `data` and `error` is present, and deserialization rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTranscriptResponse {
    pub provider: TranscriptionProvider,
    #[serde(flatten)]
    pub result: ApiResponse<TranscriptData>,
    /// Untouched vendor payload, kept for debugging and vendor-specific fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl UnifiedTranscriptResponse {
    pub fn success(provider: TranscriptionProvider, data: TranscriptData) -> Self {
        Self {
            provider,
            result: ApiResponse::Success(data),
            raw: None,
        }
    }

    pub fn failure(provider: TranscriptionProvider, error: TranscriptionError) -> Self {
        Self {
            provider,
            result: ApiResponse::Failure(error),
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    pub fn data(&self) -> Option<&TranscriptData> {
        self.result.data()
    }

    pub fn error(&self) -> Option<&TranscriptionError> {
        self.result.error()
    }
}

/// One entry of a transcript listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSummary {
    pub id: String,
    pub status: TranscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Convert a vendor millisecond offset to seconds.
pub fn ms_to_seconds(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Distinct speakers across `utterances`, in order of first appearance.
pub fn speakers_from_utterances(utterances: &[Utterance]) -> Vec<Speaker> {
    let mut speakers: Vec<Speaker> = Vec::new();
    for id in utterances.iter().filter_map(|u| u.speaker.as_deref()) {
        if !speakers.iter().any(|s| s.id == id) {
            speakers.push(Speaker {
                id: id.to_string(),
                label: Some(format!("Speaker {id}")),
            });
        }
    }
    speakers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn utterance(speaker: Option<&str>, start: f64, end: f64) -> Utterance {
        Utterance {
            text: "hello".to_string(),
            start,
            end,
            speaker: speaker.map(str::to_string),
            confidence: Some(0.9),
            words: vec![],
        }
    }

    #[test]
    fn test_ms_to_seconds() {
        assert_eq!(ms_to_seconds(2000), 2.0);
        assert_eq!(ms_to_seconds(1250), 1.25);
        assert_eq!(ms_to_seconds(0), 0.0);
    }

    #[test]
    fn test_speakers_deduplicated_in_first_appearance_order() {
        let utterances = vec![
            utterance(Some("B"), 0.0, 1.0),
            utterance(Some("A"), 1.0, 2.0),
            utterance(None, 2.0, 3.0),
            utterance(Some("B"), 3.0, 4.0),
        ];

        let speakers = speakers_from_utterances(&utterances);

        assert_eq!(speakers.len(), 2);
        assert_eq!(speakers[0].id, "B");
        assert_eq!(speakers[0].label.as_deref(), Some("Speaker B"));
        assert_eq!(speakers[1].id, "A");
    }

    #[test]
    fn test_success_response_wire_shape() {
        let response = UnifiedTranscriptResponse::success(
            TranscriptionProvider::Gladia,
            TranscriptData::pending("job-1", TranscriptionStatus::Queued),
        );

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({
                "success": true,
                "provider": "gladia",
                "data": {"id": "job-1", "text": "", "status": "queued"}
            })
        );
    }

    #[test]
    fn test_failure_response_wire_shape() {
        let response = UnifiedTranscriptResponse::failure(
            TranscriptionProvider::Deepgram,
            TranscriptionError::new(ErrorCode::HttpError, "boom").with_status_code(500),
        )
        .with_raw(json!({"err_code": "INTERNAL"}));

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("HTTP_ERROR"));
        assert_eq!(value["error"]["status_code"], json!(500));
        assert_eq!(value["raw"]["err_code"], json!("INTERNAL"));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_deserialize_rejects_data_and_error_together() {
        let payload = json!({
            "success": true,
            "provider": "assemblyai",
            "data": {"id": "x", "text": "", "status": "completed"},
            "error": {"code": "HTTP_ERROR", "message": "nope"}
        });

        let parsed = serde_json::from_value::<UnifiedTranscriptResponse>(payload);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_deserialize_rejects_success_flag_disagreeing_with_payload() {
        let payload = json!({
            "success": false,
            "provider": "assemblyai",
            "data": {"id": "x", "text": "", "status": "completed"}
        });

        assert!(serde_json::from_value::<UnifiedTranscriptResponse>(payload).is_err());
    }

    #[test]
    fn test_deserialize_accepts_failure() {
        let payload = json!({
            "success": false,
            "provider": "gladia",
            "error": {"code": "POLLING_TIMEOUT", "message": "gave up"}
        });

        let parsed: UnifiedTranscriptResponse = serde_json::from_value(payload).unwrap();

        assert!(!parsed.is_success());
        assert_eq!(parsed.error().unwrap().code, ErrorCode::PollingTimeout);
        assert!(parsed.data().is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TranscriptionStatus::Completed.is_terminal());
        assert!(TranscriptionStatus::Error.is_terminal());
        assert!(!TranscriptionStatus::Processing.is_terminal());
    }
}
