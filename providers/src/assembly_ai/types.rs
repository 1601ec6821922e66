//! AssemblyAI request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /v2/transcript`.
#[derive(Debug, Default, Serialize)]
pub struct CreateTranscriptRequest {
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_detection: Option<bool>,
    pub punctuate: bool,
    pub format_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speakers_expected: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub word_boost: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_detection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact_pii: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact_pii_policies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Transcript processing status
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// Transcript resource, returned by create, get and delete.
#[derive(Debug, Deserialize)]
pub struct TranscriptResponse {
    pub id: String,
    pub status: TranscriptStatus,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<Word>>,
    #[serde(default)]
    pub utterances: Option<Vec<Utterance>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Seconds, unlike every other AssemblyAI time field.
    #[serde(default)]
    pub audio_duration: Option<f64>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Word with timing information, in milliseconds.
#[derive(Debug, Deserialize, Clone)]
pub struct Word {
    pub text: String,
    pub start: i64,
    pub end: i64,
    pub confidence: f64,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// Speaker utterance, in milliseconds.
#[derive(Debug, Deserialize, Clone)]
pub struct Utterance {
    pub text: String,
    pub start: i64,
    pub end: i64,
    pub confidence: f64,
    pub speaker: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Response of `GET /v2/transcript`.
#[derive(Debug, Deserialize)]
pub struct TranscriptList {
    pub transcripts: Vec<TranscriptListItem>,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptListItem {
    pub id: String,
    pub status: TranscriptStatus,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Body of `POST /v2/realtime/token`.
#[derive(Debug, Serialize)]
pub struct RealtimeTokenRequest {
    pub expires_in: u32,
}

#[derive(Debug, Deserialize)]
pub struct RealtimeTokenResponse {
    pub token: String,
}
