//! Gladia v2 request and response bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v2/pre-recorded`.
#[derive(Debug, Default, Serialize)]
pub struct InitTranscriptionRequest {
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_config: Option<LanguageConfig>,
    pub punctuation_enhanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization_config: Option<DiarizationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_vocabulary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_vocabulary_config: Option<CustomVocabularyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarization_config: Option<SummarizationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_entity_recognition: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_config: Option<CallbackConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageConfig {
    pub languages: Vec<String>,
    pub code_switching: bool,
}

#[derive(Debug, Serialize)]
pub struct DiarizationConfig {
    pub number_of_speakers: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomVocabularyConfig {
    pub vocabulary: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizationConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackConfig {
    pub url: String,
    pub method: String,
}

/// Response of `POST /v2/pre-recorded`.
#[derive(Debug, Deserialize)]
pub struct InitTranscriptionResponse {
    pub id: String,
    #[serde(default)]
    pub result_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
}

/// Pre-recorded job, returned by `GET /v2/pre-recorded/{id}` and in listings.
#[derive(Debug, Deserialize)]
pub struct PreRecordedJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub custom_metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub request_params: Option<RequestParams>,
    #[serde(default)]
    pub result: Option<TranscriptionResult>,
}

#[derive(Debug, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Job output. Webhook `transcription.success` payloads have the same shape.
#[derive(Debug, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub metadata: Option<ResultMetadata>,
    #[serde(default)]
    pub transcription: Option<Transcription>,
    #[serde(default)]
    pub summarization: Option<AddonResult>,
}

#[derive(Debug, Deserialize)]
pub struct ResultMetadata {
    /// Seconds.
    pub audio_duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub full_transcript: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
}

/// Utterance with timings in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub speaker: Option<i64>,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AddonResult {
    pub success: bool,
    #[serde(default)]
    pub results: Option<String>,
}

/// Response of `GET /v2/pre-recorded`.
#[derive(Debug, Deserialize)]
pub struct JobList {
    pub items: Vec<PreRecordedJob>,
}

/// Body of `POST /v2/live`.
#[derive(Debug, Serialize)]
pub struct LiveSessionRequest {
    pub encoding: String,
    pub bit_depth: u16,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Seconds of silence that end an utterance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpointing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_config: Option<LanguageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_processing: Option<RealtimeProcessing>,
    pub messages_config: MessagesConfig,
}

#[derive(Debug, Serialize)]
pub struct RealtimeProcessing {
    pub custom_vocabulary: bool,
    pub custom_vocabulary_config: CustomVocabularyConfig,
}

#[derive(Debug, Serialize)]
pub struct MessagesConfig {
    pub receive_partial_transcripts: bool,
    pub receive_final_transcripts: bool,
}

/// Response of `POST /v2/live`: the session id and its socket URL.
#[derive(Debug, Deserialize)]
pub struct LiveSessionResponse {
    pub id: String,
    pub url: String,
}
