//! Deepgram `/v1/listen` bodies, shared by the batch and live APIs.

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/listen` for hosted audio. Features travel in the query string.
#[derive(Debug, Serialize)]
pub struct ListenRequest {
    pub url: String,
}

/// A listen call either returns the transcript inline or, with a callback, only acknowledges it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListenOutcome {
    Completed(Box<ListenResponse>),
    Accepted(AcceptedResponse),
}

#[derive(Debug, Deserialize)]
pub struct AcceptedResponse {
    pub request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListenResponse {
    pub metadata: ListenMetadata,
    pub results: ListenResults,
}

#[derive(Debug, Deserialize)]
pub struct ListenMetadata {
    pub request_id: String,
    #[serde(default)]
    pub created: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListenResults {
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub detected_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Recognized word; times are seconds.
#[derive(Debug, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub speaker: Option<i64>,
    /// Present when punctuation or smart formatting is on.
    #[serde(default)]
    pub punctuated_word: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Utterance {
    pub transcript: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub speaker: Option<i64>,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub short: Option<String>,
}
