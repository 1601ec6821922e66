//! Types for live streaming sessions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TranscriptionError;
use crate::types::audio::AudioEncoding;
use crate::types::transcription::Word;

/// Parameters of a live transcription session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingOptions {
    pub encoding: AudioEncoding,
    /// Samples per second of the audio that will be sent.
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub language: Option<String>,
    pub diarization: bool,
    /// Emit non-final transcripts while speech is ongoing.
    pub interim_results: bool,
    /// Silence in milliseconds that ends an utterance, when the vendor supports tuning it.
    pub endpointing: Option<u32>,
    pub model: Option<String>,
    pub custom_vocabulary: Vec<String>,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Linear16,
            sample_rate: 16_000,
            channels: 1,
            bit_depth: 16,
            language: None,
            diarization: false,
            interim_results: true,
            endpointing: None,
            model: None,
            custom_vocabulary: Vec::new(),
        }
    }
}

/// A slice of caller audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub data: Vec<u8>,
    /// Marks the end of the caller's audio; the vendor is asked to flush.
    pub is_last: bool,
}

impl AudioChunk {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            is_last: false,
        }
    }

    pub fn last(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            is_last: true,
        }
    }
}

/// Lifecycle of a streaming session. Variants are ordered; a session only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Open => "open",
            SessionStatus::Closing => "closing",
            SessionStatus::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Transcript pushed by the vendor during a session. Word times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamTranscript {
    pub text: String,
    pub is_final: bool,
    pub confidence: Option<f64>,
    pub words: Vec<Word>,
    pub speaker: Option<String>,
}

/// Session-level information from the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Vendor session identifier, when the vendor assigns one.
    pub session_id: Option<String>,
    /// Set on the message that announces the vendor ended the session.
    pub terminated: bool,
    /// The vendor message as received.
    pub data: Value,
}

type Callback<T> = Box<dyn FnMut(T) + Send>;

/// Caller hooks for session events. All are optional.
///
/// A panic inside a callback is caught and logged; it never reaches the
/// transport event loop.
#[derive(Default)]
pub struct StreamingCallbacks {
    pub(crate) on_open: Option<Box<dyn FnMut() + Send>>,
    pub(crate) on_transcript: Option<Callback<StreamTranscript>>,
    pub(crate) on_metadata: Option<Callback<SessionMetadata>>,
    pub(crate) on_error: Option<Callback<TranscriptionError>>,
    pub(crate) on_close: Option<Box<dyn FnMut(Option<u16>, Option<String>) + Send>>,
}

impl StreamingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    pub fn on_transcript(mut self, f: impl FnMut(StreamTranscript) + Send + 'static) -> Self {
        self.on_transcript = Some(Box::new(f));
        self
    }

    pub fn on_metadata(mut self, f: impl FnMut(SessionMetadata) + Send + 'static) -> Self {
        self.on_metadata = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(TranscriptionError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called once with the close code and reason, when known.
    pub fn on_close(mut self, f: impl FnMut(Option<u16>, Option<String>) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for StreamingCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingCallbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_transcript", &self.on_transcript.is_some())
            .field("on_metadata", &self.on_metadata.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
