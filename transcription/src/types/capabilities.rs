//! Supported providers and the static registry of what each one can do.

use std::fmt;
use std::str::FromStr;

use provider_auth::api_key::ApiKeyProvider;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Speech-to-text vendors with an adapter in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TranscriptionProvider {
    #[serde(rename = "gladia")]
    Gladia,
    #[serde(rename = "assemblyai")]
    AssemblyAi,
    #[serde(rename = "deepgram")]
    Deepgram,
}

impl TranscriptionProvider {
    pub const ALL: [TranscriptionProvider; 3] = [
        TranscriptionProvider::Gladia,
        TranscriptionProvider::AssemblyAi,
        TranscriptionProvider::Deepgram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionProvider::Gladia => "gladia",
            TranscriptionProvider::AssemblyAi => "assemblyai",
            TranscriptionProvider::Deepgram => "deepgram",
        }
    }

    /// Feature matrix for this provider.
    pub fn capabilities(&self) -> ProviderCapabilities {
        match self {
            TranscriptionProvider::Gladia => GLADIA_CAPABILITIES,
            TranscriptionProvider::AssemblyAi => ASSEMBLYAI_CAPABILITIES,
            TranscriptionProvider::Deepgram => DEEPGRAM_CAPABILITIES,
        }
    }

    /// Credential convention used to authenticate against this provider.
    pub fn api_key_provider(&self) -> ApiKeyProvider {
        match self {
            TranscriptionProvider::Gladia => ApiKeyProvider::Gladia,
            TranscriptionProvider::AssemblyAi => ApiKeyProvider::AssemblyAi,
            TranscriptionProvider::Deepgram => ApiKeyProvider::Deepgram,
        }
    }
}

impl fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptionProvider {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gladia" => Ok(TranscriptionProvider::Gladia),
            "assemblyai" | "assembly_ai" | "assembly-ai" => Ok(TranscriptionProvider::AssemblyAi),
            "deepgram" => Ok(TranscriptionProvider::Deepgram),
            other => Err(Error::Configuration(format!(
                "unknown transcription provider: {other}"
            ))),
        }
    }
}

/// Optional features a caller may ask of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Streaming,
    Diarization,
    WordTimestamps,
    LanguageDetection,
    CustomVocabulary,
    Summarization,
    SentimentAnalysis,
    EntityDetection,
    PiiRedaction,
    ListTranscripts,
    DeleteTranscripts,
}

/// Static description of the features a provider supports.
///
/// Options for unsupported features are ignored by the adapter rather than
/// rejected, so callers that care should check here first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub diarization: bool,
    pub word_timestamps: bool,
    pub language_detection: bool,
    pub custom_vocabulary: bool,
    pub summarization: bool,
    pub sentiment_analysis: bool,
    pub entity_detection: bool,
    pub pii_redaction: bool,
    pub list_transcripts: bool,
    pub delete_transcripts: bool,
}

impl ProviderCapabilities {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Streaming => self.streaming,
            Feature::Diarization => self.diarization,
            Feature::WordTimestamps => self.word_timestamps,
            Feature::LanguageDetection => self.language_detection,
            Feature::CustomVocabulary => self.custom_vocabulary,
            Feature::Summarization => self.summarization,
            Feature::SentimentAnalysis => self.sentiment_analysis,
            Feature::EntityDetection => self.entity_detection,
            Feature::PiiRedaction => self.pii_redaction,
            Feature::ListTranscripts => self.list_transcripts,
            Feature::DeleteTranscripts => self.delete_transcripts,
        }
    }
}

const GLADIA_CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    streaming: true,
    diarization: true,
    word_timestamps: true,
    language_detection: true,
    custom_vocabulary: true,
    summarization: true,
    sentiment_analysis: true,
    entity_detection: true,
    pii_redaction: false,
    list_transcripts: true,
    delete_transcripts: true,
};

const ASSEMBLYAI_CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    streaming: true,
    diarization: true,
    word_timestamps: true,
    language_detection: true,
    custom_vocabulary: true,
    summarization: true,
    sentiment_analysis: true,
    entity_detection: true,
    pii_redaction: true,
    list_transcripts: true,
    delete_transcripts: true,
};

// Deepgram batch results are returned inline and never stored server side.
const DEEPGRAM_CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    streaming: true,
    diarization: true,
    word_timestamps: true,
    language_detection: true,
    custom_vocabulary: true,
    summarization: true,
    sentiment_analysis: true,
    entity_detection: true,
    pii_redaction: true,
    list_transcripts: false,
    delete_transcripts: false,
};
