pub mod audio;
pub mod capabilities;
pub mod streaming;
pub mod transcription;

pub use audio::{AudioEncoding, AudioInput};
pub use capabilities::{Feature, ProviderCapabilities, TranscriptionProvider};
pub use streaming::{
    AudioChunk, SessionMetadata, SessionStatus, StreamTranscript, StreamingCallbacks,
    StreamingOptions,
};
pub use transcription::{
    ms_to_seconds, speakers_from_utterances, Speaker, TranscribeOptions, TranscriptData,
    TranscriptSummary, TranscriptionStatus, UnifiedTranscriptResponse, Utterance, Word,
};
