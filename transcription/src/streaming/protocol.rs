//! Vendor wire protocol for a streaming session.

use crate::error::TranscriptionError;
use crate::streaming::transport::OutboundFrame;
use crate::types::{SessionMetadata, StreamTranscript, TranscriptionProvider};
use crate::Error;

/// A decoded inbound vendor message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    SessionStarted(SessionMetadata),
    Transcript(StreamTranscript),
    SessionTerminated(SessionMetadata),
    VendorError(TranscriptionError),
    /// Recognized but of no interest to callers (keep-alives, speech-start hints).
    Ignored,
}

/// Encoding and decoding rules for one vendor's realtime API.
pub trait StreamProtocol: Send + Sync {
    fn provider(&self) -> TranscriptionProvider;

    /// Decode one text frame. Malformed JSON and missing required fields are errors.
    fn decode(&self, text: &str) -> Result<Vec<InboundEvent>, Error>;

    /// Wrap caller audio for the wire.
    fn encode_audio(&self, audio: &[u8]) -> OutboundFrame;

    /// Message asking the vendor to flush after the last chunk, if it has one.
    fn end_of_stream(&self) -> Option<OutboundFrame>;

    /// Message asking the vendor to end the session, sent before closing.
    fn terminate(&self) -> Option<OutboundFrame>;
}
