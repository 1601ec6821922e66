//! Gladia live protocol.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use transcription::streaming::{InboundEvent, OutboundFrame, StreamProtocol};
use transcription::types::{SessionMetadata, StreamTranscript, TranscriptionProvider};
use transcription::{Error, ErrorCode, TranscriptionError};

use super::map_word;
use super::types::Utterance;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LiveMessage {
    StartSession {
        #[serde(default)]
        session_id: Option<String>,
    },
    Transcript {
        data: LiveTranscript,
    },
    EndSession {
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Acknowledgements, speech events and post-processing results.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct LiveTranscript {
    is_final: bool,
    utterance: Utterance,
}

pub struct GladiaProtocol;

impl GladiaProtocol {
    fn vendor_error(value: Value) -> InboundEvent {
        let message = [
            value.pointer("/error/message"),
            value.pointer("/data/message"),
            value.get("message"),
            value.get("error"),
        ]
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .unwrap_or(ErrorCode::ProviderError.default_message())
        .to_string();

        InboundEvent::VendorError(
            TranscriptionError::new(ErrorCode::ProviderError, message).with_details(value),
        )
    }
}

impl StreamProtocol for GladiaProtocol {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Gladia
    }

    fn decode(&self, text: &str) -> Result<Vec<InboundEvent>, Error> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("type").and_then(Value::as_str) == Some("error") {
            return Ok(vec![Self::vendor_error(value)]);
        }

        let event = match serde_json::from_value::<LiveMessage>(value.clone())? {
            LiveMessage::StartSession { session_id } => {
                InboundEvent::SessionStarted(SessionMetadata {
                    session_id,
                    terminated: false,
                    data: value,
                })
            }
            LiveMessage::Transcript { data } => {
                let speaker = data.utterance.speaker.map(|id| id.to_string());
                InboundEvent::Transcript(StreamTranscript {
                    text: data.utterance.text,
                    is_final: data.is_final,
                    confidence: data.utterance.confidence,
                    words: data
                        .utterance
                        .words
                        .iter()
                        .map(|word| map_word(word, speaker.clone()))
                        .collect(),
                    speaker,
                })
            }
            LiveMessage::EndSession { session_id } => {
                InboundEvent::SessionTerminated(SessionMetadata {
                    session_id,
                    terminated: true,
                    data: value,
                })
            }
            LiveMessage::Other => InboundEvent::Ignored,
        };
        Ok(vec![event])
    }

    fn encode_audio(&self, audio: &[u8]) -> OutboundFrame {
        OutboundFrame::Text(
            json!({ "type": "audio_chunk", "data": { "chunk": STANDARD.encode(audio) } })
                .to_string(),
        )
    }

    fn end_of_stream(&self) -> Option<OutboundFrame> {
        Some(stop_recording())
    }

    fn terminate(&self) -> Option<OutboundFrame> {
        Some(stop_recording())
    }
}

fn stop_recording() -> OutboundFrame {
    OutboundFrame::Text(json!({ "type": "stop_recording" }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_message() {
        let events = GladiaProtocol
            .decode(
                r#"{"session_id":"g-1","type":"transcript","data":{"id":"u1","is_final":true,
                    "utterance":{"text":"bonjour","start":0.5,"end":1.1,"confidence":0.8,"speaker":1,
                    "words":[{"word":"bonjour","start":0.5,"end":1.1,"confidence":0.8}]}}}"#,
            )
            .unwrap();

        let InboundEvent::Transcript(transcript) = &events[0] else {
            panic!("expected transcript, got {events:?}");
        };
        assert!(transcript.is_final);
        assert_eq!(transcript.text, "bonjour");
        assert_eq!(transcript.speaker.as_deref(), Some("1"));
        assert_eq!(transcript.words[0].start, 0.5);
        assert_eq!(transcript.words[0].speaker.as_deref(), Some("1"));
    }

    #[test]
    fn test_session_lifecycle_messages() {
        let started = GladiaProtocol
            .decode(r#"{"type":"start_session","session_id":"g-1"}"#)
            .unwrap();
        assert!(
            matches!(&started[0], InboundEvent::SessionStarted(m) if m.session_id.as_deref() == Some("g-1"))
        );

        let ended = GladiaProtocol
            .decode(r#"{"type":"end_session","session_id":"g-1"}"#)
            .unwrap();
        assert!(matches!(&ended[0], InboundEvent::SessionTerminated(m) if m.terminated));
    }

    #[test]
    fn test_error_message() {
        let events = GladiaProtocol
            .decode(r#"{"type":"error","error":{"message":"invalid audio chunk"}}"#)
            .unwrap();
        assert!(
            matches!(&events[0], InboundEvent::VendorError(e) if e.message == "invalid audio chunk")
        );
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let events = GladiaProtocol
            .decode(r#"{"type":"speech_start","data":{"time":1.2}}"#)
            .unwrap();
        assert_eq!(events, vec![InboundEvent::Ignored]);
    }

    #[test]
    fn test_outbound_frames() {
        let OutboundFrame::Text(audio) = GladiaProtocol.encode_audio(&[1, 2, 3]) else {
            panic!("audio must be sent as text");
        };
        assert_eq!(
            serde_json::from_str::<Value>(&audio).unwrap(),
            json!({"type": "audio_chunk", "data": {"chunk": "AQID"}})
        );
        assert_eq!(
            GladiaProtocol.terminate(),
            Some(OutboundFrame::Text(r#"{"type":"stop_recording"}"#.to_string()))
        );
    }
}
