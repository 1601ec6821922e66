//! AssemblyAI realtime protocol (`/v2/realtime/ws`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use transcription::streaming::{InboundEvent, OutboundFrame, StreamProtocol};
use transcription::types::{
    ms_to_seconds, SessionMetadata, StreamTranscript, StreamingOptions, TranscriptionProvider,
    Word,
};
use transcription::{Error, ErrorCode, TranscriptionError};
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(tag = "message_type")]
enum RealtimeMessage {
    SessionBegins {
        session_id: String,
    },
    PartialTranscript(RealtimeTranscript),
    FinalTranscript(RealtimeTranscript),
    SessionTerminated,
    /// `SessionInformation` and anything newer.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RealtimeTranscript {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    words: Vec<RealtimeWord>,
}

#[derive(Debug, Deserialize)]
struct RealtimeWord {
    text: String,
    start: i64,
    end: i64,
    confidence: f64,
}

impl RealtimeTranscript {
    fn into_transcript(self, is_final: bool) -> StreamTranscript {
        StreamTranscript {
            text: self.text,
            is_final,
            confidence: self.confidence,
            words: self
                .words
                .into_iter()
                .map(|word| Word {
                    text: word.text,
                    start: ms_to_seconds(word.start),
                    end: ms_to_seconds(word.end),
                    confidence: Some(word.confidence),
                    speaker: None,
                })
                .collect(),
            speaker: None,
        }
    }
}

pub struct AssemblyAiProtocol;

impl StreamProtocol for AssemblyAiProtocol {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::AssemblyAi
    }

    fn decode(&self, text: &str) -> Result<Vec<InboundEvent>, Error> {
        let value: Value = serde_json::from_str(text)?;

        // Error frames carry no message_type.
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            let error = TranscriptionError::new(ErrorCode::ProviderError, message)
                .with_details(value.clone());
            return Ok(vec![InboundEvent::VendorError(error)]);
        }

        let event = match serde_json::from_value::<RealtimeMessage>(value.clone())? {
            RealtimeMessage::SessionBegins { session_id } => {
                InboundEvent::SessionStarted(SessionMetadata {
                    session_id: Some(session_id),
                    terminated: false,
                    data: value,
                })
            }
            RealtimeMessage::PartialTranscript(transcript) => {
                InboundEvent::Transcript(transcript.into_transcript(false))
            }
            RealtimeMessage::FinalTranscript(transcript) => {
                InboundEvent::Transcript(transcript.into_transcript(true))
            }
            RealtimeMessage::SessionTerminated => InboundEvent::SessionTerminated(SessionMetadata {
                session_id: None,
                terminated: true,
                data: value,
            }),
            RealtimeMessage::Other => InboundEvent::Ignored,
        };
        Ok(vec![event])
    }

    fn encode_audio(&self, audio: &[u8]) -> OutboundFrame {
        OutboundFrame::Text(json!({ "audio_data": STANDARD.encode(audio) }).to_string())
    }

    fn end_of_stream(&self) -> Option<OutboundFrame> {
        Some(OutboundFrame::Text(
            json!({ "force_end_utterance": true }).to_string(),
        ))
    }

    fn terminate(&self) -> Option<OutboundFrame> {
        Some(OutboundFrame::Text(
            json!({ "terminate_session": true }).to_string(),
        ))
    }
}

/// Wire name of the session encoding; AssemblyAI only takes PCM variants.
pub(crate) fn realtime_encoding(options: &StreamingOptions) -> Result<&'static str, Error> {
    options.encoding.assemblyai_name().ok_or_else(|| {
        Error::InvalidInput(format!(
            "AssemblyAI realtime does not accept {} audio",
            options.encoding
        ))
    })
}

/// Socket URL for a session authorized by a temporary `token`.
pub(crate) fn realtime_url(
    base: &str,
    token: &str,
    options: &StreamingOptions,
) -> Result<String, Error> {
    let encoding = realtime_encoding(options)?;

    let mut url = Url::parse(base)
        .map_err(|err| Error::Configuration(format!("invalid streaming URL `{base}`: {err}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("sample_rate", &options.sample_rate.to_string())
            .append_pair("token", token)
            .append_pair("encoding", encoding);
        if !options.custom_vocabulary.is_empty() {
            query.append_pair(
                "word_boost",
                &serde_json::to_string(&options.custom_vocabulary)?,
            );
        }
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcription::types::AudioEncoding;

    #[test]
    fn test_session_begins() {
        let events = AssemblyAiProtocol
            .decode(r#"{"message_type":"SessionBegins","session_id":"s-1","expires_at":"2024-01-01T00:00:00"}"#)
            .unwrap();

        match &events[..] {
            [InboundEvent::SessionStarted(metadata)] => {
                assert_eq!(metadata.session_id.as_deref(), Some("s-1"));
                assert!(!metadata.terminated);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_final_transcript_converts_milliseconds() {
        let events = AssemblyAiProtocol
            .decode(
                r#"{"message_type":"FinalTranscript","text":"hello","confidence":0.9,
                    "words":[{"text":"hello","start":2000,"end":2500,"confidence":0.9}]}"#,
            )
            .unwrap();

        let InboundEvent::Transcript(transcript) = &events[0] else {
            panic!("expected transcript, got {events:?}");
        };
        assert!(transcript.is_final);
        assert_eq!(transcript.words[0].start, 2.0);
        assert_eq!(transcript.words[0].end, 2.5);
    }

    #[test]
    fn test_partial_transcript_is_not_final() {
        let events = AssemblyAiProtocol
            .decode(r#"{"message_type":"PartialTranscript","text":"hel"}"#)
            .unwrap();
        assert!(matches!(&events[0], InboundEvent::Transcript(t) if !t.is_final));
    }

    #[test]
    fn test_terminated_and_informational_messages() {
        let events = AssemblyAiProtocol
            .decode(r#"{"message_type":"SessionTerminated"}"#)
            .unwrap();
        assert!(matches!(&events[0], InboundEvent::SessionTerminated(m) if m.terminated));

        let events = AssemblyAiProtocol
            .decode(r#"{"message_type":"SessionInformation","audio_duration_seconds":3.2}"#)
            .unwrap();
        assert_eq!(events, vec![InboundEvent::Ignored]);
    }

    #[test]
    fn test_error_frame() {
        let events = AssemblyAiProtocol
            .decode(r#"{"error":"Audio too short"}"#)
            .unwrap();
        let InboundEvent::VendorError(error) = &events[0] else {
            panic!("expected error, got {events:?}");
        };
        assert_eq!(error.code, ErrorCode::ProviderError);
        assert_eq!(error.message, "Audio too short");
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(AssemblyAiProtocol.decode("not json").is_err());
        assert!(AssemblyAiProtocol
            .decode(r#"{"message_type":"FinalTranscript"}"#)
            .is_err());
    }

    #[test]
    fn test_audio_is_base64_json() {
        let frame = AssemblyAiProtocol.encode_audio(&[1, 2, 3]);
        assert_eq!(
            frame,
            OutboundFrame::Text(r#"{"audio_data":"AQID"}"#.to_string())
        );
    }

    #[test]
    fn test_realtime_url() {
        let url = realtime_url(
            "wss://api.assemblyai.com/v2/realtime/ws",
            "tok",
            &StreamingOptions::default(),
        )
        .unwrap();
        assert_eq!(
            url,
            "wss://api.assemblyai.com/v2/realtime/ws?sample_rate=16000&token=tok&encoding=pcm_s16le"
        );
    }

    #[test]
    fn test_unsupported_encoding_is_invalid_input() {
        let options = StreamingOptions {
            encoding: AudioEncoding::Opus,
            ..Default::default()
        };
        let err = realtime_encoding(&options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }
}
