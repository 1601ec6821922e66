//! Deepgram live protocol. Audio goes out as raw binary frames.

use serde::Deserialize;
use serde_json::{json, Value};
use transcription::streaming::{InboundEvent, OutboundFrame, StreamProtocol};
use transcription::types::{
    SessionMetadata, StreamTranscript, StreamingOptions, TranscriptionProvider,
};
use transcription::{Error, ErrorCode, TranscriptionError};
use url::Url;

use super::map_word;
use super::types::Channel;
use crate::language;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum LiveMessage {
    Results {
        is_final: bool,
        channel: Channel,
    },
    /// Sent once the server has flushed everything after `CloseStream`.
    Metadata {
        #[serde(default)]
        request_id: Option<String>,
    },
    Error,
    /// `UtteranceEnd`, `SpeechStarted` and anything newer.
    #[serde(other)]
    Other,
}

pub struct DeepgramProtocol;

impl StreamProtocol for DeepgramProtocol {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Deepgram
    }

    fn decode(&self, text: &str) -> Result<Vec<InboundEvent>, Error> {
        let value: Value = serde_json::from_str(text)?;

        let event = match serde_json::from_value::<LiveMessage>(value.clone())? {
            LiveMessage::Results { is_final, channel } => {
                let Some(alternative) = channel.alternatives.into_iter().next() else {
                    return Ok(vec![InboundEvent::Ignored]);
                };
                // Silence produces empty results.
                if alternative.transcript.is_empty() {
                    return Ok(vec![InboundEvent::Ignored]);
                }
                let words: Vec<_> = alternative.words.iter().map(map_word).collect();
                InboundEvent::Transcript(StreamTranscript {
                    text: alternative.transcript,
                    is_final,
                    confidence: alternative.confidence,
                    speaker: words.first().and_then(|word| word.speaker.clone()),
                    words,
                })
            }
            LiveMessage::Metadata { request_id } => {
                InboundEvent::SessionTerminated(SessionMetadata {
                    session_id: request_id,
                    terminated: true,
                    data: value,
                })
            }
            LiveMessage::Error => {
                let message = ["description", "message"]
                    .iter()
                    .find_map(|field| value.get(*field).and_then(Value::as_str))
                    .unwrap_or(ErrorCode::ProviderError.default_message())
                    .to_string();
                InboundEvent::VendorError(
                    TranscriptionError::new(ErrorCode::ProviderError, message).with_details(value),
                )
            }
            LiveMessage::Other => InboundEvent::Ignored,
        };
        Ok(vec![event])
    }

    fn encode_audio(&self, audio: &[u8]) -> OutboundFrame {
        OutboundFrame::Binary(audio.to_vec())
    }

    fn end_of_stream(&self) -> Option<OutboundFrame> {
        Some(OutboundFrame::Text(json!({ "type": "Finalize" }).to_string()))
    }

    fn terminate(&self) -> Option<OutboundFrame> {
        Some(OutboundFrame::Text(
            json!({ "type": "CloseStream" }).to_string(),
        ))
    }
}

/// Socket URL carrying the session options as query parameters.
pub(crate) fn live_url(base: &str, options: &StreamingOptions) -> Result<String, Error> {
    let mut url = Url::parse(base)
        .map_err(|err| Error::Configuration(format!("invalid streaming URL `{base}`: {err}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("encoding", options.encoding.deepgram_name())
            .append_pair("sample_rate", &options.sample_rate.to_string())
            .append_pair("channels", &options.channels.to_string())
            .append_pair("interim_results", &options.interim_results.to_string())
            .append_pair("punctuate", "true");
        if let Some(language) = &options.language {
            query.append_pair("language", &language::DEEPGRAM.vendor_code(language));
        }
        if let Some(model) = &options.model {
            query.append_pair("model", model);
        }
        if options.diarization {
            query.append_pair("diarize", "true");
        }
        if let Some(endpointing) = options.endpointing {
            query.append_pair("endpointing", &endpointing.to_string());
        }
        for term in &options.custom_vocabulary {
            query.append_pair("keyterm", term);
        }
    }
    Ok(url.to_string())
}
