//! Deepgram adapter.
//!
//! Batch transcription is synchronous: `POST /v1/listen` answers with the
//! finished transcript, so there is nothing to poll and nothing stored to fetch
//! later. With a callback URL Deepgram only acknowledges the request.

mod stream;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use provider_auth::api_key::ProviderAuth;
use reqwest::header::HeaderMap;
use transcription::streaming::{Connector, StreamTarget, WsConnector};
use transcription::types::{
    speakers_from_utterances, AudioInput, StreamingCallbacks, StreamingOptions, TranscribeOptions,
    TranscriptData, TranscriptionProvider, TranscriptionStatus, UnifiedTranscriptResponse,
    Utterance, Word,
};
use transcription::{
    api_wrapper, Error, ErrorCode, RequestOptions, StreamingError, StreamingSession,
    StreamingTimeouts, TranscriptionAdapter, TranscriptionError,
};

pub use stream::DeepgramProtocol;
use stream::live_url;
use types::{ListenOutcome, ListenRequest, ListenResponse};

use crate::config::ProviderConfig;
use crate::datetime::parse_timestamp;
use crate::http::{Fetched, VendorHttp};
use crate::language;
use crate::schema::{transcribe_schema, TranscribeRequest};

pub struct DeepgramAdapter {
    http: VendorHttp,
    streaming: StreamingTimeouts,
    connector: Arc<dyn Connector>,
}

impl DeepgramAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        Ok(Self {
            http: VendorHttp::new(TranscriptionProvider::Deepgram, &config)?,
            streaming: config.streaming,
            connector: Arc::new(WsConnector),
        })
    }

    /// Replace the WebSocket connector used by live sessions.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    async fn listen(
        &self,
        request: TranscribeRequest,
        options: RequestOptions,
    ) -> Result<Fetched<ListenOutcome>, Error> {
        debug!("Submitting Deepgram listen request for audio: {}", request.audio_url);
        let query = listen_query(&request.options);
        let body = ListenRequest {
            url: request.audio_url,
        };
        let outcome: Fetched<ListenOutcome> =
            self.http.post("/v1/listen", &query, &body, &options).await?;
        match &outcome.body {
            ListenOutcome::Completed(response) => info!(
                "Deepgram transcribed request: {}",
                response.metadata.request_id
            ),
            ListenOutcome::Accepted(accepted) => info!(
                "Deepgram accepted callback request: {}",
                accepted.request_id
            ),
        }
        Ok(outcome)
    }

    fn handshake_headers(&self) -> Result<HeaderMap, Error> {
        let auth = self.http.auth();
        if !auth.has_key() {
            return Err(Error::MissingApiKey(
                "no API key configured for deepgram".to_string(),
            ));
        }
        let mut headers = HeaderMap::new();
        auth.authenticate(&mut headers)?;
        Ok(headers)
    }
}

#[async_trait]
impl TranscriptionAdapter for DeepgramAdapter {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Deepgram
    }

    async fn transcribe(
        &self,
        audio: AudioInput,
        options: &TranscribeOptions,
    ) -> UnifiedTranscriptResponse {
        let provider = self.provider();
        let audio_url = match audio.into_url() {
            Ok(url) => url,
            Err(err) => {
                warn!("Rejected Deepgram transcription: {err}");
                return UnifiedTranscriptResponse::failure(provider, err.into());
            }
        };

        let outcome = api_wrapper(
            |request: TranscribeRequest, options: RequestOptions| self.listen(request, options),
            Some(transcribe_schema()),
            TranscribeRequest::new(audio_url, options),
            self.http.request_options(),
        )
        .await;

        match outcome.into_result() {
            Ok(Fetched {
                body: ListenOutcome::Completed(response),
                raw,
            }) => UnifiedTranscriptResponse::success(provider, normalize(*response)).with_raw(raw),
            Ok(Fetched {
                body: ListenOutcome::Accepted(accepted),
                raw,
            }) => UnifiedTranscriptResponse::success(
                provider,
                TranscriptData::pending(accepted.request_id, TranscriptionStatus::Queued),
            )
            .with_raw(raw),
            Err(error) => UnifiedTranscriptResponse::failure(provider, error),
        }
    }

    async fn get_transcript(&self, transcript_id: &str) -> UnifiedTranscriptResponse {
        debug!("Deepgram cannot fetch transcript {transcript_id}");
        UnifiedTranscriptResponse::failure(
            self.provider(),
            TranscriptionError::new(
                ErrorCode::NotSupported,
                "Deepgram returns results synchronously; transcripts cannot be fetched by id",
            ),
        )
    }

    async fn transcribe_stream(
        &self,
        options: StreamingOptions,
        callbacks: StreamingCallbacks,
    ) -> Result<StreamingSession, StreamingError> {
        let setup = |err: Error| StreamingError::Setup(err.into());

        let base = self.http.streaming_url().ok_or_else(|| {
            setup(Error::Configuration(
                "no Deepgram streaming URL configured".to_string(),
            ))
        })?;
        let headers = self.handshake_headers().map_err(setup)?;
        let url = live_url(base, &options).map_err(setup)?;

        let session = StreamingSession::open(
            self.connector.as_ref(),
            StreamTarget::new(url).with_headers(headers),
            Arc::new(DeepgramProtocol),
            callbacks,
            self.streaming,
        )
        .await?;
        info!("Opened Deepgram live session {}", session.id());
        Ok(session)
    }
}

/// Feature flags for `/v1/listen`. Punctuation and smart formatting are always on.
fn listen_query(options: &TranscribeOptions) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("punctuate", "true".to_string()),
        ("smart_format", "true".to_string()),
    ];
    match &options.language {
        Some(code) => query.push(("language", language::DEEPGRAM.vendor_code(code))),
        None if options.language_detection => query.push(("detect_language", "true".to_string())),
        None => {}
    }
    if options.diarization {
        query.push(("diarize", "true".to_string()));
        query.push(("utterances", "true".to_string()));
    }
    for term in &options.custom_vocabulary {
        query.push(("keyterm", term.clone()));
    }
    if options.summarization {
        query.push(("summarize", "v2".to_string()));
    }
    if options.sentiment_analysis {
        query.push(("sentiment", "true".to_string()));
    }
    if options.entity_detection {
        query.push(("detect_entities", "true".to_string()));
    }
    if options.pii_redaction {
        query.push(("redact", "pii".to_string()));
    }
    if let Some(callback) = &options.webhook_url {
        query.push(("callback", callback.clone()));
    }
    query
}

fn map_word(word: &types::Word) -> Word {
    Word {
        text: word
            .punctuated_word
            .clone()
            .unwrap_or_else(|| word.word.clone()),
        start: word.start,
        end: word.end,
        confidence: word.confidence,
        speaker: word.speaker.map(|id| id.to_string()),
    }
}

fn map_utterance(utterance: &types::Utterance) -> Utterance {
    Utterance {
        text: utterance.transcript.clone(),
        start: utterance.start,
        end: utterance.end,
        speaker: utterance.speaker.map(|id| id.to_string()),
        confidence: utterance.confidence,
        words: utterance.words.iter().map(map_word).collect(),
    }
}

/// First channel, first alternative. Deepgram times are already seconds.
fn normalize(response: ListenResponse) -> TranscriptData {
    let utterances: Vec<Utterance> = response.results.utterances.iter().map(map_utterance).collect();
    let channel = response.results.channels.first();
    let alternative = channel.and_then(|channel| channel.alternatives.first());

    TranscriptData {
        id: response.metadata.request_id,
        text: alternative
            .map(|alternative| alternative.transcript.clone())
            .unwrap_or_default(),
        status: TranscriptionStatus::Completed,
        confidence: alternative.and_then(|alternative| alternative.confidence),
        language: channel.and_then(|channel| channel.detected_language.clone()),
        duration: response.metadata.duration,
        speakers: speakers_from_utterances(&utterances),
        words: alternative
            .map(|alternative| alternative.words.iter().map(map_word).collect())
            .unwrap_or_default(),
        utterances,
        summary: response.results.summary.and_then(|summary| summary.short),
        created_at: response.metadata.created.as_deref().and_then(parse_timestamp),
        ..Default::default()
    }
}
