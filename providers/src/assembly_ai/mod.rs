//! AssemblyAI adapter.
//!
//! Batch jobs go through `/v2/transcript` and are polled until done. Realtime
//! sessions are authorized with a temporary token fetched over REST and then
//! streamed as base64 JSON frames.

mod stream;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use serde_json::json;
use transcription::streaming::{Connector, StreamTarget, WsConnector};
use transcription::types::{
    ms_to_seconds, speakers_from_utterances, AudioInput, StreamingCallbacks, StreamingOptions,
    TranscribeOptions, TranscriptData, TranscriptSummary, TranscriptionProvider,
    TranscriptionStatus, UnifiedTranscriptResponse, Utterance, Word,
};
use transcription::{
    api_wrapper, poll_for_completion, ApiResponse, Error, ErrorCode, PollingConfig,
    RequestOptions, StreamingError, StreamingSession, StreamingTimeouts, TranscriptionAdapter,
    TranscriptionError,
};

pub use stream::AssemblyAiProtocol;
use stream::{realtime_encoding, realtime_url};
use types::{
    CreateTranscriptRequest, RealtimeTokenRequest, RealtimeTokenResponse, TranscriptList,
    TranscriptResponse, TranscriptStatus,
};

use crate::config::ProviderConfig;
use crate::datetime::parse_timestamp;
use crate::http::{Fetched, VendorHttp};
use crate::language;
use crate::schema::{transcribe_schema, transcript_id_schema, TranscribeRequest};

/// Lifetime requested for realtime tokens, in seconds.
const REALTIME_TOKEN_TTL: u32 = 3600;

const PII_POLICIES: [&str; 5] = [
    "person_name",
    "phone_number",
    "email_address",
    "credit_card_number",
    "us_social_security_number",
];

pub struct AssemblyAiAdapter {
    http: VendorHttp,
    polling: PollingConfig,
    streaming: StreamingTimeouts,
    connector: Arc<dyn Connector>,
}

impl AssemblyAiAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        Ok(Self {
            http: VendorHttp::new(TranscriptionProvider::AssemblyAi, &config)?,
            polling: config.polling,
            streaming: config.streaming,
            connector: Arc::new(WsConnector),
        })
    }

    /// Replace the WebSocket connector used by realtime sessions.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    async fn create_transcript(
        &self,
        request: TranscribeRequest,
        options: RequestOptions,
    ) -> Result<Fetched<TranscriptResponse>, Error> {
        debug!(
            "Creating AssemblyAI transcript for audio: {}",
            request.audio_url
        );
        let body = create_request(&request);
        let created: Fetched<TranscriptResponse> = self
            .http
            .post("/v2/transcript", &[], &body, &options)
            .await?;
        info!("Created AssemblyAI transcript with ID: {}", created.body.id);
        Ok(created)
    }

    async fn realtime_token(&self) -> Result<String, TranscriptionError> {
        api_wrapper(
            |body: RealtimeTokenRequest, options: RequestOptions| async move {
                self.http
                    .post::<_, RealtimeTokenResponse>("/v2/realtime/token", &[], &body, &options)
                    .await
                    .map(|fetched| fetched.body.token)
            },
            None,
            RealtimeTokenRequest {
                expires_in: REALTIME_TOKEN_TTL,
            },
            self.http.request_options(),
        )
        .await
        .into_result()
    }
}

#[async_trait]
impl TranscriptionAdapter for AssemblyAiAdapter {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::AssemblyAi
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
                warn!("Rejected AssemblyAI transcription: {err}");
                return UnifiedTranscriptResponse::failure(provider, err.into());
            }
        };

        let created = api_wrapper(
            |request: TranscribeRequest, options: RequestOptions| {
                self.create_transcript(request, options)
            },
            Some(transcribe_schema()),
            TranscribeRequest::new(audio_url, options),
            self.http.request_options(),
        )
        .await;

        let created = match created.into_result() {
            Ok(created) => created,
            Err(error) => return UnifiedTranscriptResponse::failure(provider, error),
        };

        if options.webhook_url.is_some() {
            return UnifiedTranscriptResponse::success(
                provider,
                TranscriptData::pending(created.body.id, TranscriptionStatus::Queued),
            )
            .with_raw(created.raw);
        }

        poll_for_completion(self, &created.body.id, &self.polling).await
    }

    async fn get_transcript(&self, transcript_id: &str) -> UnifiedTranscriptResponse {
        let fetched = api_wrapper(
            |id: String, options: RequestOptions| async move {
                self.http
                    .get::<TranscriptResponse>(&format!("/v2/transcript/{id}"), &[], &options)
                    .await
            },
            Some(transcript_id_schema()),
            transcript_id.to_string(),
            self.http.request_options(),
        )
        .await;

        match fetched.into_result() {
            Ok(Fetched { body, raw }) => UnifiedTranscriptResponse {
                provider: self.provider(),
                result: normalize(body).into(),
                raw: Some(raw),
            },
            Err(error) => UnifiedTranscriptResponse::failure(self.provider(), error),
        }
    }

    async fn delete_transcript(&self, transcript_id: &str) -> ApiResponse<bool> {
        api_wrapper(
            |id: String, options: RequestOptions| async move {
                self.http
                    .delete(&format!("/v2/transcript/{id}"), &options)
                    .await?;
                info!("Deleted AssemblyAI transcript: {id}");
                Ok::<_, Error>(true)
            },
            Some(transcript_id_schema()),
            transcript_id.to_string(),
            self.http.request_options(),
        )
        .await
    }

    async fn list_transcripts(&self, limit: Option<u32>) -> ApiResponse<Vec<TranscriptSummary>> {
        api_wrapper(
            |limit: Option<u32>, options: RequestOptions| async move {
                let query: Vec<(&str, String)> = limit
                    .map(|limit| ("limit", limit.to_string()))
                    .into_iter()
                    .collect();
                let fetched: Fetched<TranscriptList> =
                    self.http.get("/v2/transcript", &query, &options).await?;
                Ok::<_, Error>(
                    fetched
                        .body
                        .transcripts
                        .into_iter()
                        .map(|item| TranscriptSummary {
                            id: item.id,
                            status: status(item.status),
                            created_at: item.created.as_deref().and_then(parse_timestamp),
                            audio_url: item.audio_url,
                        })
                        .collect(),
                )
            },
            None,
            limit,
            self.http.request_options(),
        )
        .await
    }

    async fn transcribe_stream(
        &self,
        options: StreamingOptions,
        callbacks: StreamingCallbacks,
    ) -> Result<StreamingSession, StreamingError> {
        let setup = |err: Error| StreamingError::Setup(err.into());

        let base = self.http.streaming_url().ok_or_else(|| {
            setup(Error::Configuration(
                "no AssemblyAI streaming URL configured".to_string(),
            ))
        })?;
        realtime_encoding(&options).map_err(setup)?;

        let token = self.realtime_token().await.map_err(|err| {
            warn!("Failed to obtain AssemblyAI realtime token: {err}");
            StreamingError::Setup(err)
        })?;
        let url = realtime_url(base, &token, &options).map_err(setup)?;

        let session = StreamingSession::open(
            self.connector.as_ref(),
            StreamTarget::new(url),
            Arc::new(AssemblyAiProtocol),
            callbacks,
            self.streaming,
        )
        .await?;
        info!("Opened AssemblyAI realtime session {}", session.id());
        Ok(session)
    }
}

fn create_request(request: &TranscribeRequest) -> CreateTranscriptRequest {
    let options = &request.options;
    let language_code = options
        .language
        .as_deref()
        .map(|code| language::ASSEMBLYAI.vendor_code(code));

    CreateTranscriptRequest {
        audio_url: request.audio_url.clone(),
        // AssemblyAI rejects an explicit language combined with detection.
        language_detection: (options.language_detection && language_code.is_none())
            .then_some(true),
        language_code,
        punctuate: true,
        format_text: true,
        speaker_labels: options.diarization.then_some(true),
        speakers_expected: options.speakers_expected.filter(|_| options.diarization),
        word_boost: options.custom_vocabulary.clone(),
        summarization: options.summarization.then_some(true),
        summary_model: options
            .summarization
            .then(|| "informative".to_string()),
        summary_type: options.summarization.then(|| "bullets".to_string()),
        sentiment_analysis: options.sentiment_analysis.then_some(true),
        entity_detection: options.entity_detection.then_some(true),
        redact_pii: options.pii_redaction.then_some(true),
        redact_pii_policies: options
            .pii_redaction
            .then(|| PII_POLICIES.iter().map(|policy| policy.to_string()).collect()),
        webhook_url: options.webhook_url.clone(),
    }
}

fn status(status: TranscriptStatus) -> TranscriptionStatus {
    match status {
        TranscriptStatus::Queued => TranscriptionStatus::Queued,
        TranscriptStatus::Processing => TranscriptionStatus::Processing,
        TranscriptStatus::Completed => TranscriptionStatus::Completed,
        TranscriptStatus::Error => TranscriptionStatus::Error,
    }
}

fn map_word(word: &types::Word) -> Word {
    Word {
        text: word.text.clone(),
        start: ms_to_seconds(word.start),
        end: ms_to_seconds(word.end),
        confidence: Some(word.confidence),
        speaker: word.speaker.clone(),
    }
}

fn map_utterance(utterance: &types::Utterance) -> Utterance {
    Utterance {
        text: utterance.text.clone(),
        start: ms_to_seconds(utterance.start),
        end: ms_to_seconds(utterance.end),
        speaker: Some(utterance.speaker.clone()),
        confidence: Some(utterance.confidence),
        words: utterance.words.iter().map(map_word).collect(),
    }
}

/// Unified view of a transcript resource. A failed job becomes `TRANSCRIPTION_ERROR`.
fn normalize(response: TranscriptResponse) -> Result<TranscriptData, TranscriptionError> {
    let status = status(response.status);
    match status {
        TranscriptionStatus::Error => {
            let message = response
                .error
                .unwrap_or_else(|| ErrorCode::TranscriptionError.default_message().to_string());
            return Err(TranscriptionError::new(
                ErrorCode::TranscriptionError,
                message,
            ));
        }
        TranscriptionStatus::Queued | TranscriptionStatus::Processing => {
            return Ok(TranscriptData::pending(response.id, status));
        }
        TranscriptionStatus::Completed => {}
    }

    let utterances: Vec<Utterance> = response
        .utterances
        .unwrap_or_default()
        .iter()
        .map(map_utterance)
        .collect();
    let mut metadata = HashMap::new();
    if let Some(audio_url) = response.audio_url {
        metadata.insert("audio_url".to_string(), json!(audio_url));
    }

    Ok(TranscriptData {
        id: response.id,
        text: response.text.unwrap_or_default(),
        status,
        confidence: response.confidence,
        language: response.language_code,
        duration: response.audio_duration,
        speakers: speakers_from_utterances(&utterances),
        words: response
            .words
            .unwrap_or_default()
            .iter()
            .map(map_word)
            .collect(),
        utterances,
        summary: response.summary,
        metadata,
        created_at: None,
        completed_at: None,
    })
}
