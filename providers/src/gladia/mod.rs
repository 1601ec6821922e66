//! Gladia adapter.
//!
//! Pre-recorded jobs go through `/v2/pre-recorded`. Live sessions are created
//! with `POST /v2/live`, which returns a pre-authorized socket URL.

mod stream;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use transcription::streaming::{Connector, StreamTarget, WsConnector};
use transcription::types::{
    speakers_from_utterances, AudioInput, StreamingCallbacks, StreamingOptions, TranscribeOptions,
    TranscriptData, TranscriptSummary, TranscriptionProvider, TranscriptionStatus,
    UnifiedTranscriptResponse, Utterance, Word,
};
use transcription::{
    api_wrapper, poll_for_completion, ApiResponse, Error, ErrorCode, PollingConfig,
    RequestOptions, StreamingError, StreamingSession, StreamingTimeouts, TranscriptionAdapter,
    TranscriptionError,
};

pub use stream::GladiaProtocol;
use types::{
    CallbackConfig, CustomVocabularyConfig, DiarizationConfig, InitTranscriptionRequest,
    InitTranscriptionResponse, JobList, JobStatus, LanguageConfig, LiveSessionRequest,
    LiveSessionResponse, MessagesConfig, PreRecordedJob, RealtimeProcessing, SummarizationConfig,
    TranscriptionResult,
};

use crate::config::ProviderConfig;
use crate::datetime::parse_timestamp;
use crate::http::{Fetched, VendorHttp};
use crate::language;
use crate::schema::{transcribe_schema, transcript_id_schema, TranscribeRequest};

pub struct GladiaAdapter {
    http: VendorHttp,
    polling: PollingConfig,
    streaming: StreamingTimeouts,
    connector: Arc<dyn Connector>,
}

impl GladiaAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        Ok(Self {
            http: VendorHttp::new(TranscriptionProvider::Gladia, &config)?,
            polling: config.polling,
            streaming: config.streaming,
            connector: Arc::new(WsConnector),
        })
    }

    /// Replace the WebSocket connector used by live sessions.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    async fn create_job(
        &self,
        request: TranscribeRequest,
        options: RequestOptions,
    ) -> Result<Fetched<InitTranscriptionResponse>, Error> {
        debug!("Creating Gladia job for audio: {}", request.audio_url);
        let body = create_request(&request);
        let created: Fetched<InitTranscriptionResponse> = self
            .http
            .post("/v2/pre-recorded", &[], &body, &options)
            .await?;
        info!("Created Gladia job with ID: {}", created.body.id);
        Ok(created)
    }

    async fn live_session(
        &self,
        request: LiveSessionRequest,
    ) -> Result<LiveSessionResponse, TranscriptionError> {
        api_wrapper(
            |body: LiveSessionRequest, options: RequestOptions| async move {
                self.http
                    .post::<_, LiveSessionResponse>("/v2/live", &[], &body, &options)
                    .await
                    .map(|fetched| fetched.body)
            },
            None,
            request,
            self.http.request_options(),
        )
        .await
        .into_result()
    }
}

#[async_trait]
impl TranscriptionAdapter for GladiaAdapter {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Gladia
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
                warn!("Rejected Gladia transcription: {err}");
                return UnifiedTranscriptResponse::failure(provider, err.into());
            }
        };

        let created = api_wrapper(
            |request: TranscribeRequest, options: RequestOptions| self.create_job(request, options),
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
                    .get::<PreRecordedJob>(&format!("/v2/pre-recorded/{id}"), &[], &options)
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
                    .delete(&format!("/v2/pre-recorded/{id}"), &options)
                    .await?;
                info!("Deleted Gladia job: {id}");
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
                let fetched: Fetched<JobList> =
                    self.http.get("/v2/pre-recorded", &query, &options).await?;
                Ok::<_, Error>(
                    fetched
                        .body
                        .items
                        .into_iter()
                        .map(|job| TranscriptSummary {
                            status: status(job.status),
                            created_at: job.created_at.as_deref().and_then(parse_timestamp),
                            audio_url: job.request_params.and_then(|params| params.audio_url),
                            id: job.id,
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
        let request = live_request(&options)
            .map_err(|err| StreamingError::Setup(TranscriptionError::from(err)))?;

        let live = self.live_session(request).await.map_err(|err| {
            warn!("Failed to create Gladia live session: {err}");
            StreamingError::Setup(err)
        })?;
        debug!("Gladia live session {} created", live.id);

        let session = StreamingSession::open(
            self.connector.as_ref(),
            StreamTarget::new(live.url),
            Arc::new(GladiaProtocol),
            callbacks,
            self.streaming,
        )
        .await?;
        info!(
            "Opened Gladia live session {} (vendor id {})",
            session.id(),
            live.id
        );
        Ok(session)
    }
}

fn create_request(request: &TranscribeRequest) -> InitTranscriptionRequest {
    let options = &request.options;
    let vocabulary = (!options.custom_vocabulary.is_empty()).then(|| CustomVocabularyConfig {
        vocabulary: options.custom_vocabulary.clone(),
    });

    InitTranscriptionRequest {
        audio_url: request.audio_url.clone(),
        language_config: language_config(options.language.as_deref(), options.language_detection),
        punctuation_enhanced: true,
        diarization: options.diarization.then_some(true),
        diarization_config: options
            .speakers_expected
            .filter(|_| options.diarization)
            .map(|number_of_speakers| DiarizationConfig { number_of_speakers }),
        custom_vocabulary: vocabulary.as_ref().map(|_| true),
        custom_vocabulary_config: vocabulary,
        summarization: options.summarization.then_some(true),
        summarization_config: options.summarization.then(|| SummarizationConfig {
            kind: "bullet_points".to_string(),
        }),
        sentiment_analysis: options.sentiment_analysis.then_some(true),
        named_entity_recognition: options.entity_detection.then_some(true),
        callback: options.webhook_url.as_ref().map(|_| true),
        callback_config: options.webhook_url.as_ref().map(|url| CallbackConfig {
            url: url.clone(),
            method: "POST".to_string(),
        }),
        custom_metadata: (!options.metadata.is_empty()).then(|| options.metadata.clone()),
    }
}

fn language_config(language: Option<&str>, detection: bool) -> Option<LanguageConfig> {
    match language {
        Some(code) => Some(LanguageConfig {
            languages: vec![language::GLADIA.vendor_code(code)],
            code_switching: false,
        }),
        None if detection => Some(LanguageConfig {
            languages: Vec::new(),
            code_switching: true,
        }),
        None => None,
    }
}

fn live_request(options: &StreamingOptions) -> Result<LiveSessionRequest, Error> {
    let encoding = options.encoding.gladia_name().ok_or_else(|| {
        Error::InvalidInput(format!(
            "Gladia live does not accept {} audio",
            options.encoding
        ))
    })?;

    Ok(LiveSessionRequest {
        encoding: encoding.to_string(),
        bit_depth: options.bit_depth,
        sample_rate: options.sample_rate,
        channels: options.channels,
        model: options.model.clone(),
        endpointing: options.endpointing.map(|ms| f64::from(ms) / 1000.0),
        language_config: language_config(options.language.as_deref(), false),
        realtime_processing: (!options.custom_vocabulary.is_empty()).then(|| {
            RealtimeProcessing {
                custom_vocabulary: true,
                custom_vocabulary_config: CustomVocabularyConfig {
                    vocabulary: options.custom_vocabulary.clone(),
                },
            }
        }),
        messages_config: MessagesConfig {
            receive_partial_transcripts: options.interim_results,
            receive_final_transcripts: true,
        },
    })
}

fn status(status: JobStatus) -> TranscriptionStatus {
    match status {
        JobStatus::Queued => TranscriptionStatus::Queued,
        JobStatus::Processing => TranscriptionStatus::Processing,
        JobStatus::Done => TranscriptionStatus::Completed,
        JobStatus::Error => TranscriptionStatus::Error,
    }
}

fn map_word(word: &types::Word, speaker: Option<String>) -> Word {
    Word {
        text: word.word.clone(),
        start: word.start,
        end: word.end,
        confidence: word.confidence,
        speaker,
    }
}

fn map_utterance(utterance: &types::Utterance) -> Utterance {
    let speaker = utterance.speaker.map(|id| id.to_string());
    Utterance {
        text: utterance.text.clone(),
        start: utterance.start,
        end: utterance.end,
        words: utterance
            .words
            .iter()
            .map(|word| map_word(word, speaker.clone()))
            .collect(),
        speaker,
        confidence: utterance.confidence,
    }
}

/// Completed transcript content of a job result. Gladia times are already in seconds.
pub(crate) fn result_data(id: String, result: &TranscriptionResult) -> TranscriptData {
    let mut data = TranscriptData::pending(id, TranscriptionStatus::Completed);
    data.duration = result.metadata.as_ref().map(|metadata| metadata.audio_duration);
    data.summary = result
        .summarization
        .as_ref()
        .filter(|summary| summary.success)
        .and_then(|summary| summary.results.clone());

    if let Some(transcription) = &result.transcription {
        data.text = transcription.full_transcript.clone();
        data.language = transcription.languages.first().cloned();
        data.utterances = transcription.utterances.iter().map(map_utterance).collect();
        data.words = data
            .utterances
            .iter()
            .flat_map(|utterance| utterance.words.iter().cloned())
            .collect();
        data.speakers = speakers_from_utterances(&data.utterances);
    }
    data
}

fn normalize(job: PreRecordedJob) -> Result<TranscriptData, TranscriptionError> {
    let status = status(job.status);
    match status {
        TranscriptionStatus::Error => {
            let (message, status_code) = match job.error_code {
                Some(code) => (
                    format!("Transcription failed with error code {code}"),
                    u16::try_from(code).ok().filter(|code| (400..600).contains(code)),
                ),
                None => (
                    ErrorCode::TranscriptionError.default_message().to_string(),
                    None,
                ),
            };
            let error = TranscriptionError::new(ErrorCode::TranscriptionError, message);
            return Err(match status_code {
                Some(code) => error.with_status_code(code),
                None => error,
            });
        }
        TranscriptionStatus::Queued | TranscriptionStatus::Processing => {
            return Ok(TranscriptData::pending(job.id, status));
        }
        TranscriptionStatus::Completed => {}
    }

    let mut data = match &job.result {
        Some(result) => result_data(job.id, result),
        None => TranscriptData::pending(job.id, status),
    };
    data.metadata = job.custom_metadata.unwrap_or_default();
    data.created_at = job.created_at.as_deref().and_then(parse_timestamp);
    data.completed_at = job.completed_at.as_deref().and_then(parse_timestamp);
    Ok(data)
}
