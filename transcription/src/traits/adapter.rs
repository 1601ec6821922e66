//! Transcription provider adapter trait.

use async_trait::async_trait;

use crate::api::ApiResponse;
use crate::error::ErrorCode;
use crate::streaming::{StreamingError, StreamingSession};
use crate::types::{
    AudioInput, ProviderCapabilities, StreamingCallbacks, StreamingOptions, TranscribeOptions,
    TranscriptSummary, TranscriptionProvider, UnifiedTranscriptResponse,
};

/// Abstraction over one speech-to-text vendor.
///
/// Implementations translate [`TranscribeOptions`] into the vendor's request
/// format and normalize whatever comes back into a [`UnifiedTranscriptResponse`].
/// Batch operations never fail with an `Err` and never panic: every failure is
/// reported as a failed response carrying an error code.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait TranscriptionAdapter: Send + Sync {
    /// Vendor this adapter talks to.
    fn provider(&self) -> TranscriptionProvider;

    /// Features the vendor supports. Options for anything else are ignored.
    fn capabilities(&self) -> ProviderCapabilities {
        self.provider().capabilities()
    }

    /// Submit audio for transcription.
    ///
    /// With a `webhook_url` in `options` this returns as soon as the vendor
    /// accepted the job, with status `queued` and the vendor job id. Without one
    /// it waits for the job to finish by polling [`get_transcript`](Self::get_transcript).
    /// Only URL audio is accepted; other inputs produce an `INVALID_INPUT` failure.
    async fn transcribe(
        &self,
        audio: AudioInput,
        options: &TranscribeOptions,
    ) -> UnifiedTranscriptResponse;

    /// Current state of a previously submitted job.
    ///
    /// Content fields are populated only once the status is `completed`.
    async fn get_transcript(&self, transcript_id: &str) -> UnifiedTranscriptResponse;

    /// Permanently delete a job and its results from the vendor.
    async fn delete_transcript(&self, transcript_id: &str) -> ApiResponse<bool> {
        let _ = transcript_id;
        ApiResponse::failure(
            ErrorCode::NotSupported,
            format!("{} does not support deleting transcripts", self.provider()),
        )
    }

    /// Most recent jobs, newest first.
    async fn list_transcripts(&self, limit: Option<u32>) -> ApiResponse<Vec<TranscriptSummary>> {
        let _ = limit;
        ApiResponse::failure(
            ErrorCode::NotSupported,
            format!("{} does not support listing transcripts", self.provider()),
        )
    }

    /// Open a live session. Results are delivered through `callbacks`.
    async fn transcribe_stream(
        &self,
        options: StreamingOptions,
        callbacks: StreamingCallbacks,
    ) -> Result<StreamingSession, StreamingError> {
        let _ = (options, callbacks);
        Err(StreamingError::NotSupported(self.provider()))
    }
}
