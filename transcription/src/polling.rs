//! Waiting for an asynchronous transcription job to finish.

use std::time::Duration;

use log::*;

use crate::error::{ErrorCode, TranscriptionError};
use crate::traits::TranscriptionAdapter;
use crate::types::{TranscriptionStatus, UnifiedTranscriptResponse};

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(3000),
        }
    }
}

/// Poll `adapter` until the job reaches a terminal state or the budget runs out.
///
/// A failed response from the adapter is returned as is, without further
/// attempts. A job that ends in `error` becomes a `TRANSCRIPTION_ERROR` failure,
/// and an exhausted budget a `POLLING_TIMEOUT` failure.
pub async fn poll_for_completion<A>(
    adapter: &A,
    transcript_id: &str,
    config: &PollingConfig,
) -> UnifiedTranscriptResponse
where
    A: TranscriptionAdapter + ?Sized,
{
    let provider = adapter.provider();

    for attempt in 1..=config.max_attempts {
        let response = adapter.get_transcript(transcript_id).await;

        let status = match response.data() {
            Some(data) => data.status,
            None => {
                warn!(
                    "Polling {provider} transcript {transcript_id} failed on attempt {attempt}: {:?}",
                    response.error()
                );
                return response;
            }
        };
        debug!(
            "Polled {provider} transcript {transcript_id} (attempt {attempt}/{}): {status:?}",
            config.max_attempts
        );

        match status {
            TranscriptionStatus::Completed => {
                info!("{provider} transcript {transcript_id} completed after {attempt} attempt(s)");
                return response;
            }
            TranscriptionStatus::Error => {
                let message = response
                    .data()
                    .and_then(|data| data.metadata.get("error"))
                    .and_then(|error| error.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| ErrorCode::TranscriptionError.default_message().to_string());
                warn!("{provider} transcript {transcript_id} failed: {message}");
                let raw = response.raw;
                let failure = UnifiedTranscriptResponse::failure(
                    provider,
                    TranscriptionError::new(ErrorCode::TranscriptionError, message),
                );
                return match raw {
                    Some(raw) => failure.with_raw(raw),
                    None => failure,
                };
            }
            TranscriptionStatus::Queued | TranscriptionStatus::Processing => {}
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    warn!(
        "{provider} transcript {transcript_id} not finished after {} attempts",
        config.max_attempts
    );
    UnifiedTranscriptResponse::failure(
        provider,
        TranscriptionError::new(
            ErrorCode::PollingTimeout,
            format!(
                "Transcription did not complete after {} polling attempts",
                config.max_attempts
            ),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockTranscriptionAdapter;
    use crate::types::{TranscriptData, TranscriptionProvider};
    use mockall::Sequence;
    use serde_json::json;

    fn with_status(status: TranscriptionStatus) -> UnifiedTranscriptResponse {
        UnifiedTranscriptResponse::success(
            TranscriptionProvider::AssemblyAi,
            TranscriptData::pending("job-1", status),
        )
    }

    fn fast(max_attempts: u32) -> PollingConfig {
        PollingConfig {
            max_attempts,
            interval: Duration::ZERO,
        }
    }

    fn adapter() -> MockTranscriptionAdapter {
        let mut adapter = MockTranscriptionAdapter::new();
        adapter
            .expect_provider()
            .return_const(TranscriptionProvider::AssemblyAi);
        adapter
    }

    #[test]
    fn test_default_config() {
        let config = PollingConfig::default();
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.interval, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_times_out_after_exactly_max_attempts() {
        let mut adapter = adapter();
        adapter
            .expect_get_transcript()
            .times(3)
            .returning(|_| with_status(TranscriptionStatus::Processing));

        let response = poll_for_completion(&adapter, "job-1", &fast(3)).await;

        assert_eq!(response.error().unwrap().code, ErrorCode::PollingTimeout);
    }

    #[tokio::test]
    async fn test_vendor_error_stops_polling() {
        let mut adapter = adapter();
        let mut seq = Sequence::new();
        adapter
            .expect_get_transcript()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| with_status(TranscriptionStatus::Queued));
        adapter
            .expect_get_transcript()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                let mut data = TranscriptData::pending("job-1", TranscriptionStatus::Error);
                data.metadata
                    .insert("error".to_string(), json!("Audio file is corrupt"));
                UnifiedTranscriptResponse::success(TranscriptionProvider::AssemblyAi, data)
            });

        let response = poll_for_completion(&adapter, "job-1", &fast(5)).await;

        let error = response.error().unwrap();
        assert_eq!(error.code, ErrorCode::TranscriptionError);
        assert_eq!(error.message, "Audio file is corrupt");
    }

    #[tokio::test]
    async fn test_returns_completed_response() {
        let mut adapter = adapter();
        let mut seq = Sequence::new();
        adapter
            .expect_get_transcript()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| with_status(TranscriptionStatus::Processing));
        adapter
            .expect_get_transcript()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| with_status(TranscriptionStatus::Completed));

        let response = poll_for_completion(&adapter, "job-1", &fast(10)).await;

        assert_eq!(response.data().unwrap().status, TranscriptionStatus::Completed);
    }

    #[tokio::test]
    async fn test_adapter_failure_is_returned_immediately() {
        let mut adapter = adapter();
        adapter.expect_get_transcript().times(1).returning(|_| {
            UnifiedTranscriptResponse::failure(
                TranscriptionProvider::AssemblyAi,
                TranscriptionError::new(ErrorCode::HttpError, "502").with_status_code(502),
            )
        });

        let response = poll_for_completion(&adapter, "job-1", &fast(10)).await;

        assert_eq!(response.error().unwrap().status_code, Some(502));
    }
}
