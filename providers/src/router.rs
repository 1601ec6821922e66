//! Provider-agnostic entry point over the configured adapters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::*;
use transcription::types::{
    AudioInput, ProviderCapabilities, StreamingCallbacks, StreamingOptions, TranscribeOptions,
    TranscriptSummary, TranscriptionProvider, UnifiedTranscriptResponse,
};
use transcription::{ApiResponse, Error, StreamingError, StreamingSession, TranscriptionAdapter};

use crate::adapter_for;
use crate::config::ProviderConfig;

/// How a provider is chosen when the caller does not name one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Every call must name its provider.
    Explicit,
    /// Use the configured default, or the first registered provider.
    #[default]
    Default,
    /// Rotate through the registered providers.
    RoundRobin,
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionStrategy::Explicit => "explicit",
            SelectionStrategy::Default => "default",
            SelectionStrategy::RoundRobin => "round-robin",
        })
    }
}

impl FromStr for SelectionStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(SelectionStrategy::Explicit),
            "default" => Ok(SelectionStrategy::Default),
            "round-robin" | "round_robin" | "roundrobin" => Ok(SelectionStrategy::RoundRobin),
            other => Err(Error::Configuration(format!(
                "unknown selection strategy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoiceRouterConfig {
    pub providers: BTreeMap<TranscriptionProvider, ProviderConfig>,
    pub default_provider: Option<TranscriptionProvider>,
    pub selection_strategy: SelectionStrategy,
}

/// Routes calls to one of several vendor adapters.
///
/// Selection misuse (an unregistered provider, or no provider under the
/// explicit strategy) is an `Err`. Everything the vendor reports comes back as
/// the adapter's own response.
pub struct VoiceRouter {
    adapters: BTreeMap<TranscriptionProvider, Arc<dyn TranscriptionAdapter>>,
    default_provider: Option<TranscriptionProvider>,
    strategy: SelectionStrategy,
    next: AtomicUsize,
}

impl VoiceRouter {
    /// Build an adapter for every configured provider.
    pub fn new(config: VoiceRouterConfig) -> Result<Self, Error> {
        let adapters = config
            .providers
            .into_iter()
            .map(|(provider, provider_config)| adapter_for(provider, provider_config))
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_adapters(adapters, config.default_provider, config.selection_strategy)
    }

    /// Router over prebuilt adapters.
    pub fn with_adapters(
        adapters: Vec<Arc<dyn TranscriptionAdapter>>,
        default_provider: Option<TranscriptionProvider>,
        strategy: SelectionStrategy,
    ) -> Result<Self, Error> {
        if adapters.is_empty() {
            return Err(Error::Configuration(
                "VoiceRouter requires at least one provider".to_string(),
            ));
        }

        let adapters: BTreeMap<_, _> = adapters
            .into_iter()
            .map(|adapter| (adapter.provider(), adapter))
            .collect();

        if let Some(provider) = default_provider {
            if !adapters.contains_key(&provider) {
                return Err(Error::Configuration(format!(
                    "default provider {provider} is not configured"
                )));
            }
        }
        let default_provider = match strategy {
            SelectionStrategy::Default => {
                default_provider.or_else(|| adapters.keys().next().copied())
            }
            _ => default_provider,
        };

        info!(
            "VoiceRouter ready with providers [{}] using {strategy} selection",
            join(adapters.keys())
        );
        Ok(Self {
            adapters,
            default_provider,
            strategy,
            next: AtomicUsize::new(0),
        })
    }

    /// Add or replace the adapter for its provider.
    pub fn register_adapter(&mut self, adapter: Arc<dyn TranscriptionAdapter>) {
        let provider = adapter.provider();
        debug!("Registering adapter for {provider}");
        self.adapters.insert(provider, adapter);
    }

    pub fn adapter(
        &self,
        provider: TranscriptionProvider,
    ) -> Result<&Arc<dyn TranscriptionAdapter>, Error> {
        self.adapters.get(&provider).ok_or_else(|| {
            Error::Configuration(format!(
                "provider {provider} is not registered (available: {})",
                join(self.adapters.keys())
            ))
        })
    }

    /// Provider to use: `preferred` when given, otherwise per the selection strategy.
    pub fn select_provider(
        &self,
        preferred: Option<TranscriptionProvider>,
    ) -> Result<TranscriptionProvider, Error> {
        if let Some(provider) = preferred {
            self.adapter(provider)?;
            return Ok(provider);
        }

        match self.strategy {
            SelectionStrategy::Explicit => Err(Error::Configuration(
                "a provider must be named when using the explicit selection strategy".to_string(),
            )),
            SelectionStrategy::Default => self.default_provider.ok_or_else(|| {
                Error::Configuration("no default provider configured".to_string())
            }),
            SelectionStrategy::RoundRobin => {
                let index = self.next.fetch_add(1, Ordering::Relaxed) % self.adapters.len();
                self.adapters.keys().nth(index).copied().ok_or_else(|| {
                    Error::Configuration("no providers registered".to_string())
                })
            }
        }
    }

    pub async fn transcribe(
        &self,
        audio: AudioInput,
        options: &TranscribeOptions,
    ) -> Result<UnifiedTranscriptResponse, Error> {
        let provider = self.select_provider(None)?;
        self.transcribe_with_provider(provider, audio, options).await
    }

    pub async fn transcribe_with_provider(
        &self,
        provider: TranscriptionProvider,
        audio: AudioInput,
        options: &TranscribeOptions,
    ) -> Result<UnifiedTranscriptResponse, Error> {
        let adapter = self.adapter(provider)?;
        debug!("Routing {} transcription to {provider}", audio.kind());
        Ok(adapter.transcribe(audio, options).await)
    }

    pub async fn transcribe_url(
        &self,
        url: &str,
        options: &TranscribeOptions,
    ) -> Result<UnifiedTranscriptResponse, Error> {
        self.transcribe(AudioInput::url(url), options).await
    }

    /// Transcript ids are vendor specific, so the provider is always named.
    pub async fn get_transcript(
        &self,
        transcript_id: &str,
        provider: TranscriptionProvider,
    ) -> Result<UnifiedTranscriptResponse, Error> {
        Ok(self.adapter(provider)?.get_transcript(transcript_id).await)
    }

    pub async fn delete_transcript(
        &self,
        transcript_id: &str,
        provider: TranscriptionProvider,
    ) -> Result<ApiResponse<bool>, Error> {
        Ok(self.adapter(provider)?.delete_transcript(transcript_id).await)
    }

    pub async fn list_transcripts(
        &self,
        provider: TranscriptionProvider,
        limit: Option<u32>,
    ) -> Result<ApiResponse<Vec<TranscriptSummary>>, Error> {
        Ok(self.adapter(provider)?.list_transcripts(limit).await)
    }

    /// Open a live session on `provider`, or on the strategy's choice.
    pub async fn transcribe_stream(
        &self,
        provider: Option<TranscriptionProvider>,
        options: StreamingOptions,
        callbacks: StreamingCallbacks,
    ) -> Result<StreamingSession, StreamingError> {
        let provider = self
            .select_provider(provider)
            .map_err(|err| StreamingError::Setup(err.into()))?;
        let adapter = self
            .adapter(provider)
            .map_err(|err| StreamingError::Setup(err.into()))?;

        if !adapter.capabilities().streaming {
            warn!("Refusing to stream with {provider}: not supported");
            return Err(StreamingError::NotSupported(provider));
        }
        adapter.transcribe_stream(options, callbacks).await
    }

    pub fn provider_capabilities(
        &self,
        provider: TranscriptionProvider,
    ) -> Option<ProviderCapabilities> {
        self.adapters.get(&provider).map(|adapter| adapter.capabilities())
    }

    pub fn registered_providers(&self) -> Vec<TranscriptionProvider> {
        self.adapters.keys().copied().collect()
    }

    pub fn default_provider(&self) -> Option<TranscriptionProvider> {
        self.default_provider
    }
}

fn join<'a>(providers: impl Iterator<Item = &'a TranscriptionProvider>) -> String {
    providers
        .map(TranscriptionProvider::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcription::traits::MockTranscriptionAdapter;
    use transcription::types::{TranscriptData, TranscriptionStatus};
    use transcription::ErrorCode;

    fn mock(provider: TranscriptionProvider) -> MockTranscriptionAdapter {
        let mut adapter = MockTranscriptionAdapter::new();
        adapter.expect_provider().return_const(provider);
        adapter
    }

    fn shared(adapter: MockTranscriptionAdapter) -> Arc<dyn TranscriptionAdapter> {
        Arc::new(adapter)
    }

    fn transcribing(provider: TranscriptionProvider) -> Arc<dyn TranscriptionAdapter> {
        let mut adapter = mock(provider);
        adapter.expect_transcribe().returning(move |_, _| {
            UnifiedTranscriptResponse::success(
                provider,
                TranscriptData::pending("job", TranscriptionStatus::Queued),
            )
        });
        Arc::new(adapter)
    }

    #[test]
    fn test_empty_configuration_is_an_error() {
        let err = VoiceRouter::new(VoiceRouterConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_builds_adapters_from_configuration() {
        let mut providers = BTreeMap::new();
        providers.insert(TranscriptionProvider::Deepgram, ProviderConfig::new("dg"));
        providers.insert(TranscriptionProvider::Gladia, ProviderConfig::new("gl"));

        let router = VoiceRouter::new(VoiceRouterConfig {
            providers,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            router.registered_providers(),
            vec![TranscriptionProvider::Gladia, TranscriptionProvider::Deepgram]
        );
        assert_eq!(router.default_provider(), Some(TranscriptionProvider::Gladia));
        assert!(router
            .provider_capabilities(TranscriptionProvider::Deepgram)
            .is_some_and(|caps| !caps.list_transcripts));
    }

    #[test]
    fn test_unknown_default_provider_is_rejected() {
        let err = VoiceRouter::with_adapters(
            vec![transcribing(TranscriptionProvider::Gladia)],
            Some(TranscriptionProvider::AssemblyAi),
            SelectionStrategy::Default,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("assemblyai"));
    }

    #[test]
    fn test_explicit_strategy_requires_provider() {
        let router = VoiceRouter::with_adapters(
            vec![transcribing(TranscriptionProvider::Gladia)],
            None,
            SelectionStrategy::Explicit,
        )
        .unwrap();

        assert!(router.select_provider(None).is_err());
        assert_eq!(
            router
                .select_provider(Some(TranscriptionProvider::Gladia))
                .unwrap(),
            TranscriptionProvider::Gladia
        );
        assert!(router
            .select_provider(Some(TranscriptionProvider::Deepgram))
            .is_err());
    }

    #[test]
    fn test_round_robin_rotates() {
        let router = VoiceRouter::with_adapters(
            vec![
                transcribing(TranscriptionProvider::Deepgram),
                transcribing(TranscriptionProvider::AssemblyAi),
            ],
            None,
            SelectionStrategy::RoundRobin,
        )
        .unwrap();

        let picks: Vec<_> = (0..3)
            .map(|_| router.select_provider(None).unwrap())
            .collect();
        assert_eq!(
            picks,
            vec![
                TranscriptionProvider::AssemblyAi,
                TranscriptionProvider::Deepgram,
                TranscriptionProvider::AssemblyAi,
            ]
        );
    }

    #[tokio::test]
    async fn test_transcribe_url_uses_default_provider() {
        let router = VoiceRouter::with_adapters(
            vec![
                transcribing(TranscriptionProvider::Gladia),
                transcribing(TranscriptionProvider::AssemblyAi),
            ],
            Some(TranscriptionProvider::AssemblyAi),
            SelectionStrategy::Default,
        )
        .unwrap();

        let response = router
            .transcribe_url("https://cdn.example.com/a.mp3", &TranscribeOptions::default())
            .await
            .unwrap();

        assert_eq!(response.provider, TranscriptionProvider::AssemblyAi);
    }

    #[tokio::test]
    async fn test_get_transcript_goes_to_named_provider() {
        let mut adapter = mock(TranscriptionProvider::Gladia);
        adapter
            .expect_get_transcript()
            .withf(|id: &str| id == "job-1")
            .times(1)
            .returning(|id| {
                UnifiedTranscriptResponse::success(
                    TranscriptionProvider::Gladia,
                    TranscriptData::pending(id, TranscriptionStatus::Processing),
                )
            });
        let router =
            VoiceRouter::with_adapters(vec![shared(adapter)], None, SelectionStrategy::Default)
                .unwrap();

        let response = router
            .get_transcript("job-1", TranscriptionProvider::Gladia)
            .await
            .unwrap();
        assert_eq!(response.data().unwrap().id, "job-1");

        assert!(router
            .get_transcript("job-1", TranscriptionProvider::Deepgram)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_stream_refused_when_provider_cannot_stream() {
        let mut adapter = mock(TranscriptionProvider::Deepgram);
        let mut capabilities = TranscriptionProvider::Deepgram.capabilities();
        capabilities.streaming = false;
        adapter.expect_capabilities().return_const(capabilities);
        adapter.expect_transcribe_stream().never();
        let router =
            VoiceRouter::with_adapters(vec![shared(adapter)], None, SelectionStrategy::Default)
                .unwrap();

        let err = router
            .transcribe_stream(None, StreamingOptions::default(), StreamingCallbacks::new())
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err,
            StreamingError::NotSupported(TranscriptionProvider::Deepgram)
        ));
    }

    #[tokio::test]
    async fn test_stream_selection_error_is_setup_error() {
        let router = VoiceRouter::with_adapters(
            vec![transcribing(TranscriptionProvider::Gladia)],
            None,
            SelectionStrategy::Explicit,
        )
        .unwrap();

        let err = router
            .transcribe_stream(None, StreamingOptions::default(), StreamingCallbacks::new())
            .await
            .err()
            .unwrap();

        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_register_adapter_replaces_existing() {
        let mut router = VoiceRouter::with_adapters(
            vec![transcribing(TranscriptionProvider::Gladia)],
            None,
            SelectionStrategy::Default,
        )
        .unwrap();
        router.register_adapter(transcribing(TranscriptionProvider::Deepgram));
        router.register_adapter(transcribing(TranscriptionProvider::Gladia));

        assert_eq!(router.registered_providers().len(), 2);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "round-robin".parse::<SelectionStrategy>().unwrap(),
            SelectionStrategy::RoundRobin
        );
        assert!("random".parse::<SelectionStrategy>().is_err());
    }
}
