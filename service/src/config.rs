use clap::builder::TypedValueParser as _;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::LevelFilter;
use providers::{ProviderConfig, SelectionStrategy, VoiceRouterConfig};
use std::time::Duration;
use transcription::types::{TranscribeOptions, TranscriptionProvider};
use transcription::{PollingConfig, StreamingTimeouts};

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Gladia API key. Gladia is registered only when this is set.
    #[arg(long, env, hide_env_values = true)]
    gladia_api_key: Option<String>,

    /// AssemblyAI API key. AssemblyAI is registered only when this is set.
    #[arg(long, env, hide_env_values = true)]
    assemblyai_api_key: Option<String>,

    /// Deepgram API key. Deepgram is registered only when this is set.
    #[arg(long, env, hide_env_values = true)]
    deepgram_api_key: Option<String>,

    /// Overrides the Gladia REST base URL
    #[arg(long, env)]
    gladia_base_url: Option<String>,

    /// Overrides the AssemblyAI REST base URL
    #[arg(long, env)]
    assemblyai_base_url: Option<String>,

    /// Overrides the Deepgram REST base URL
    #[arg(long, env)]
    deepgram_base_url: Option<String>,

    /// Provider used when a command does not name one
    #[arg(long, env)]
    pub default_provider: Option<TranscriptionProvider>,

    /// How a provider is picked when a command does not name one
    #[arg(
        long,
        env,
        default_value_t = SelectionStrategy::Default,
        value_parser = clap::builder::PossibleValuesParser::new(["explicit", "default", "round-robin"])
            .try_map(|s| s.parse::<SelectionStrategy>()),
    )]
    pub selection_strategy: SelectionStrategy,

    /// Number of status checks before a job is reported as timed out
    #[arg(long, env, default_value_t = 60)]
    pub polling_max_attempts: u32,

    /// Delay between two status checks, in milliseconds
    #[arg(long, env, default_value_t = 3000)]
    pub polling_interval_ms: u64,

    /// Timeout of a single REST request, in seconds
    #[arg(long, env, default_value_t = 60)]
    pub http_timeout_secs: u64,

    /// Retries for transient transport failures of REST requests
    #[arg(long, env, default_value_t = 0)]
    pub http_max_retries: u32,

    /// How long a WebSocket handshake may take, in seconds
    #[arg(long, env, default_value_t = 10)]
    pub ws_connect_timeout_secs: u64,

    /// How long a graceful WebSocket close may take, in seconds
    #[arg(long, env, default_value_t = 5)]
    pub ws_close_timeout_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .try_map(|s| s.parse::<LevelFilter>()),
        )]
    pub log_level_filter: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Transcribe a hosted audio file and print the unified response
    Transcribe(TranscribeArgs),
    /// Fetch a transcript by id
    Get {
        provider: TranscriptionProvider,
        id: String,
    },
    /// Delete a transcript by id
    Delete {
        provider: TranscriptionProvider,
        id: String,
    },
    /// List recent transcripts
    List {
        provider: TranscriptionProvider,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print what each registered provider supports
    Capabilities,
}

#[derive(Clone, Debug, Args)]
pub struct TranscribeArgs {
    /// Publicly reachable URL of the audio file
    pub url: String,

    /// Provider to use instead of the configured selection strategy
    #[arg(short, long)]
    pub provider: Option<TranscriptionProvider>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub language_detection: bool,

    #[arg(long)]
    pub diarization: bool,

    #[arg(long)]
    pub speakers_expected: Option<u32>,

    /// Comma separated words and phrases to boost
    #[arg(long, value_delimiter = ',')]
    pub custom_vocabulary: Vec<String>,

    #[arg(long)]
    pub summarization: bool,

    #[arg(long)]
    pub sentiment_analysis: bool,

    #[arg(long)]
    pub entity_detection: bool,

    #[arg(long)]
    pub pii_redaction: bool,

    /// Submit the job and return immediately; the provider calls this URL when done
    #[arg(long)]
    pub webhook_url: Option<String>,
}

impl TranscribeArgs {
    pub fn options(&self) -> TranscribeOptions {
        TranscribeOptions {
            language: self.language.clone(),
            language_detection: self.language_detection,
            diarization: self.diarization,
            speakers_expected: self.speakers_expected,
            custom_vocabulary: self.custom_vocabulary.clone(),
            summarization: self.summarization,
            sentiment_analysis: self.sentiment_analysis,
            entity_detection: self.entity_detection,
            pii_redaction: self.pii_redaction,
            webhook_url: self.webhook_url.clone(),
            word_timestamps: true,
            ..TranscribeOptions::default()
        }
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn api_key(&self, provider: TranscriptionProvider) -> Option<&str> {
        let key = match provider {
            TranscriptionProvider::Gladia => self.gladia_api_key.as_deref(),
            TranscriptionProvider::AssemblyAi => self.assemblyai_api_key.as_deref(),
            TranscriptionProvider::Deepgram => self.deepgram_api_key.as_deref(),
        };
        key.filter(|key| !key.trim().is_empty())
    }

    pub fn base_url(&self, provider: TranscriptionProvider) -> Option<&str> {
        match provider {
            TranscriptionProvider::Gladia => self.gladia_base_url.as_deref(),
            TranscriptionProvider::AssemblyAi => self.assemblyai_base_url.as_deref(),
            TranscriptionProvider::Deepgram => self.deepgram_base_url.as_deref(),
        }
    }

    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            max_attempts: self.polling_max_attempts,
            interval: Duration::from_millis(self.polling_interval_ms),
        }
    }

    pub fn streaming_timeouts(&self) -> StreamingTimeouts {
        StreamingTimeouts {
            connect: Duration::from_secs(self.ws_connect_timeout_secs),
            close: Duration::from_secs(self.ws_close_timeout_secs),
        }
    }

    /// Adapter settings for `provider`, or `None` when it has no API key.
    pub fn provider_config(&self, provider: TranscriptionProvider) -> Option<ProviderConfig> {
        let api_key = self.api_key(provider)?;
        let mut config = ProviderConfig::new(api_key)
            .with_timeout(Duration::from_secs(self.http_timeout_secs))
            .with_max_retries(self.http_max_retries)
            .with_polling(self.polling())
            .with_streaming_timeouts(self.streaming_timeouts());
        if let Some(base_url) = self.base_url(provider) {
            config = config.with_base_url(base_url);
        }
        Some(config)
    }

    /// Router settings covering every provider with an API key.
    pub fn voice_router_config(&self) -> VoiceRouterConfig {
        let providers = TranscriptionProvider::ALL
            .into_iter()
            .filter_map(|provider| {
                self.provider_config(provider)
                    .map(|config| (provider, config))
            })
            .collect();

        VoiceRouterConfig {
            providers,
            default_provider: self.default_provider,
            selection_strategy: self.selection_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("voice_router").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["capabilities"]);

        assert_eq!(config.selection_strategy, SelectionStrategy::Default);
        assert_eq!(config.polling(), PollingConfig::default());
        assert_eq!(config.streaming_timeouts().connect, Duration::from_secs(10));
        assert_eq!(config.streaming_timeouts().close, Duration::from_secs(5));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert!(matches!(config.command, Command::Capabilities));
    }

    #[test]
    fn test_router_config_only_includes_keyed_providers() {
        let config = parse(&[
            "--gladia-api-key",
            "gl-key",
            "--deepgram-api-key",
            " ",
            "--gladia-base-url",
            "http://localhost:1234",
            "--polling-max-attempts",
            "5",
            "--default-provider",
            "gladia",
            "capabilities",
        ]);

        let router_config = config.voice_router_config();

        assert_eq!(
            router_config.providers.keys().copied().collect::<Vec<_>>(),
            vec![TranscriptionProvider::Gladia]
        );
        let gladia = &router_config.providers[&TranscriptionProvider::Gladia];
        assert_eq!(gladia.api_key.expose_secret(), "gl-key");
        assert_eq!(gladia.base_url.as_deref(), Some("http://localhost:1234"));
        assert_eq!(gladia.polling.max_attempts, 5);
        assert_eq!(
            router_config.default_provider,
            Some(TranscriptionProvider::Gladia)
        );
    }

    #[test]
    fn test_selection_strategy_values() {
        let config = parse(&["--selection-strategy", "round-robin", "capabilities"]);
        assert_eq!(config.selection_strategy, SelectionStrategy::RoundRobin);

        assert!(Config::try_parse_from([
            "voice_router",
            "--selection-strategy",
            "random",
            "capabilities"
        ])
        .is_err());
    }

    #[test]
    fn test_transcribe_args_become_options() {
        let config = parse(&[
            "transcribe",
            "https://example.com/call.mp3",
            "--provider",
            "assemblyai",
            "--language",
            "fr",
            "--diarization",
            "--custom-vocabulary",
            "Gladia,Deepgram",
            "--webhook-url",
            "https://example.com/hook",
        ]);

        let Command::Transcribe(args) = config.command else {
            panic!("expected transcribe command");
        };
        assert_eq!(args.provider, Some(TranscriptionProvider::AssemblyAi));

        let options = args.options();
        assert_eq!(options.language.as_deref(), Some("fr"));
        assert!(options.diarization);
        assert!(!options.summarization);
        assert_eq!(options.custom_vocabulary, vec!["Gladia", "Deepgram"]);
        assert_eq!(options.webhook_url.as_deref(), Some("https://example.com/hook"));
    }

    #[test]
    fn test_get_command() {
        let config = parse(&["get", "deepgram", "req-1"]);
        assert!(matches!(
            config.command,
            Command::Get { provider: TranscriptionProvider::Deepgram, ref id } if id == "req-1"
        ));
    }
}
