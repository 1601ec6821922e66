use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// HTTP and WebSocket stacks that log every request and frame. Silenced unless tracing.
const FILTERED_MODULES: &[&str] = &[
    "reqwest",
    "hyper",
    "h2",
    "rustls",
    "tungstenite",
    "tokio_tungstenite",
];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at the configured level.
    ///
    /// Below `TRACE` the transport crates listed in [`FILTERED_MODULES`] are muted,
    /// so console output only carries adapter and session lifecycle messages.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;
        let log_config = Self::build_log_config(Self::mutes_transport_logs(level));

        simplelog::TermLogger::init(
            level,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .unwrap_or_else(|err| eprintln!("Failed to start simplelog: {err}"));
    }

    fn mutes_transport_logs(level: LevelFilter) -> bool {
        level < LevelFilter::Trace
    }

    fn build_log_config(mute_transport: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if mute_transport {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_modules_cover_transport_crates() {
        for module in ["reqwest", "hyper", "h2", "rustls", "tungstenite"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
    }

    #[test]
    fn test_workspace_crates_are_never_filtered() {
        for module in ["transcription", "providers", "voice_router"] {
            assert!(!FILTERED_MODULES.contains(&module));
        }
    }

    #[test]
    fn test_only_trace_shows_transport_logs() {
        assert!(!Logger::mutes_transport_logs(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::mutes_transport_logs(level), "{level} should mute");
        }
    }

    #[test]
    fn test_build_log_config_both_ways() {
        let _muted = Logger::build_log_config(true);
        let _verbose = Logger::build_log_config(false);
    }
}
