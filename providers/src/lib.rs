//! Vendor adapters for the `transcription` abstraction.
//!
//! Each vendor module implements [`TranscriptionAdapter`] over the vendor's REST
//! and WebSocket APIs:
//! - [`gladia`]: asynchronous jobs, live sessions negotiated over REST
//! - [`assembly_ai`]: asynchronous jobs, realtime sessions with a temporary token
//! - [`deepgram`]: synchronous batch, live sessions authenticated on the handshake
//!
//! [`VoiceRouter`] picks an adapter per call, and [`WebhookRouter`] normalizes
//! vendor callbacks.

pub mod assembly_ai;
pub mod config;
mod datetime;
pub mod deepgram;
pub mod gladia;
pub(crate) mod http;
pub mod language;
pub mod router;
pub mod schema;
pub mod webhooks;

use std::sync::Arc;

use transcription::types::TranscriptionProvider;
use transcription::{Error, TranscriptionAdapter};

pub use assembly_ai::AssemblyAiAdapter;
pub use config::ProviderConfig;
pub use deepgram::DeepgramAdapter;
pub use gladia::GladiaAdapter;
pub use router::{SelectionStrategy, VoiceRouter, VoiceRouterConfig};
pub use webhooks::{UnifiedWebhookEvent, WebhookError, WebhookEventType, WebhookRouter};

/// Build the adapter for `provider`.
pub fn adapter_for(
    provider: TranscriptionProvider,
    config: ProviderConfig,
) -> Result<Arc<dyn TranscriptionAdapter>, Error> {
    let adapter: Arc<dyn TranscriptionAdapter> = match provider {
        TranscriptionProvider::Gladia => Arc::new(GladiaAdapter::new(config)?),
        TranscriptionProvider::AssemblyAi => Arc::new(AssemblyAiAdapter::new(config)?),
        TranscriptionProvider::Deepgram => Arc::new(DeepgramAdapter::new(config)?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_for_each_provider() {
        for provider in TranscriptionProvider::ALL {
            let adapter = adapter_for(provider, ProviderConfig::new("key")).unwrap();
            assert_eq!(adapter.provider(), provider);
        }
    }

    #[test]
    fn test_adapter_for_rejects_bad_base_url() {
        let config = ProviderConfig::new("key").with_base_url("not a url");
        assert!(adapter_for(TranscriptionProvider::Gladia, config).is_err());
    }
}
