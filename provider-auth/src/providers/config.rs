//! Pre-configured vendor endpoints.

use crate::api_key::ApiKeyProvider;

/// Vendor endpoints for batch and streaming transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    /// Provider identifier.
    pub provider: ApiKeyProvider,
    /// Base REST API URL.
    pub base_url: String,
    /// Base WebSocket URL, when the vendor streams over a fixed host.
    pub streaming_url: Option<String>,
}

/// Gladia endpoints. Live sessions are negotiated over REST, which returns the socket URL.
pub fn gladia_endpoints() -> Endpoints {
    Endpoints {
        provider: ApiKeyProvider::Gladia,
        base_url: "https://api.gladia.io".to_string(),
        streaming_url: None,
    }
}

/// AssemblyAI endpoints.
pub fn assemblyai_endpoints() -> Endpoints {
    Endpoints {
        provider: ApiKeyProvider::AssemblyAi,
        base_url: "https://api.assemblyai.com".to_string(),
        streaming_url: Some("wss://api.assemblyai.com/v2/realtime/ws".to_string()),
    }
}

/// Deepgram endpoints.
pub fn deepgram_endpoints() -> Endpoints {
    Endpoints {
        provider: ApiKeyProvider::Deepgram,
        base_url: "https://api.deepgram.com".to_string(),
        streaming_url: Some("wss://api.deepgram.com/v1/listen".to_string()),
    }
}

pub fn endpoints_for(provider: ApiKeyProvider) -> Endpoints {
    match provider {
        ApiKeyProvider::Gladia => gladia_endpoints(),
        ApiKeyProvider::AssemblyAi => assemblyai_endpoints(),
        ApiKeyProvider::Deepgram => deepgram_endpoints(),
    }
}
