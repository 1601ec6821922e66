//! API key authentication for speech-to-text vendors.
//!
//! Every supported vendor authenticates with a static key carried in a request
//! header; only the header name and value prefix differ.

mod auth;

pub use auth::{ApiKeyAuth, ApiKeyProvider, AuthMethod, ProviderAuth};
