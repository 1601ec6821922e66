//! # provider-auth
//!
//! Authentication plumbing shared by every speech-to-text vendor adapter:
//! - API key authentication with each vendor's header convention
//! - HTTP client building with retry middleware
//! - Default endpoints for the supported vendors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use provider_auth::{
//!     api_key::{ApiKeyAuth, ApiKeyProvider, ProviderAuth},
//!     http::ProviderClientBuilder,
//! };
//!
//! let auth = ApiKeyAuth::for_provider(ApiKeyProvider::Deepgram, SecretString::new(key));
//! let client = ProviderClientBuilder::new().with_max_retries(2).build()?;
//! ```

pub mod api_key;
pub mod error;
pub mod http;
pub mod providers;

pub use error::{Error, ErrorKind};
