//! Provider-agnostic speech-to-text abstraction.
//!
//! This crate holds everything that is independent of a particular vendor:
//! - The unified transcript model every adapter normalizes into
//! - The static capability registry
//! - The [`TranscriptionAdapter`](traits::TranscriptionAdapter) trait
//! - Completion polling for asynchronous jobs
//! - Streaming sessions with their state machine and WebSocket transport
//! - The [`api_wrapper`](api::api_wrapper) that turns vendor calls into [`ApiResponse`]s
//!
//! Vendor adapters live in the `providers` crate.

pub mod api;
pub mod error;
pub mod polling;
pub mod streaming;
pub mod traits;
pub mod types;

pub use api::{api_wrapper, ApiResponse, RequestOptions, Schema, ValidationIssue};
pub use error::{Error, ErrorCode, TranscriptionError};
pub use polling::{poll_for_completion, PollingConfig};
pub use streaming::{StreamingError, StreamingSession, StreamingTimeouts};
pub use traits::TranscriptionAdapter;
