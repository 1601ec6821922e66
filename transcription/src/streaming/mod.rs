//! Live transcription sessions over a vendor WebSocket.

mod machine;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod protocol;
mod session;
pub mod transport;
pub mod ws;

use std::fmt;
use std::time::Duration;

pub use protocol::{InboundEvent, StreamProtocol};
pub use session::StreamingSession;
pub use transport::{
    Connection, Connector, OutboundFrame, ReadyState, StreamTarget, TerminateHandle,
    TransportEvent, TransportSink,
};
pub use ws::WsConnector;

use crate::error::{ErrorCode, TranscriptionError};
use crate::types::{SessionStatus, TranscriptionProvider};
use crate::Error;

/// Time budgets for opening and closing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingTimeouts {
    pub connect: Duration,
    /// How long a graceful close may take before the socket is dropped.
    pub close: Duration,
}

impl Default for StreamingTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            close: Duration::from_secs(5),
        }
    }
}

/// Failures to open a session, and misuse of an open one.
#[derive(Debug)]
pub enum StreamingError {
    /// The provider has no realtime API.
    NotSupported(TranscriptionProvider),
    /// Negotiating the session with the vendor's REST API failed.
    Setup(TranscriptionError),
    ConnectionTimeout(Duration),
    Connect(Error),
    /// Audio was sent while the session was not open.
    NotOpen {
        session_id: String,
        status: SessionStatus,
    },
    /// The session is open but the socket is not writable.
    TransportNotReady {
        session_id: String,
        ready_state: ReadyState,
    },
    Transport(Error),
}

impl StreamingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StreamingError::NotSupported(_) => ErrorCode::NotSupported,
            StreamingError::Setup(err) => err.code,
            StreamingError::ConnectionTimeout(_) => ErrorCode::ConnectionTimeout,
            StreamingError::Connect(_)
            | StreamingError::NotOpen { .. }
            | StreamingError::TransportNotReady { .. }
            | StreamingError::Transport(_) => ErrorCode::WebsocketError,
        }
    }

    pub fn to_transcription_error(&self) -> TranscriptionError {
        TranscriptionError::new(self.code(), self.to_string())
    }
}

impl fmt::Display for StreamingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamingError::NotSupported(provider) => {
                write!(f, "{provider} does not support streaming")
            }
            StreamingError::Setup(err) => write!(f, "Failed to set up streaming session: {err}"),
            StreamingError::ConnectionTimeout(timeout) => {
                write!(f, "WebSocket connection timed out after {timeout:?}")
            }
            StreamingError::Connect(err) => write!(f, "WebSocket connection failed: {err}"),
            StreamingError::NotOpen { session_id, status } => write!(
                f,
                "Cannot send audio on session {session_id}: session is {status}"
            ),
            StreamingError::TransportNotReady {
                session_id,
                ready_state,
            } => write!(
                f,
                "Cannot send audio on session {session_id}: socket is {ready_state}"
            ),
            StreamingError::Transport(err) => write!(f, "WebSocket send failed: {err}"),
        }
    }
}

impl std::error::Error for StreamingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamingError::Setup(err) => Some(err),
            StreamingError::Connect(err) | StreamingError::Transport(err) => Some(err),
            _ => None,
        }
    }
}
