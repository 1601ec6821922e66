//! Seams between a streaming session and the socket that carries it.
//!
//! A [`Connector`] opens a connection and hands back a [`TransportSink`] for
//! writing plus a channel of [`TransportEvent`]s for reading. The production
//! implementation is [`WsConnector`](super::ws::WsConnector).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;

use crate::Error;

/// Where and how to connect a streaming session.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub url: String,
    /// Handshake headers, e.g. credentials for vendors that authenticate the upgrade request.
    pub headers: HeaderMap,
}

impl StreamTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Socket-level readiness, independent of the session's own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Events delivered by the transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Open,
    /// A text frame.
    Message(String),
    Error(String),
    Close {
        code: Option<u16>,
        reason: Option<String>,
    },
}

/// Frame written to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Write half of a connection.
#[async_trait]
pub trait TransportSink: Send {
    fn ready_state(&self) -> ReadyState;

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), Error>;

    /// Start the closing handshake and resolve once the peer acknowledged it.
    async fn close(&mut self) -> Result<(), Error>;

    /// Handle that drops the connection without a handshake.
    ///
    /// It works without access to the sink, so a write or close stuck on an
    /// unresponsive peer can be abandoned.
    fn terminate_handle(&self) -> TerminateHandle;
}

/// Drops a connection immediately. Cheap to clone; calling it twice is harmless.
#[derive(Clone)]
pub struct TerminateHandle(Arc<dyn Fn() + Send + Sync>);

impl TerminateHandle {
    pub fn new(terminate: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(terminate))
    }

    pub fn terminate(&self) {
        (self.0)()
    }
}

impl fmt::Debug for TerminateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TerminateHandle")
    }
}

/// An established connection.
pub struct Connection {
    pub sink: Box<dyn TransportSink>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Opens connections. Resolves once the connection is usable.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &StreamTarget) -> Result<Connection, Error>;
}
