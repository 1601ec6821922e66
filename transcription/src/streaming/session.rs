//! Caller handle of a live transcription session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::*;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::streaming::machine::SessionMachine;
use crate::streaming::protocol::StreamProtocol;
use crate::streaming::transport::{
    Connector, OutboundFrame, ReadyState, StreamTarget, TerminateHandle, TransportEvent,
    TransportSink,
};
use crate::streaming::{StreamingError, StreamingTimeouts};
use crate::types::{AudioChunk, SessionStatus, StreamingCallbacks, TranscriptionProvider};

/// An open (or closed) streaming session.
///
/// Created by an adapter's `transcribe_stream`. Audio goes in through
/// [`send_audio`](Self::send_audio); results come back through the callbacks.
/// Dropping the session without calling [`close`](Self::close) tears the
/// connection down without the vendor termination handshake.
pub struct StreamingSession {
    id: String,
    provider: TranscriptionProvider,
    created_at: DateTime<Utc>,
    protocol: Arc<dyn StreamProtocol>,
    machine: Arc<Mutex<SessionMachine>>,
    status: watch::Receiver<SessionStatus>,
    sink: tokio::sync::Mutex<Box<dyn TransportSink>>,
    terminator: TerminateHandle,
    /// Set once the vendor end-of-stream message went out.
    stream_ended: AtomicBool,
    close_timeout: Duration,
    reader: JoinHandle<()>,
}

impl StreamingSession {
    /// Connect to `target` and start dispatching its events.
    ///
    /// The connect attempt is bounded by `timeouts.connect`; on timeout the
    /// pending connection is dropped and no session is created.
    pub async fn open(
        connector: &dyn Connector,
        target: StreamTarget,
        protocol: Arc<dyn StreamProtocol>,
        callbacks: StreamingCallbacks,
        timeouts: StreamingTimeouts,
    ) -> Result<Self, StreamingError> {
        let provider = protocol.provider();
        let id = format!("{}_{}", provider.as_str(), Uuid::new_v4().simple());
        debug!("Connecting streaming session {id}");

        let connection =
            match tokio::time::timeout(timeouts.connect, connector.connect(&target)).await {
                Ok(Ok(connection)) => connection,
                Ok(Err(err)) => {
                    warn!("Streaming session {id} failed to connect: {err}");
                    return Err(StreamingError::Connect(err));
                }
                Err(_) => {
                    warn!(
                        "Streaming session {id} did not connect within {:?}",
                        timeouts.connect
                    );
                    return Err(StreamingError::ConnectionTimeout(timeouts.connect));
                }
            };

        let (status_tx, status_rx) = watch::channel(SessionStatus::Connecting);
        let mut machine = SessionMachine::new(id.clone(), protocol.clone(), callbacks, status_tx);
        machine.dispatch(TransportEvent::Open);
        let machine = Arc::new(Mutex::new(machine));

        let reader = tokio::spawn(pump(connection.events, machine.clone()));
        let terminator = connection.sink.terminate_handle();

        Ok(Self {
            id,
            provider,
            created_at: Utc::now(),
            protocol,
            machine,
            status: status_rx,
            sink: tokio::sync::Mutex::new(connection.sink),
            terminator,
            stream_ended: AtomicBool::new(false),
            close_timeout: timeouts.close,
            reader,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider(&self) -> TranscriptionProvider {
        self.provider
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Send one chunk of audio, followed by the vendor end-of-stream message when `chunk.is_last`.
    ///
    /// Fails without touching the socket unless the session is open and the
    /// transport is ready.
    pub async fn send_audio(&self, chunk: AudioChunk) -> Result<(), StreamingError> {
        self.ensure_open()?;
        let mut sink = self.sink.lock().await;
        self.ensure_open()?;

        let ready_state = sink.ready_state();
        if ready_state != ReadyState::Open {
            return Err(StreamingError::TransportNotReady {
                session_id: self.id.clone(),
                ready_state,
            });
        }

        sink.send(self.protocol.encode_audio(&chunk.data))
            .await
            .map_err(StreamingError::Transport)?;
        trace!("Session {} sent {} bytes", self.id, chunk.data.len());

        if chunk.is_last {
            if let Some(frame) = self.protocol.end_of_stream() {
                debug!("Session {} signalling end of stream", self.id);
                sink.send(frame).await.map_err(StreamingError::Transport)?;
                self.stream_ended.store(true, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    /// Close the session, ending in [`SessionStatus::Closed`].
    ///
    /// Sends the vendor termination message if the socket is still open, then
    /// waits for a graceful close. The whole handshake, including waiting for a
    /// writer that holds the socket, is bounded by the close timeout; past it
    /// the connection is dropped. Concurrent or repeated calls wait for the
    /// first one to finish. Cancelling a call still leaves the session closed.
    pub async fn close(&self) {
        let initiated = lock(&self.machine).begin_closing();
        if !initiated {
            let mut status = self.status.clone();
            let _ = status
                .wait_for(|status| *status == SessionStatus::Closed)
                .await;
            return;
        }

        info!("Closing streaming session {}", self.id);
        let mut closing = Closing {
            session: self,
            graceful: false,
        };
        match tokio::time::timeout(self.close_timeout, self.close_handshake()).await {
            Ok(Ok(())) => {
                debug!("Session {} closed gracefully", self.id);
                closing.graceful = true;
            }
            Ok(Err(err)) => warn!("Session {} close handshake failed: {}", self.id, err),
            Err(_) => warn!(
                "Session {} did not close within {:?}, terminating",
                self.id, self.close_timeout
            ),
        }
    }

    async fn close_handshake(&self) -> Result<(), crate::Error> {
        let mut sink = self.sink.lock().await;
        if sink.ready_state() == ReadyState::Open {
            if let Some(frame) = self.termination_frame() {
                if let Err(err) = sink.send(frame).await {
                    warn!("Session {} could not send termination: {}", self.id, err);
                }
            }
        }
        sink.close().await
    }

    /// The vendor termination message, unless it is the end-of-stream message already sent.
    fn termination_frame(&self) -> Option<OutboundFrame> {
        let frame = self.protocol.terminate()?;
        let already_sent = self.stream_ended.load(Ordering::SeqCst)
            && self.protocol.end_of_stream().as_ref() == Some(&frame);
        if already_sent {
            debug!("Session {} already ended its stream", self.id);
            return None;
        }
        Some(frame)
    }

    fn ensure_open(&self) -> Result<(), StreamingError> {
        match self.status() {
            SessionStatus::Open => Ok(()),
            status => Err(StreamingError::NotOpen {
                session_id: self.id.clone(),
                status,
            }),
        }
    }
}

/// Finishes a close started by [`StreamingSession::close`], also when that call is cancelled.
struct Closing<'a> {
    session: &'a StreamingSession,
    graceful: bool,
}

impl Drop for Closing<'_> {
    fn drop(&mut self) {
        if !self.graceful {
            self.session.terminator.terminate();
        }
        lock(&self.session.machine).finish(Some(1000), Some("client closed".to_string()));
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        if self.sink.get_mut().ready_state() != ReadyState::Closed {
            debug!("Session {} dropped while connected", self.id);
            self.terminator.terminate();
        }
        self.reader.abort();
    }
}

impl std::fmt::Debug for StreamingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingSession")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("created_at", &self.created_at)
            .field("status", &self.status())
            .finish()
    }
}

async fn pump(mut events: mpsc::Receiver<TransportEvent>, machine: Arc<Mutex<SessionMachine>>) {
    while let Some(event) = events.recv().await {
        let closed = matches!(event, TransportEvent::Close { .. });
        lock(&machine).dispatch(event);
        if closed {
            return;
        }
    }
    lock(&machine).dispatch(TransportEvent::Close {
        code: None,
        reason: None,
    });
}

fn lock(machine: &Mutex<SessionMachine>) -> MutexGuard<'_, SessionMachine> {
    machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
