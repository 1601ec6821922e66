//! In-memory transport for exercising sessions without a network.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::streaming::transport::{
    Connection, Connector, OutboundFrame, ReadyState, StreamTarget, TerminateHandle,
    TransportEvent, TransportSink,
};
use crate::Error;

/// How [`MemoryConnector::connect`] behaves.
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Accept,
    Refuse(String),
    /// Never resolves.
    Hang,
}

/// How the sink's writes behave.
#[derive(Debug, Clone, Copy)]
pub enum SendBehavior {
    /// Frames are recorded immediately.
    Deliver,
    /// Writes never complete, as with a peer that stopped reading.
    Hang,
}

/// How the sink's graceful close behaves.
#[derive(Debug, Clone, Copy)]
pub enum CloseBehavior {
    /// The peer acknowledges immediately with code 1000.
    Graceful,
    /// The peer never acknowledges.
    Hang,
}

struct Shared {
    sent: Mutex<Vec<OutboundFrame>>,
    targets: Mutex<Vec<StreamTarget>>,
    ready: AtomicU8,
    terminated: AtomicBool,
    aborted: watch::Sender<bool>,
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            sent: Mutex::default(),
            targets: Mutex::default(),
            ready: AtomicU8::new(ReadyState::Connecting as u8),
            terminated: AtomicBool::new(false),
            aborted: watch::channel(false).0,
            events: Mutex::default(),
        }
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.ready.store(ReadyState::Closed as u8, Ordering::SeqCst);
        self.aborted.send_replace(true);
        guard(&self.events).take();
    }

    /// Resolves once the connection has been terminated.
    async fn until_terminated(&self) {
        let mut aborted = self.aborted.subscribe();
        let _ = aborted.wait_for(|aborted| *aborted).await;
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Connector whose connections record outbound frames and accept injected events.
pub struct MemoryConnector {
    shared: Arc<Shared>,
    connect: ConnectBehavior,
    send: SendBehavior,
    close: CloseBehavior,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            connect: ConnectBehavior::Accept,
            send: SendBehavior::Deliver,
            close: CloseBehavior::Graceful,
        }
    }

    pub fn with_send(mut self, behavior: SendBehavior) -> Self {
        self.send = behavior;
        self
    }

    pub fn with_connect(mut self, behavior: ConnectBehavior) -> Self {
        self.connect = behavior;
        self
    }

    pub fn with_close(mut self, behavior: CloseBehavior) -> Self {
        self.close = behavior;
        self
    }

    /// Handle onto the most recent connection.
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            shared: self.shared.clone(),
        }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, target: &StreamTarget) -> Result<Connection, Error> {
        guard(&self.shared.targets).push(target.clone());
        match &self.connect {
            ConnectBehavior::Accept => {}
            ConnectBehavior::Refuse(reason) => return Err(Error::WebSocket(reason.clone())),
            ConnectBehavior::Hang => futures::future::pending::<()>().await,
        }

        let (tx, rx) = mpsc::channel(32);
        *guard(&self.shared.events) = Some(tx);
        self.shared.terminated.store(false, Ordering::SeqCst);
        self.shared.aborted.send_replace(false);
        self.shared
            .ready
            .store(ReadyState::Open as u8, Ordering::SeqCst);

        Ok(Connection {
            sink: Box::new(MemorySink {
                shared: self.shared.clone(),
                send: self.send,
                close: self.close,
            }),
            events: rx,
        })
    }
}

struct MemorySink {
    shared: Arc<Shared>,
    send: SendBehavior,
    close: CloseBehavior,
}

#[async_trait]
impl TransportSink for MemorySink {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.shared.ready.load(Ordering::SeqCst))
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), Error> {
        if self.ready_state() != ReadyState::Open {
            return Err(Error::WebSocket("socket is not open".to_string()));
        }
        if let SendBehavior::Hang = self.send {
            self.shared.until_terminated().await;
            return Err(Error::WebSocket("connection terminated".to_string()));
        }
        guard(&self.shared.sent).push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.shared
            .ready
            .store(ReadyState::Closing as u8, Ordering::SeqCst);
        if let CloseBehavior::Hang = self.close {
            self.shared.until_terminated().await;
            return Err(Error::WebSocket("connection terminated".to_string()));
        }

        self.shared
            .ready
            .store(ReadyState::Closed as u8, Ordering::SeqCst);
        let sender = guard(&self.shared.events).take();
        if let Some(sender) = sender {
            let _ = sender
                .send(TransportEvent::Close {
                    code: Some(1000),
                    reason: None,
                })
                .await;
        }
        Ok(())
    }

    fn terminate_handle(&self) -> TerminateHandle {
        let shared = self.shared.clone();
        TerminateHandle::new(move || shared.terminate())
    }
}

/// Inspection and injection handle for a [`MemoryConnector`].
#[derive(Clone)]
pub struct MemoryHandle {
    shared: Arc<Shared>,
}

impl MemoryHandle {
    pub fn sent_frames(&self) -> Vec<OutboundFrame> {
        guard(&self.shared.sent).clone()
    }

    /// Targets passed to `connect`, oldest first.
    pub fn targets(&self) -> Vec<StreamTarget> {
        guard(&self.shared.targets).clone()
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.shared.ready.store(state as u8, Ordering::SeqCst);
    }

    pub fn was_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::SeqCst)
    }

    /// Deliver an event as if it came from the peer.
    pub async fn push(&self, event: TransportEvent) {
        let sender = guard(&self.shared.events).clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}
