//! WebSocket transport backed by tokio-tungstenite.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::*;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::streaming::transport::{
    Connection, Connector, OutboundFrame, ReadyState, StreamTarget, TerminateHandle,
    TransportEvent, TransportSink,
};
use crate::Error;

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

const EVENT_BUFFER: usize = 64;

/// Connects to vendor WebSocket endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, target: &StreamTarget) -> Result<Connection, Error> {
        let mut request = target
            .url
            .as_str()
            .into_client_request()
            .map_err(|err| Error::Configuration(format!("invalid streaming URL: {err}")))?;
        for (name, value) in target.headers.iter() {
            request.headers_mut().insert(name.clone(), value.clone());
        }

        let (stream, response) = connect_async(request).await.map_err(|err| {
            warn!("WebSocket handshake failed: {err}");
            Error::from(err)
        })?;
        debug!("WebSocket handshake completed ({})", response.status());

        let (write, read) = stream.split();
        let ready = Arc::new(AtomicU8::new(ReadyState::Open as u8));
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (closed_tx, closed_rx) = watch::channel(false);
        let (aborted_tx, aborted_rx) = watch::channel(false);

        let reader = tokio::spawn(read_frames(read, events_tx, ready.clone(), closed_tx));

        Ok(Connection {
            sink: Box::new(WsSink {
                write,
                ready,
                closed: closed_rx,
                aborted: aborted_rx,
                abort: Arc::new(aborted_tx),
                reader: reader.abort_handle(),
            }),
            events: events_rx,
        })
    }
}

async fn read_frames(
    mut read: futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    events: mpsc::Sender<TransportEvent>,
    ready: Arc<AtomicU8>,
    closed: watch::Sender<bool>,
) {
    let mut code = None;
    let mut reason = None;

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if events
                    .send(TransportEvent::Message(text.as_str().to_owned()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                ready.store(ReadyState::Closing as u8, Ordering::SeqCst);
                if let Some(frame) = frame {
                    code = Some(u16::from(frame.code));
                    reason = Some(frame.reason.as_str().to_owned()).filter(|r| !r.is_empty());
                }
            }
            Ok(Message::Binary(bytes)) => trace!("Ignoring {} byte binary frame", bytes.len()),
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                break
            }
            Err(err) => {
                warn!("WebSocket read failed: {err}");
                let _ = events.send(TransportEvent::Error(err.to_string())).await;
                break;
            }
        }
    }

    ready.store(ReadyState::Closed as u8, Ordering::SeqCst);
    let _ = closed.send(true);
    let _ = events.send(TransportEvent::Close { code, reason }).await;
}

struct WsSink {
    write: WsWrite,
    ready: Arc<AtomicU8>,
    closed: watch::Receiver<bool>,
    /// Flipped by the terminate handle; pending writes and closes give up on it.
    aborted: watch::Receiver<bool>,
    abort: Arc<watch::Sender<bool>>,
    reader: AbortHandle,
}

impl WsSink {
    fn terminated() -> Error {
        Error::WebSocket("connection terminated".to_string())
    }
}

#[async_trait]
impl TransportSink for WsSink {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready.load(Ordering::SeqCst))
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), Error> {
        let message = match frame {
            OutboundFrame::Text(text) => Message::Text(text.into()),
            OutboundFrame::Binary(bytes) => Message::Binary(bytes.into()),
        };
        let mut aborted = self.aborted.clone();
        tokio::select! {
            sent = self.write.send(message) => sent.map_err(Error::from),
            _ = aborted.wait_for(|aborted| *aborted) => Err(Self::terminated()),
        }
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.ready
            .store(ReadyState::Closing as u8, Ordering::SeqCst);
        let mut aborted = self.aborted.clone();
        let handshake = async {
            SinkExt::close(&mut self.write).await?;
            let _ = self.closed.wait_for(|closed| *closed).await;
            Ok::<(), Error>(())
        };
        tokio::select! {
            closed = handshake => closed,
            _ = aborted.wait_for(|aborted| *aborted) => Err(Self::terminated()),
        }
    }

    fn terminate_handle(&self) -> TerminateHandle {
        let abort = self.abort.clone();
        let reader = self.reader.clone();
        let ready = self.ready.clone();
        TerminateHandle::new(move || {
            reader.abort();
            ready.store(ReadyState::Closed as u8, Ordering::SeqCst);
            abort.send_replace(true);
        })
    }
}
