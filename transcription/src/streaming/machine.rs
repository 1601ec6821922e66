//! Session state machine. Every transport event goes through [`SessionMachine::dispatch`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::*;
use tokio::sync::watch;

use crate::error::{ErrorCode, TranscriptionError};
use crate::streaming::protocol::{InboundEvent, StreamProtocol};
use crate::streaming::transport::TransportEvent;
use crate::types::{SessionStatus, StreamingCallbacks};

pub(crate) struct SessionMachine {
    session_id: String,
    protocol: Arc<dyn StreamProtocol>,
    callbacks: StreamingCallbacks,
    status: watch::Sender<SessionStatus>,
    close_notified: bool,
}

impl SessionMachine {
    pub(crate) fn new(
        session_id: String,
        protocol: Arc<dyn StreamProtocol>,
        callbacks: StreamingCallbacks,
        status: watch::Sender<SessionStatus>,
    ) -> Self {
        Self {
            session_id,
            protocol,
            callbacks,
            status,
            close_notified: false,
        }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub(crate) fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                if self.advance(SessionStatus::Open) {
                    info!("Streaming session {} open", self.session_id);
                    if let Some(on_open) = self.callbacks.on_open.as_mut() {
                        guarded(&self.session_id, "on_open", || on_open());
                    }
                }
            }
            TransportEvent::Message(text) => {
                if self.status() == SessionStatus::Closed {
                    trace!("Session {} dropping frame after close", self.session_id);
                    return;
                }
                self.handle_message(&text);
            }
            TransportEvent::Error(message) => {
                warn!("Session {} transport error: {}", self.session_id, message);
                self.emit_error(TranscriptionError::new(ErrorCode::WebsocketError, message));
            }
            TransportEvent::Close { code, reason } => self.finish(code, reason),
        }
    }

    /// Move to closing. Returns false when another close already started or finished.
    pub(crate) fn begin_closing(&mut self) -> bool {
        self.advance(SessionStatus::Closing)
    }

    /// Enter the terminal state, notifying `on_close` exactly once.
    pub(crate) fn finish(&mut self, code: Option<u16>, reason: Option<String>) {
        self.advance(SessionStatus::Closed);
        if self.close_notified {
            return;
        }
        self.close_notified = true;
        info!(
            "Streaming session {} closed (code {:?}, reason {:?})",
            self.session_id, code, reason
        );
        if let Some(on_close) = self.callbacks.on_close.as_mut() {
            guarded(&self.session_id, "on_close", || on_close(code, reason));
        }
    }

    fn handle_message(&mut self, text: &str) {
        let events = match self.protocol.decode(text) {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    "Session {} could not decode vendor frame: {}",
                    self.session_id, err
                );
                self.emit_error(
                    TranscriptionError::new(ErrorCode::ParseError, err.to_string())
                        .with_details(serde_json::Value::String(text.to_string())),
                );
                return;
            }
        };

        for event in events {
            match event {
                InboundEvent::SessionStarted(metadata)
                | InboundEvent::SessionTerminated(metadata) => {
                    if let Some(on_metadata) = self.callbacks.on_metadata.as_mut() {
                        guarded(&self.session_id, "on_metadata", || on_metadata(metadata));
                    }
                }
                InboundEvent::Transcript(transcript) => {
                    if let Some(on_transcript) = self.callbacks.on_transcript.as_mut() {
                        guarded(&self.session_id, "on_transcript", || {
                            on_transcript(transcript)
                        });
                    }
                }
                InboundEvent::VendorError(error) => {
                    warn!("Session {} vendor error: {}", self.session_id, error);
                    self.emit_error(error);
                }
                InboundEvent::Ignored => {}
            }
        }
    }

    fn emit_error(&mut self, error: TranscriptionError) {
        if let Some(on_error) = self.callbacks.on_error.as_mut() {
            guarded(&self.session_id, "on_error", || on_error(error));
        }
    }

    fn advance(&self, next: SessionStatus) -> bool {
        self.status.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        })
    }
}

fn guarded(session_id: &str, hook: &str, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!("Session {session_id} {hook} callback panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::transport::OutboundFrame;
    use crate::types::{SessionMetadata, StreamTranscript, TranscriptionProvider};
    use crate::Error;
    use std::sync::Mutex;

    /// Frames are `final:<text>`, `partial:<text>`, `begin`, `vendor-error` or `ping`.
    struct LineProtocol;

    impl StreamProtocol for LineProtocol {
        fn provider(&self) -> TranscriptionProvider {
            TranscriptionProvider::AssemblyAi
        }

        fn decode(&self, text: &str) -> Result<Vec<InboundEvent>, Error> {
            let transcript = |text: &str, is_final| {
                InboundEvent::Transcript(StreamTranscript {
                    text: text.to_string(),
                    is_final,
                    confidence: None,
                    words: vec![],
                    speaker: None,
                })
            };
            if let Some(rest) = text.strip_prefix("final:") {
                return Ok(vec![transcript(rest, true)]);
            }
            if let Some(rest) = text.strip_prefix("partial:") {
                return Ok(vec![transcript(rest, false)]);
            }
            match text {
                "begin" => Ok(vec![InboundEvent::SessionStarted(SessionMetadata {
                    session_id: Some("s-1".to_string()),
                    terminated: false,
                    data: serde_json::Value::Null,
                })]),
                "vendor-error" => Ok(vec![InboundEvent::VendorError(TranscriptionError::new(
                    ErrorCode::ProviderError,
                    "quota exceeded",
                ))]),
                "ping" => Ok(vec![InboundEvent::Ignored]),
                _ => Err(Error::Deserialization(format!("unexpected frame {text}"))),
            }
        }

        fn encode_audio(&self, audio: &[u8]) -> OutboundFrame {
            OutboundFrame::Binary(audio.to_vec())
        }

        fn end_of_stream(&self) -> Option<OutboundFrame> {
            None
        }

        fn terminate(&self) -> Option<OutboundFrame> {
            None
        }
    }

    #[derive(Default)]
    struct Seen {
        opens: usize,
        transcripts: Vec<(String, bool)>,
        metadata: usize,
        errors: Vec<ErrorCode>,
        closes: Vec<Option<u16>>,
    }

    fn machine() -> (SessionMachine, Arc<Mutex<Seen>>, watch::Receiver<SessionStatus>) {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let (s1, s2, s3, s4, s5) = (
            seen.clone(),
            seen.clone(),
            seen.clone(),
            seen.clone(),
            seen.clone(),
        );
        let callbacks = StreamingCallbacks::new()
            .on_open(move || s1.lock().unwrap().opens += 1)
            .on_transcript(move |t| s2.lock().unwrap().transcripts.push((t.text, t.is_final)))
            .on_metadata(move |_| s3.lock().unwrap().metadata += 1)
            .on_error(move |e| s4.lock().unwrap().errors.push(e.code))
            .on_close(move |code, _| s5.lock().unwrap().closes.push(code));
        let (tx, rx) = watch::channel(SessionStatus::Connecting);
        let machine = SessionMachine::new("test".to_string(), Arc::new(LineProtocol), callbacks, tx);
        (machine, seen, rx)
    }

    #[test]
    fn test_open_then_transcripts() {
        let (mut machine, seen, status) = machine();

        machine.dispatch(TransportEvent::Open);
        machine.dispatch(TransportEvent::Message("begin".to_string()));
        machine.dispatch(TransportEvent::Message("partial:hel".to_string()));
        machine.dispatch(TransportEvent::Message("final:hello".to_string()));
        machine.dispatch(TransportEvent::Message("ping".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(*status.borrow(), SessionStatus::Open);
        assert_eq!(seen.opens, 1);
        assert_eq!(seen.metadata, 1);
        assert_eq!(
            seen.transcripts,
            vec![("hel".to_string(), false), ("hello".to_string(), true)]
        );
    }

    #[test]
    fn test_malformed_frame_reports_parse_error_and_stays_open() {
        let (mut machine, seen, status) = machine();
        machine.dispatch(TransportEvent::Open);

        machine.dispatch(TransportEvent::Message("{not json".to_string()));
        machine.dispatch(TransportEvent::Message("final:still here".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.errors, vec![ErrorCode::ParseError]);
        assert_eq!(seen.transcripts.len(), 1);
        assert_eq!(*status.borrow(), SessionStatus::Open);
    }

    #[test]
    fn test_vendor_and_transport_errors_reach_on_error() {
        let (mut machine, seen, _status) = machine();
        machine.dispatch(TransportEvent::Open);

        machine.dispatch(TransportEvent::Message("vendor-error".to_string()));
        machine.dispatch(TransportEvent::Error("reset by peer".to_string()));

        assert_eq!(
            seen.lock().unwrap().errors,
            vec![ErrorCode::ProviderError, ErrorCode::WebsocketError]
        );
    }

    #[test]
    fn test_close_is_terminal_and_notified_once() {
        let (mut machine, seen, status) = machine();
        machine.dispatch(TransportEvent::Open);

        machine.dispatch(TransportEvent::Close {
            code: Some(1000),
            reason: None,
        });
        machine.dispatch(TransportEvent::Close {
            code: Some(1006),
            reason: None,
        });
        machine.dispatch(TransportEvent::Open);
        machine.dispatch(TransportEvent::Message("final:late".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(*status.borrow(), SessionStatus::Closed);
        assert_eq!(seen.closes, vec![Some(1000)]);
        assert_eq!(seen.opens, 1);
        assert!(seen.transcripts.is_empty());
    }

    #[test]
    fn test_begin_closing_only_once() {
        let (mut machine, _seen, _status) = machine();
        machine.dispatch(TransportEvent::Open);

        assert!(machine.begin_closing());
        assert!(!machine.begin_closing());
        machine.finish(None, None);
        assert!(!machine.begin_closing());
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let (tx, rx) = watch::channel(SessionStatus::Connecting);
        let callbacks = StreamingCallbacks::new().on_transcript(|_| panic!("caller bug"));
        let mut machine = SessionMachine::new("p".to_string(), Arc::new(LineProtocol), callbacks, tx);

        machine.dispatch(TransportEvent::Open);
        machine.dispatch(TransportEvent::Message("final:boom".to_string()));
        machine.dispatch(TransportEvent::Message("final:again".to_string()));

        assert_eq!(*rx.borrow(), SessionStatus::Open);
    }
}
