//! The script-visible send path: a mutex-protected transport plus a
//! closed-flag, installed into `RequestState` once an upgrade response is
//! produced.

use super::message::{Message, WsTransport};
use crate::constants::WS_SEND_TIMEOUT;
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The handle a script's `send()`/`close()` calls go through. Cloning shares
/// the same underlying transport and closed-flag.
#[derive(Clone)]
pub struct WebSocketHandle {
    transport: Arc<Mutex<Box<dyn WsTransport>>>,
    closed: Arc<AtomicBool>,
}

impl WebSocketHandle {
    /// Wraps `transport` as a fresh, open handle.
    #[must_use]
    pub fn new(transport: Box<dyn WsTransport>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sends `message`, under the send mutex with [`WS_SEND_TIMEOUT`]. A
    /// send after close is silently dropped rather than erroring, matching
    /// the web platform's tolerant `send()` semantics for a closing socket.
    ///
    /// # Errors
    /// Returns a runtime error if the transport itself fails or times out.
    pub fn send(&self, message: &Message) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        self.transport.lock().send(message, WS_SEND_TIMEOUT)
    }

    /// Marks the handle closed and forwards a close frame. Idempotent.
    ///
    /// # Errors
    /// Returns a runtime error if the transport's close itself fails; still
    /// marks the handle closed regardless.
    pub fn close(&self, code: u16, reason: &str) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.transport.lock().close(code, reason)
    }

    /// Whether [`close`] has already been called on this handle.
    ///
    /// [`close`]: WebSocketHandle::close
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.transport.lock().is_closed()
    }

    /// Receives the next message, blocking at most `timeout`. Used by
    /// [`super::WebSocketBridge::run`], which drives this handle's
    /// transport from the same thread that owns the script engine.
    ///
    /// # Errors
    /// Returns a runtime error on a transport failure.
    pub fn recv(&self, timeout: std::time::Duration) -> Result<Option<Message>> {
        self.transport.lock().recv(timeout)
    }

    /// Sends a ping, blocking at most `timeout` for the pong.
    ///
    /// # Errors
    /// Returns a runtime error if no pong arrives in time or the transport
    /// fails.
    pub fn ping(&self, timeout: std::time::Duration) -> Result<()> {
        self.transport.lock().ping(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<Message>,
        closed: bool,
    }

    impl WsTransport for RecordingTransport {
        fn send(&mut self, message: &Message, _timeout: Duration) -> Result<()> {
            self.sent.push(message.clone());
            Ok(())
        }
        fn ping(&mut self, _timeout: Duration) -> Result<()> {
            Ok(())
        }
        fn recv(&mut self, _timeout: Duration) -> Result<Option<Message>> {
            Ok(None)
        }
        fn is_closed(&self) -> bool {
            self.closed
        }
        fn close(&mut self, _code: u16, _reason: &str) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn send_after_close_is_silently_dropped() {
        let handle = WebSocketHandle::new(Box::new(RecordingTransport::default()));
        handle.close(1000, "").unwrap();
        assert!(handle.send(&Message::Text("late".into())).is_ok());
    }

    #[test]
    fn close_is_idempotent() {
        let handle = WebSocketHandle::new(Box::new(RecordingTransport::default()));
        handle.close(1000, "bye").unwrap();
        handle.close(1000, "bye again").unwrap();
        assert!(handle.is_closed());
    }
}
