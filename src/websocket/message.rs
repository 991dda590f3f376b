//! The message type and transport seam the bridge pumps frames through.

use crate::error::Result;
use std::time::Duration;

/// One WebSocket frame, already decoded from the wire. Control frames (ping,
/// pong, close) are handled by [`WsTransport`] itself and never surface
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A UTF-8 text frame.
    Text(String),
    /// A binary frame.
    Binary(Vec<u8>),
}

/// The underlying wire connection. The actual WebSocket framing/handshake
/// library is an external collaborator; the bridge only needs this much of
/// it to stay format-agnostic.
pub trait WsTransport: Send {
    /// Sends one message, blocking at most `timeout`.
    ///
    /// # Errors
    /// Returns a runtime error on a transport failure or send timeout.
    fn send(&mut self, message: &Message, timeout: Duration) -> Result<()>;

    /// Sends a ping control frame, blocking at most `timeout` for the
    /// corresponding pong.
    ///
    /// # Errors
    /// Returns a runtime error if no pong arrives within `timeout` or the
    /// transport fails.
    fn ping(&mut self, timeout: Duration) -> Result<()>;

    /// Receives the next message, blocking at most `timeout`. Returns `Ok(None)`
    /// on timeout with no message, distinct from a closed connection.
    ///
    /// # Errors
    /// Returns a runtime error on a transport failure.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Message>>;

    /// Whether the peer has closed the connection.
    fn is_closed(&self) -> bool;

    /// Sends a close frame and shuts down the transport.
    ///
    /// # Errors
    /// Returns a runtime error on a transport failure.
    fn close(&mut self, code: u16, reason: &str) -> Result<()>;
}
