//! Pumps frames between a [`WsTransport`] and the script-visible event
//! target, on the same thread that drives the engine.
//!
//! The engine is single-threaded and must never be touched from a
//! background worker; rather than spawn a reader thread that would have to
//! reach back into script state, the bridge's `run` loop *is* the request's
//! thread of control for the lifetime of the connection, alternating
//! between blocking transport reads and script dispatch.

use super::handle::WebSocketHandle;
use super::message::Message;
use crate::constants::{MAX_WS_MESSAGE_BYTES, WS_PING_INTERVAL, WS_SEND_TIMEOUT};
use crate::engine::{run_to_quiescence, ScriptEvent, ScriptHost};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::time::{Duration, Instant};

/// Drives one WebSocket connection's frame pump.
pub struct WebSocketBridge;

impl WebSocketBridge {
    /// Runs the bridge until the connection closes, a ping fails, or
    /// `deadline` passes, dispatching `message` events to `host` as frames
    /// arrive through `handle` and a final `close` event on exit.
    ///
    /// Runs on the same thread that owns `host`: the engine must never be
    /// driven from more than one thread, so the read loop and script
    /// dispatch alternate here rather than living on a background worker.
    ///
    /// Returns normally in every case (closed peer, failed ping, expired
    /// deadline) — none of these are bugs, so none panic or propagate an
    /// error; the caller tears down the request state afterward regardless
    /// of why the loop ended.
    pub fn run(handle: &WebSocketHandle, host: &mut dyn ScriptHost, deadline: Instant) {
        let mut last_ping = Instant::now();

        loop {
            if Instant::now() >= deadline || handle.is_closed() {
                break;
            }

            let until_ping = WS_PING_INTERVAL.saturating_sub(last_ping.elapsed());
            let until_deadline = deadline.saturating_duration_since(Instant::now());
            let wait = until_ping.min(until_deadline).max(Duration::from_millis(1));

            match handle.recv(wait) {
                Ok(Some(message)) => {
                    if byte_len(&message) > MAX_WS_MESSAGE_BYTES {
                        let _ = handle.close(1009, "message too large");
                        break;
                    }
                    host.dispatch_event(ScriptEvent::new("websocket", "message", encode(&message)));
                    run_to_quiescence(host);
                }
                Ok(None) => {}
                Err(_) => break,
            }

            if last_ping.elapsed() >= WS_PING_INTERVAL {
                if handle.ping(WS_SEND_TIMEOUT).is_err() {
                    break;
                }
                last_ping = Instant::now();
            }
        }

        host.dispatch_event(ScriptEvent::new("websocket", "close", ""));
        run_to_quiescence(host);
    }
}

fn encode(message: &Message) -> String {
    match message {
        Message::Text(text) => text.clone(),
        Message::Binary(bytes) => STANDARD.encode(bytes),
    }
}

/// Decoded size of `message`, the number [`MAX_WS_MESSAGE_BYTES`] bounds.
fn byte_len(message: &Message) -> usize {
    match message {
        Message::Text(text) => text.len(),
        Message::Binary(bytes) => bytes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::message::WsTransport;
    use crate::engine::HostCallable;
    use crate::error::Result;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        messages: VecDeque<Message>,
        closed: bool,
        pings: usize,
        fail_ping: bool,
    }

    impl WsTransport for ScriptedTransport {
        fn send(&mut self, _message: &Message, _timeout: Duration) -> Result<()> {
            Ok(())
        }
        fn ping(&mut self, _timeout: Duration) -> Result<()> {
            self.pings += 1;
            if self.fail_ping {
                return Err(crate::error::Error::runtime("no pong"));
            }
            Ok(())
        }
        fn recv(&mut self, _timeout: Duration) -> Result<Option<Message>> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(self.messages.pop_front())
        }
        fn is_closed(&self) -> bool {
            self.closed && self.messages.is_empty()
        }
        fn close(&mut self, _code: u16, _reason: &str) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        events: Vec<ScriptEvent>,
    }

    impl ScriptHost for RecordingHost {
        fn register_callable(&mut self, _name: &str, _callable: HostCallable) {}
        fn eval(&mut self, _source: &str) -> Result<()> {
            Ok(())
        }
        fn dispatch_event(&mut self, event: ScriptEvent) {
            self.events.push(event);
        }
        fn run_microtasks(&mut self) {}
    }

    #[test]
    fn delivers_messages_then_dispatches_close_on_transport_close() {
        let transport = ScriptedTransport {
            messages: VecDeque::from([Message::Text("ping".into())]),
            closed: true,
            pings: 0,
            fail_ping: false,
        };
        let handle = WebSocketHandle::new(Box::new(transport));
        let mut host = RecordingHost::default();
        WebSocketBridge::run(&handle, &mut host, Instant::now() + Duration::from_secs(5));

        assert_eq!(host.events.len(), 2);
        assert_eq!(host.events[0].name, "message");
        assert_eq!(host.events[0].payload, "ping");
        assert_eq!(host.events[1].name, "close");
    }

    #[test]
    fn binary_messages_are_base64_encoded() {
        assert_eq!(encode(&Message::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF])), "3q2+7w==");
    }

    #[test]
    fn deadline_ends_the_loop_even_with_an_open_transport() {
        let transport = ScriptedTransport {
            messages: VecDeque::new(),
            closed: false,
            pings: 0,
            fail_ping: false,
        };
        let handle = WebSocketHandle::new(Box::new(transport));
        let mut host = RecordingHost::default();
        WebSocketBridge::run(&handle, &mut host, Instant::now() + Duration::from_millis(5));
        assert_eq!(host.events.last().unwrap().name, "close");
    }

    #[test]
    fn oversized_message_closes_without_dispatching_it() {
        let oversized = "x".repeat(super::MAX_WS_MESSAGE_BYTES + 1);
        let transport = ScriptedTransport {
            messages: VecDeque::from([Message::Text(oversized)]),
            closed: false,
            pings: 0,
            fail_ping: false,
        };
        let handle = WebSocketHandle::new(Box::new(transport));
        let mut host = RecordingHost::default();
        WebSocketBridge::run(&handle, &mut host, Instant::now() + Duration::from_secs(5));

        assert_eq!(host.events.len(), 1);
        assert_eq!(host.events[0].name, "close");
        assert!(handle.is_closed());
    }
}
