//! WebSocket bridge: pumps frames between a transport and the script-visible
//! event target while keeping the engine single-threaded.

mod bridge;
mod handle;
mod message;

pub use bridge::WebSocketBridge;
pub use handle::WebSocketHandle;
pub use message::{Message, WsTransport};
