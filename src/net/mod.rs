//! TCP socket bridge: dialer with SSRF defense, buffered reads, and a
//! request-scoped cap on concurrent sockets.

mod ssrf;
mod tcp;

pub use ssrf::{check_destination, SsrfFilter};
pub use tcp::{TcpSocket, TcpSocketRegistry, TlsMode, DEFAULT_READ_TIMEOUT};
