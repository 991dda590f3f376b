//! The `connect()` socket surface: a dialer gated by the SSRF filter, a
//! background read loop with a bounded buffer, and a blocking
//! `wait_for_data` primitive so the script's `pull()` never busy-spins.

use super::ssrf::SsrfFilter;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for [`TcpSocket::wait_for_data`] when the caller does not
/// specify one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// How a socket's transport layer is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain TCP, no TLS.
    Off,
    /// Plain TCP initially; [`TcpSocket::start_tls`] upgrades in place.
    StartTls,
    /// TLS from the first byte.
    On,
}

enum Transport {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(s) => s.read(buf),
            #[cfg(feature = "tls")]
            Self::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(s) => s.write(buf),
            #[cfg(feature = "tls")]
            Self::Tls(s) => s.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(s) => s.flush(),
            #[cfg(feature = "tls")]
            Self::Tls(s) => s.flush(),
        }
    }
}

struct SocketShared {
    buffer: Mutex<Vec<u8>>,
    has_data: Condvar,
    eof: AtomicBool,
    error: Mutex<Option<String>>,
    max_buffer_size: usize,
}

/// A bridged TCP connection: a readable stream over a buffered background
/// read loop, and a writable stream straight to the transport.
pub struct TcpSocket {
    transport: Arc<Mutex<Transport>>,
    shared: Arc<SocketShared>,
    closed: Arc<AtomicBool>,
    hostname: String,
    tls_mode: Mutex<TlsMode>,
    /// Address pair resolved at connect time, for the `opened` future.
    pub remote_address: String,
    /// Local address bound by the connection, for the `opened` future.
    pub local_address: String,
}

impl TcpSocket {
    /// Reads up to `max_bytes` from the buffer, returning the bytes read and
    /// whether the stream has reached EOF with nothing left buffered.
    ///
    /// If the buffer is empty and the stream has not reached EOF or error,
    /// callers must invoke [`wait_for_data`] before retrying rather than
    /// spin; this method never blocks.
    ///
    /// # Errors
    /// Returns a runtime error if the background read loop recorded one.
    ///
    /// [`wait_for_data`]: TcpSocket::wait_for_data
    pub fn read(&self, max_bytes: usize) -> Result<(Vec<u8>, bool)> {
        if let Some(message) = self.shared.error.lock().clone() {
            return Err(Error::runtime(message));
        }
        let mut buffer = self.shared.buffer.lock();
        let take = max_bytes.min(buffer.len());
        let data: Vec<u8> = buffer.drain(..take).collect();
        let eof = buffer.is_empty() && self.shared.eof.load(Ordering::Acquire);
        Ok((data, eof))
    }

    /// Blocks until data is available, EOF is reached, an error is
    /// recorded, or `timeout` elapses (default [`DEFAULT_READ_TIMEOUT`]).
    pub fn wait_for_data(&self, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_READ_TIMEOUT);
        let mut buffer = self.shared.buffer.lock();
        if !buffer.is_empty() || self.shared.eof.load(Ordering::Acquire) {
            return;
        }
        self.shared.has_data.wait_for(&mut buffer, timeout);
    }

    /// Writes `data` directly to the connection.
    ///
    /// # Errors
    /// Returns a runtime error if the socket is closed or the write fails.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::runtime("socket is closed"));
        }
        self.transport.lock().write_all(data)?;
        Ok(())
    }

    /// Closes the connection. Idempotent: a second call is a no-op, and any
    /// concurrent read/write will then fail cleanly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Transport::Plain(stream) = &*self.transport.lock() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.shared.eof.store(true, Ordering::Release);
        self.shared.has_data.notify_all();
    }

    /// Upgrades an initially-plain connection to TLS in place. Only valid
    /// when the socket was opened with [`TlsMode::StartTls`].
    ///
    /// # Errors
    /// Returns an error if the socket was not opened in `starttls` mode, or
    /// if the handshake fails.
    #[cfg(feature = "tls")]
    pub fn start_tls(&self) -> Result<()> {
        let mut mode = self.tls_mode.lock();
        if *mode != TlsMode::StartTls {
            return Err(Error::validation(
                "startTls() is only valid for sockets opened with starttls",
            ));
        }
        let mut transport = self.transport.lock();
        let Transport::Plain(stream) = &*transport else {
            return Err(Error::runtime("socket is already using TLS"));
        };
        let raw = stream
            .try_clone()
            .map_err(|e| Error::runtime(format!("could not clone socket for TLS: {e}")))?;
        let tls_stream = wrap_tls(raw, &self.hostname)?;
        *transport = Transport::Tls(Box::new(tls_stream));
        *mode = TlsMode::On;
        Ok(())
    }

    #[cfg(not(feature = "tls"))]
    /// Upgrading to TLS requires the `tls` feature.
    ///
    /// # Errors
    /// Always returns an error: the `tls` feature is not enabled.
    pub fn start_tls(&self) -> Result<()> {
        Err(Error::runtime("TLS support is not compiled in"))
    }
}

#[cfg(feature = "tls")]
fn wrap_tls(
    stream: TcpStream,
    hostname: &str,
) -> Result<rustls::StreamOwned<rustls::ClientConnection, TcpStream>> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let server_name = rustls_pki_types::ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::validation(format!("invalid TLS server name: {hostname}")))?;
    let conn = rustls::ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| Error::runtime(format!("TLS handshake setup failed: {e}")))?;
    Ok(rustls::StreamOwned::new(conn, stream))
}

fn spawn_read_loop(transport: Arc<Mutex<Transport>>, shared: Arc<SocketShared>, closed: Arc<AtomicBool>) {
    std::thread::spawn(move || loop {
        if closed.load(Ordering::Acquire) {
            return;
        }
        let mut chunk = [0u8; 4096];
        let read_result = transport.lock().read(&mut chunk);
        match read_result {
            Ok(0) => {
                shared.eof.store(true, Ordering::Release);
                shared.has_data.notify_all();
                return;
            }
            Ok(n) => {
                let mut buffer = shared.buffer.lock();
                if buffer.len() + n > shared.max_buffer_size {
                    *shared.error.lock() = Some(format!(
                        "TCP read buffer overflow: exceeded {} bytes",
                        shared.max_buffer_size
                    ));
                    shared.eof.store(true, Ordering::Release);
                    shared.has_data.notify_all();
                    return;
                }
                buffer.extend_from_slice(&chunk[..n]);
                shared.has_data.notify_all();
            }
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                *shared.error.lock() = Some(e.to_string());
                shared.eof.store(true, Ordering::Release);
                shared.has_data.notify_all();
                return;
            }
        }
    });
}

/// Per-request registry of open sockets, enforcing the concurrent-socket cap
/// and routing `connect()` through the SSRF filter.
pub struct TcpSocketRegistry {
    sockets: HashMap<u64, Arc<TcpSocket>>,
    next_id: u64,
    max_sockets: usize,
    max_buffer_size: usize,
    ssrf_filter: SsrfFilter,
}

impl TcpSocketRegistry {
    /// Builds a registry with the given caps.
    ///
    /// # Panics
    /// Panics if `max_sockets` is outside `1..=100` or `max_buffer_size` is
    /// outside `1 KiB..=100 MiB` — these are host configuration mistakes,
    /// not per-request runtime errors.
    #[must_use]
    pub fn new(max_sockets: usize, max_buffer_size: usize, ssrf_filter: SsrfFilter) -> Self {
        assert!((1..=100).contains(&max_sockets), "max_sockets out of range");
        assert!(
            (1024..=100 * 1024 * 1024).contains(&max_buffer_size),
            "max_buffer_size out of range"
        );
        Self {
            sockets: HashMap::new(),
            next_id: 1,
            max_sockets,
            max_buffer_size,
            ssrf_filter,
        }
    }

    /// Dials `hostname:port`, subject to the SSRF gate and the socket cap.
    ///
    /// # Errors
    /// Returns a policy error if the cap is exceeded or the destination is
    /// denied by the SSRF filter, or a runtime error if the dial fails.
    pub fn connect(&mut self, hostname: &str, port: u16, tls_mode: TlsMode) -> Result<u64> {
        if self.sockets.len() >= self.max_sockets {
            return Err(Error::policy(format!(
                "maximum socket limit ({}) reached for this request",
                self.max_sockets
            )));
        }
        self.ssrf_filter.check(hostname, port)?;

        let stream = TcpStream::connect((hostname, port))
            .map_err(|e| Error::runtime(format!("dial {hostname}:{port} failed: {e}")))?;
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let local_address = stream
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        let remote_address = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();

        let transport = if tls_mode == TlsMode::On {
            #[cfg(feature = "tls")]
            {
                Transport::Tls(Box::new(wrap_tls(stream, hostname)?))
            }
            #[cfg(not(feature = "tls"))]
            {
                return Err(Error::runtime("TLS support is not compiled in"));
            }
        } else {
            Transport::Plain(stream)
        };

        let shared = Arc::new(SocketShared {
            buffer: Mutex::new(Vec::new()),
            has_data: Condvar::new(),
            eof: AtomicBool::new(false),
            error: Mutex::new(None),
            max_buffer_size: self.max_buffer_size,
        });
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Arc::new(Mutex::new(transport));
        spawn_read_loop(Arc::clone(&transport), Arc::clone(&shared), Arc::clone(&closed));

        let socket = TcpSocket {
            transport,
            shared,
            closed,
            hostname: hostname.to_string(),
            tls_mode: Mutex::new(tls_mode),
            remote_address,
            local_address,
        };

        let id = self.next_id;
        self.next_id += 1;
        self.sockets.insert(id, Arc::new(socket));
        Ok(id)
    }

    /// Looks up a live socket by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Arc<TcpSocket>> {
        self.sockets.get(&id).cloned()
    }

    /// Closes and removes a socket. A lookup afterward fails with
    /// "unknown socket".
    pub fn close(&mut self, id: u64) {
        if let Some(socket) = self.sockets.remove(&id) {
            socket.close();
        }
    }

    /// Closes and removes every socket, for request teardown.
    pub fn close_all(&mut self) {
        for (_, socket) in self.sockets.drain() {
            socket.close();
        }
    }

    /// Number of currently-open sockets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether there are no open sockets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use std::net::TcpListener;

    fn echo_server() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn connect_read_write_close_round_trip() {
        let (listener, port) = echo_server();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 32];
                if let Ok(n) = stream.read(&mut buf) {
                    let _ = stream.write_all(&buf[..n]);
                }
            }
        });

        let mut registry = TcpSocketRegistry::new(10, 1024 * 1024, SsrfFilter::default());
        let id = registry.connect("127.0.0.1", port, TlsMode::Off).unwrap();
        let socket = registry.get(id).unwrap();
        socket.write(b"hello").unwrap();

        let mut collected = Vec::new();
        for _ in 0..20 {
            let (data, _eof) = socket.read(1024).unwrap();
            if !data.is_empty() {
                collected.extend(data);
                break;
            }
            socket.wait_for_data(Some(Duration::from_millis(200)));
        }
        assert_eq!(collected, b"hello");

        socket.close();
        socket.close(); // idempotent
        registry.close(id);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn socket_cap_is_enforced() {
        // SSRF filter disabled: the socket cap, not the loopback destination
        // the test stub listens on, is what this test exercises.
        let mut registry = TcpSocketRegistry::new(1, 1024, SsrfFilter::disabled());
        let (listener, port) = echo_server();
        std::mem::forget(listener);
        let first = registry.connect("127.0.0.1", port, TlsMode::Off);
        assert!(first.is_ok());
        let second = registry.connect("127.0.0.1", port, TlsMode::Off);
        assert!(second.unwrap_err().script_message().contains("maximum socket limit"));
    }

    #[test]
    fn ssrf_filter_blocks_before_dialing() {
        let mut registry = TcpSocketRegistry::new(10, 1024, SsrfFilter::default());
        let err = registry.connect("127.0.0.1", 8080, TlsMode::Off).unwrap_err();
        assert!(err.script_message().contains("private"));
    }
}
