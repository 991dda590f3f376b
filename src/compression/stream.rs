//! Incremental compression and decompression streams.
//!
//! Compression emits output synchronously from the calling thread: the
//! per-call buffer is reset, the encoder is driven, and whatever came out is
//! returned. Decompression needs true incremental output, so `init` spawns
//! two long-lived threads: a writer that owns the rendezvous channel to a
//! decoder thread (standing in for an OS pipe), which in turn runs a
//! format-specific decoder and appends decoded bytes to a mutex-guarded
//! buffer. `chunk` pushes bytes onto an ordering queue the writer thread
//! drains in order — a plain, non-blocking push, never a new thread per
//! call, so two chunks can never race to rendezvous with the decoder out of
//! order.

use super::format::Format;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Whether a stream compresses or decompresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Feeds plaintext in, produces compressed output.
    Compress,
    /// Feeds compressed bytes in, produces plaintext output.
    Decompress,
}

/// Registry of live streams for one request, keyed by stream id. Streams are
/// removed from the map on flush, matching the "unknown stream" invariant.
#[derive(Default)]
pub struct StreamRegistry {
    streams: HashMap<u64, CompressStreamState>,
    next_id: u64,
}

impl StreamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocates a new stream of `format`/`mode`, returning its id.
    ///
    /// # Errors
    /// Propagates any error from constructing the underlying encoder.
    pub fn init(&mut self, format: Format, mode: Mode) -> Result<u64> {
        let state = CompressStreamState::new(format, mode)?;
        let id = self.next_id;
        self.next_id += 1;
        self.streams.insert(id, state);
        Ok(id)
    }

    /// Feeds `data` into the stream, returning whatever output is available.
    ///
    /// # Errors
    /// Returns "unknown stream" if `id` does not refer to a live stream, or
    /// a runtime error surfaced from a background decompressor; in the
    /// latter case the stream is removed.
    pub fn chunk(&mut self, id: u64, data: &[u8]) -> Result<Vec<u8>> {
        let state = self
            .streams
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("stream"))?;
        match state.chunk(data) {
            Ok(out) => Ok(out),
            Err(err) => {
                self.streams.remove(&id);
                Err(err)
            }
        }
    }

    /// Finalizes the stream, returning any remaining output, and removes it.
    ///
    /// # Errors
    /// Returns "unknown stream" if `id` does not refer to a live stream, or
    /// whatever error the encoder/decoder surfaced on finalization.
    pub fn flush(&mut self, id: u64) -> Result<Vec<u8>> {
        let mut state = self
            .streams
            .remove(&id)
            .ok_or_else(|| Error::not_found("stream"))?;
        state.flush()
    }

    /// Tears down every live stream, for request teardown: drops each
    /// compress encoder and, for decompress streams, closes the writer half
    /// of the decompressor pipe and joins its worker thread. Output produced
    /// by the teardown is discarded — nothing reads it at this point.
    pub fn close_all(&mut self) {
        for (_, state) in self.streams.drain() {
            let _ = state.flush();
        }
    }
}

enum CompressEncoder {
    Gzip(GzEncoder<Vec<u8>>),
    Deflate(ZlibEncoder<Vec<u8>>),
    DeflateRaw(DeflateEncoder<Vec<u8>>),
    Brotli {
        writer: Option<brotli::CompressorWriter<SharedSink>>,
        sink: Arc<Mutex<Vec<u8>>>,
    },
}

#[derive(Clone)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct DecompressWorker {
    /// Ordering queue `chunk()` pushes into. A regular (unbounded) channel,
    /// so pushing never blocks the calling thread and always preserves call
    /// order; the writer thread below is the only thing that ever rendezvous
    /// with the decoder's pipe.
    order_sender: Option<mpsc::Sender<Vec<u8>>>,
    output: Arc<Mutex<Vec<u8>>>,
    error: Arc<Mutex<Option<String>>>,
    writer_handle: Option<JoinHandle<()>>,
    decoder_handle: Option<JoinHandle<()>>,
}

/// Per-stream state: an active encoder or decompression worker.
pub struct CompressStreamState {
    format: Format,
    mode: Mode,
    encoder: Option<CompressEncoder>,
    worker: Option<DecompressWorker>,
}

impl CompressStreamState {
    fn new(format: Format, mode: Mode) -> Result<Self> {
        let (encoder, worker) = match mode {
            Mode::Compress => (Some(new_encoder(format)?), None),
            Mode::Decompress => (None, Some(spawn_decompress_worker(format))),
        };
        Ok(Self {
            format,
            mode,
            encoder,
            worker,
        })
    }

    fn chunk(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        match self.mode {
            Mode::Compress => chunk_compress(self.encoder.as_mut().expect("compress encoder"), data),
            Mode::Decompress => chunk_decompress(self.worker.as_mut().expect("decompress worker"), data),
        }
    }

    fn flush(mut self) -> Result<Vec<u8>> {
        match self.mode {
            Mode::Compress => flush_compress(self.encoder.take().expect("compress encoder")),
            Mode::Decompress => flush_decompress(self.worker.take().expect("decompress worker")),
        }
    }
}

fn new_encoder(format: Format) -> Result<CompressEncoder> {
    Ok(match format {
        Format::Gzip => CompressEncoder::Gzip(GzEncoder::new(Vec::new(), Compression::default())),
        Format::Deflate => {
            CompressEncoder::Deflate(ZlibEncoder::new(Vec::new(), Compression::default()))
        }
        Format::DeflateRaw => {
            CompressEncoder::DeflateRaw(DeflateEncoder::new(Vec::new(), Compression::default()))
        }
        Format::Brotli => {
            let sink = Arc::new(Mutex::new(Vec::new()));
            let params = brotli::enc::BrotliEncoderParams::default();
            let writer = brotli::CompressorWriter::with_params(SharedSink(sink.clone()), 4096, &params);
            CompressEncoder::Brotli {
                writer: Some(writer),
                sink,
            }
        }
    })
}

fn chunk_compress(encoder: &mut CompressEncoder, data: &[u8]) -> Result<Vec<u8>> {
    match encoder {
        CompressEncoder::Gzip(e) => {
            e.write_all(data)?;
            Ok(std::mem::take(e.get_mut()))
        }
        CompressEncoder::Deflate(e) => {
            e.write_all(data)?;
            Ok(std::mem::take(e.get_mut()))
        }
        CompressEncoder::DeflateRaw(e) => {
            e.write_all(data)?;
            Ok(std::mem::take(e.get_mut()))
        }
        CompressEncoder::Brotli { writer, sink } => {
            let w = writer.as_mut().expect("brotli writer present before flush");
            w.write_all(data)?;
            w.flush()?;
            Ok(std::mem::take(&mut *sink.lock()))
        }
    }
}

fn flush_compress(encoder: CompressEncoder) -> Result<Vec<u8>> {
    match encoder {
        CompressEncoder::Gzip(e) => Ok(e.finish()?),
        CompressEncoder::Deflate(e) => Ok(e.finish()?),
        CompressEncoder::DeflateRaw(e) => Ok(e.finish()?),
        CompressEncoder::Brotli { writer, sink } => {
            // CompressorWriter finalizes the brotli stream (writes the final
            // block) when dropped; dropping it here is how we force that.
            drop(writer);
            Ok(std::mem::take(&mut *sink.lock()))
        }
    }
}

struct PipeReader {
    rx: mpsc::Receiver<Vec<u8>>,
    buf: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if self.pos < self.buf.len() {
                let n = out.len().min(self.buf.len() - self.pos);
                out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            match self.rx.recv() {
                Ok(chunk) => {
                    self.buf = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
    }
}

fn spawn_decompress_worker(format: Format) -> DecompressWorker {
    // A zero-capacity channel behaves like a blocking pipe: send() rendezvous
    // with the decoder's recv(). Exactly one long-lived writer thread owns
    // that rendezvous, draining the ordering queue in the order chunk()
    // pushed into it, so two chunks can never race to hand data to the
    // decoder out of order.
    let (order_tx, order_rx) = mpsc::channel::<Vec<u8>>();
    let (pipe_tx, pipe_rx) = mpsc::sync_channel::<Vec<u8>>(0);

    let writer_handle = std::thread::spawn(move || {
        while let Ok(chunk) = order_rx.recv() {
            if pipe_tx.send(chunk).is_err() {
                break;
            }
        }
        // pipe_tx drops here, closing the pipe and signaling EOF to the decoder.
    });

    let output = Arc::new(Mutex::new(Vec::new()));
    let error = Arc::new(Mutex::new(None));
    let output_clone = Arc::clone(&output);
    let error_clone = Arc::clone(&error);

    let decoder_handle = std::thread::spawn(move || {
        let reader = PipeReader {
            rx: pipe_rx,
            buf: Vec::new(),
            pos: 0,
        };
        if let Err(err) = drain_decoder(format, reader, &output_clone) {
            *error_clone.lock() = Some(err.script_message());
        }
    });

    DecompressWorker {
        order_sender: Some(order_tx),
        output,
        error,
        writer_handle: Some(writer_handle),
        decoder_handle: Some(decoder_handle),
    }
}

fn drain_decoder(format: Format, reader: PipeReader, output: &Arc<Mutex<Vec<u8>>>) -> Result<()> {
    let mut decoder: Box<dyn Read> = match format {
        Format::Gzip => Box::new(GzDecoder::new(reader)),
        Format::Deflate => Box::new(ZlibDecoder::new(reader)),
        Format::DeflateRaw => Box::new(DeflateDecoder::new(reader)),
        Format::Brotli => Box::new(brotli::Decompressor::new(reader, 4096)),
    };
    let mut buf = [0u8; 8192];
    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        output.lock().extend_from_slice(&buf[..n]);
    }
}

fn chunk_decompress(worker: &mut DecompressWorker, data: &[u8]) -> Result<Vec<u8>> {
    if let Some(message) = worker.error.lock().take() {
        return Err(Error::runtime(message));
    }
    if let Some(sender) = &worker.order_sender {
        // Non-blocking: the dedicated writer thread performs the ordered,
        // blocking rendezvous with the decoder on this data's behalf.
        let _ = sender.send(data.to_vec());
    }
    Ok(std::mem::take(&mut *worker.output.lock()))
}

fn flush_decompress(mut worker: DecompressWorker) -> Result<Vec<u8>> {
    worker.order_sender = None; // closes the queue: writer exits, pipe closes, decoder sees EOF
    if let Some(handle) = worker.writer_handle.take() {
        let _ = handle.join();
    }
    if let Some(handle) = worker.decoder_handle.take() {
        let _ = handle.join();
    }
    if let Some(message) = worker.error.lock().take() {
        return Err(Error::runtime(message));
    }
    Ok(std::mem::take(&mut *worker.output.lock()))
}
