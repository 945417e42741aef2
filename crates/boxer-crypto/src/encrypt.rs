//! Streaming encryptor: buffers plaintext into fixed-size chunks and emits
//! one sealed frame per chunk.
//!
//! Only [`Encryptor::close`] writes the terminal frame. Dropping an encryptor
//! without closing it leaves a stream the decryptor rejects as truncated, and
//! logs a warning.

use std::io::Write;

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::frame::write_frame;
use crate::keys::{BaseNonce, StreamKey};
use crate::nonce::NonceSequencer;
use crate::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, TAG_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
    Failed,
}

/// Encrypting writer over any [`Write`] sink.
pub struct Encryptor<W: Write> {
    /// Always `Some` until `finish` takes it.
    sink: Option<W>,
    cipher: XChaCha20Poly1305,
    sequencer: NonceSequencer,
    /// Pending plaintext; sealed in place, so it has room for the tag.
    buf: Vec<u8>,
    chunk_size: usize,
    state: State,
}

impl<W: Write> Encryptor<W> {
    /// Encryptor with [`DEFAULT_CHUNK_SIZE`].
    pub fn new(sink: W, base_nonce: &BaseNonce, key: &StreamKey) -> Self {
        Self::build(sink, base_nonce, key, DEFAULT_CHUNK_SIZE)
    }

    /// Encryptor with a caller-chosen chunk size in `1..=MAX_CHUNK_SIZE`.
    ///
    /// Fails with [`StreamError::InvalidChunkSize`] without touching the sink.
    pub fn with_chunk_size(
        sink: W,
        base_nonce: &BaseNonce,
        key: &StreamKey,
        chunk_size: usize,
    ) -> StreamResult<Self> {
        validate_chunk_size(chunk_size)?;
        Ok(Self::build(sink, base_nonce, key, chunk_size))
    }

    fn build(sink: W, base_nonce: &BaseNonce, key: &StreamKey, chunk_size: usize) -> Self {
        debug!(chunk_size, "encryptor opened");
        Self {
            sink: Some(sink),
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
            sequencer: NonceSequencer::new(*base_nonce),
            buf: Vec::with_capacity(chunk_size + TAG_SIZE),
            chunk_size,
            state: State::Open,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of frames emitted so far.
    pub fn frames_written(&self) -> u64 {
        self.sequencer.counter()
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Buffer `data`, emitting a frame each time a full chunk accumulates.
    ///
    /// Always consumes all of `data` on success.
    pub fn write(&mut self, mut data: &[u8]) -> StreamResult<usize> {
        self.ensure_open()?;
        let total = data.len();
        while !data.is_empty() {
            let take = (self.chunk_size - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == self.chunk_size {
                self.guard(|enc| enc.seal_and_emit(false))?;
            }
        }
        Ok(total)
    }

    /// Seal whatever is buffered (possibly nothing) as the terminal frame and
    /// flush the sink.
    pub fn close(&mut self) -> StreamResult<()> {
        self.ensure_open()?;
        self.guard(|enc| {
            enc.seal_and_emit(true)?;
            enc.sink()?.flush()?;
            Ok(())
        })?;
        self.state = State::Closed;
        debug!(frames = self.sequencer.counter(), "encryptor closed");
        Ok(())
    }

    /// Close the stream and hand back the sink.
    pub fn finish(mut self) -> StreamResult<W> {
        self.close()?;
        self.sink
            .take()
            .ok_or(StreamError::Usage("encryptor sink already taken"))
    }

    fn sink(&mut self) -> StreamResult<&mut W> {
        self.sink
            .as_mut()
            .ok_or(StreamError::Usage("encryptor sink already taken"))
    }

    fn ensure_open(&self) -> StreamResult<()> {
        match self.state {
            State::Open => Ok(()),
            State::Closed => Err(StreamError::Usage("encryptor already closed")),
            State::Failed => Err(StreamError::Usage("encryptor failed earlier")),
        }
    }

    /// Run `op`, poisoning the session if it fails.
    fn guard(&mut self, op: impl FnOnce(&mut Self) -> StreamResult<()>) -> StreamResult<()> {
        op(self).inspect_err(|_| self.state = State::Failed)
    }

    fn seal_and_emit(&mut self, is_terminal: bool) -> StreamResult<()> {
        let counter = self.sequencer.counter();
        let plaintext_len = self.buf.len();
        let nonce = self.sequencer.next(is_terminal)?;

        self.cipher
            .encrypt_in_place(XNonce::from_slice(&nonce), b"", &mut self.buf)
            .map_err(|e| {
                StreamError::Io(std::io::Error::other(format!("chunk sealing failed: {e}")))
            })?;
        let sink = self
            .sink
            .as_mut()
            .ok_or(StreamError::Usage("encryptor sink already taken"))?;
        write_frame(sink, &self.buf, is_terminal)?;
        self.buf.clear();

        trace!(counter, plaintext_len, is_terminal, "frame written");
        Ok(())
    }
}

impl<W: Write> Write for Encryptor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(Encryptor::write(self, buf)?)
    }

    /// Flushes the sink only. A partial chunk stays buffered: emitting it
    /// early would put a short non-terminal chunk on the wire.
    fn flush(&mut self) -> std::io::Result<()> {
        self.ensure_open()?;
        self.sink()?.flush()
    }
}

impl<W: Write> Drop for Encryptor<W> {
    fn drop(&mut self) {
        if self.state == State::Open {
            warn!(
                frames = self.sequencer.counter(),
                buffered = self.buf.len(),
                "encryptor dropped without close; stream is truncated"
            );
        }
    }
}

/// Check a chunk size against `1..=MAX_CHUNK_SIZE`.
pub fn validate_chunk_size(chunk_size: usize) -> StreamResult<()> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(StreamError::InvalidChunkSize {
            size: chunk_size,
            max: MAX_CHUNK_SIZE,
        });
    }
    Ok(())
}
