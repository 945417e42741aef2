//! Streaming decryptor: reads frames, opens each with the expected nonce and
//! hands out plaintext until the terminal frame has been delivered.
//!
//! State machine:
//! ```text
//! Ready → Reading ⇄ Reading → Drained
//!    └────────┴──────────────→ Failed   (authentication, truncation, I/O)
//! any ──close()──→ Closed
//! ```

use std::io::Read;

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::frame::read_frame;
use crate::keys::{BaseNonce, StreamKey};
use crate::nonce::NonceSequencer;
use crate::TAG_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptorState {
    /// No frame read yet.
    Ready,
    /// At least one non-terminal frame opened.
    Reading,
    /// Terminal frame opened and fully delivered.
    Drained,
    /// Authentication failure, truncation or I/O error; discard the session.
    Failed,
    Closed,
}

/// Decrypting reader over any [`Read`] source.
pub struct Decryptor<R: Read> {
    source: R,
    cipher: XChaCha20Poly1305,
    sequencer: NonceSequencer,
    /// Opened plaintext of the current frame; `pos` marks what was delivered.
    plaintext: Vec<u8>,
    pos: usize,
    terminal_seen: bool,
    state: DecryptorState,
}

impl<R: Read> Decryptor<R> {
    pub fn new(source: R, base_nonce: &BaseNonce, key: &StreamKey) -> Self {
        debug!("decryptor opened");
        Self {
            source,
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
            sequencer: NonceSequencer::new(*base_nonce),
            plaintext: Vec::new(),
            pos: 0,
            terminal_seen: false,
            state: DecryptorState::Ready,
        }
    }

    pub fn state(&self) -> DecryptorState {
        self.state
    }

    /// Number of frames opened so far.
    pub fn frames_read(&self) -> u64 {
        self.sequencer.counter()
    }

    /// Copy plaintext into `buf`, pulling frames as needed.
    ///
    /// Returns `Ok(0)` only once the terminal frame has been fully delivered
    /// (or `buf` is empty).
    pub fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        match self.state {
            DecryptorState::Drained => return Ok(0),
            DecryptorState::Failed => return Err(StreamError::Usage("decryptor failed earlier")),
            DecryptorState::Closed => return Err(StreamError::Usage("decryptor already closed")),
            DecryptorState::Ready | DecryptorState::Reading => {}
        }
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let pending = &self.plaintext[self.pos..];
            if !pending.is_empty() {
                let n = pending.len().min(buf.len());
                buf[..n].copy_from_slice(&pending[..n]);
                self.pos += n;
                self.settle();
                return Ok(n);
            }
            if self.terminal_seen {
                self.settle();
                return Ok(0);
            }
            if let Err(e) = self.open_next_frame() {
                self.state = DecryptorState::Failed;
                warn!(counter = self.sequencer.counter(), error = %e, "decryption failed");
                return Err(e);
            }
        }
    }

    /// End the session and discard buffered plaintext. Calling it again is a
    /// no-op. The source itself is kept until [`Decryptor::into_inner`] or drop.
    pub fn close(&mut self) -> StreamResult<()> {
        if self.state != DecryptorState::Closed {
            debug!(frames = self.sequencer.counter(), state = ?self.state, "decryptor closed");
            self.state = DecryptorState::Closed;
            self.plaintext = Vec::new();
            self.pos = 0;
        }
        Ok(())
    }

    /// Hand back the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Move to Drained once the terminal plaintext is fully delivered.
    fn settle(&mut self) {
        if self.terminal_seen && self.pos == self.plaintext.len() {
            self.state = DecryptorState::Drained;
        }
    }

    fn open_next_frame(&mut self) -> StreamResult<()> {
        let header = read_frame(&mut self.source, &mut self.plaintext)?
            .ok_or(StreamError::TruncatedStream)?;
        self.pos = 0;

        let counter = self.sequencer.counter();
        let nonce = self.sequencer.expect(counter, header.is_terminal)?;
        self.cipher
            .decrypt_in_place(XNonce::from_slice(&nonce), b"", &mut self.plaintext)
            .map_err(|_| StreamError::AuthenticationFailure { counter })?;
        self.sequencer.next(header.is_terminal)?;

        trace!(
            counter,
            plaintext_len = header.len - TAG_SIZE,
            is_terminal = header.is_terminal,
            "frame opened"
        );
        if header.is_terminal {
            self.terminal_seen = true;
        } else {
            self.state = DecryptorState::Reading;
        }
        Ok(())
    }
}

impl<R: Read> Read for Decryptor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Ok(Decryptor::read(self, buf)?)
    }
}
