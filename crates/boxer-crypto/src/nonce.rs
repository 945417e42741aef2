//! Per-chunk nonce derivation
//!
//! ```text
//! nonce = base_nonce (16 bytes) || be64(counter | TERMINAL_BIT?) (8 bytes)
//! ```
//!
//! The high bit of the counter field is reserved for the terminal chunk, so a
//! terminal nonce never equals a non-terminal nonce for any counter value. The
//! terminal flag in the frame header is therefore authenticated: flipping it
//! makes the decryptor open with the wrong nonce.

use crate::error::{StreamError, StreamResult};
use crate::keys::BaseNonce;
use crate::{BASE_NONCE_SIZE, NONCE_SIZE};

/// Reserved counter bit marking the terminal chunk.
pub const TERMINAL_BIT: u64 = 1 << 63;

/// Produces the nonce for each chunk of one session, in order.
#[derive(Debug, Clone)]
pub struct NonceSequencer {
    base: BaseNonce,
    counter: u64,
}

impl NonceSequencer {
    pub fn new(base: BaseNonce) -> Self {
        Self { base, counter: 0 }
    }

    /// Counter value the next call to [`next`](Self::next) will use.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Nonce for the current counter, then advance the counter.
    pub fn next(&mut self, is_terminal: bool) -> StreamResult<[u8; NONCE_SIZE]> {
        let nonce = self.expect(self.counter, is_terminal)?;
        self.counter += 1;
        Ok(nonce)
    }

    /// Recompute the nonce for an arbitrary counter without touching state.
    pub fn expect(&self, counter: u64, is_terminal: bool) -> StreamResult<[u8; NONCE_SIZE]> {
        if counter & TERMINAL_BIT != 0 {
            return Err(StreamError::CounterExhausted);
        }
        let field = if is_terminal {
            counter | TERMINAL_BIT
        } else {
            counter
        };

        let mut nonce = [0u8; NONCE_SIZE];
        nonce[..BASE_NONCE_SIZE].copy_from_slice(self.base.as_bytes());
        nonce[BASE_NONCE_SIZE..].copy_from_slice(&field.to_be_bytes());
        Ok(nonce)
    }
}
