//! boxer-crypto: streaming authenticated encryption for boxer
//!
//! Architecture: fixed-size chunks, each sealed with XChaCha20-Poly1305
//!
//! Pipeline: plaintext → buffer to chunk size → seal (per-chunk nonce) → frame → sink
//!
//! Nonce layout:
//! ```text
//! [16 bytes: caller base nonce][8 bytes: big-endian counter]
//!                               ^ high bit set only on the terminal chunk
//! ```
//!
//! Frame layout:
//! ```text
//! [4 bytes: ciphertext length, BE][1 byte: flag 0x00 | 0x01][ciphertext + 16-byte tag]
//! ```
//!
//! Exactly one terminal frame ends every stream. A decryptor that runs out of
//! input before reading it reports [`StreamError::TruncatedStream`] instead of a
//! short plaintext.

pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod frame;
pub mod keys;
pub mod nonce;

pub use decrypt::Decryptor;
pub use encrypt::Encryptor;
pub use error::{StreamError, StreamResult};
pub use keys::{BaseNonce, StreamKey};
pub use nonce::NonceSequencer;

/// Size of a stream key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the caller-supplied base nonce
pub const BASE_NONCE_SIZE: usize = 16;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Chunk size used by [`Encryptor::new`] (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

/// Largest accepted chunk size (16 MiB).
///
/// Keeps `chunk + TAG_SIZE` well inside the 32-bit frame length and bounds
/// per-session memory on both sides.
pub const MAX_CHUNK_SIZE: usize = 1 << 24;
