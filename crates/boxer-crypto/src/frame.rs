//! Wire framing for sealed chunks
//!
//! ```text
//! [4 bytes: ciphertext length, big-endian][1 byte: flag][ciphertext || 16-byte tag]
//! flag = 0x00 (more frames follow) | 0x01 (terminal)
//! ```
//!
//! End of input is never treated as end of stream on its own: only a frame
//! carrying the terminal flag ends a stream.

use std::io::{ErrorKind, Read, Write};

use crate::error::{StreamError, StreamResult};
use crate::{MAX_CHUNK_SIZE, TAG_SIZE};

/// Length prefix plus flag byte.
pub const HEADER_SIZE: usize = 5;

pub const FLAG_CONTINUE: u8 = 0x00;
pub const FLAG_TERMINAL: u8 = 0x01;

/// Largest ciphertext a frame may declare.
pub const MAX_FRAME_LEN: usize = MAX_CHUNK_SIZE + TAG_SIZE;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub len: usize,
    pub is_terminal: bool,
}

impl FrameHeader {
    pub fn encode(&self) -> StreamResult<[u8; HEADER_SIZE]> {
        let len = u32::try_from(self.len).map_err(|_| {
            StreamError::MalformedFrame(format!("frame length {} exceeds u32", self.len))
        })?;
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&len.to_be_bytes());
        out[4] = if self.is_terminal {
            FLAG_TERMINAL
        } else {
            FLAG_CONTINUE
        };
        Ok(out)
    }

    pub fn decode(raw: &[u8; HEADER_SIZE]) -> StreamResult<Self> {
        let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        let is_terminal = match raw[4] {
            FLAG_CONTINUE => false,
            FLAG_TERMINAL => true,
            other => {
                return Err(StreamError::MalformedFrame(format!(
                    "unknown flag byte {other:#04x}"
                )))
            }
        };
        if !(TAG_SIZE..=MAX_FRAME_LEN).contains(&len) {
            return Err(StreamError::MalformedFrame(format!(
                "frame length {len} outside [{TAG_SIZE}, {MAX_FRAME_LEN}]"
            )));
        }
        Ok(Self { len, is_terminal })
    }
}

/// Write one frame: header, then the sealed chunk.
pub fn write_frame<W: Write + ?Sized>(
    sink: &mut W,
    ciphertext: &[u8],
    is_terminal: bool,
) -> StreamResult<()> {
    let header = FrameHeader {
        len: ciphertext.len(),
        is_terminal,
    }
    .encode()?;
    sink.write_all(&header)?;
    sink.write_all(ciphertext)?;
    Ok(())
}

/// Read one frame into `buf` (replacing its contents).
///
/// Returns `Ok(None)` when the source is exhausted exactly on a frame
/// boundary; the caller decides whether that is a truncation. Running out of
/// input inside a frame is always [`StreamError::TruncatedStream`].
pub fn read_frame<R: Read + ?Sized>(
    source: &mut R,
    buf: &mut Vec<u8>,
) -> StreamResult<Option<FrameHeader>> {
    let mut raw = [0u8; HEADER_SIZE];
    match read_full(source, &mut raw)? {
        0 => return Ok(None),
        HEADER_SIZE => {}
        _ => return Err(StreamError::TruncatedStream),
    }
    let header = FrameHeader::decode(&raw)?;

    buf.clear();
    buf.resize(header.len, 0);
    if read_full(source, buf)? != header.len {
        return Err(StreamError::TruncatedStream);
    }
    Ok(Some(header))
}

/// Fill `buf` from `source`, stopping early only at end of input.
fn read_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
