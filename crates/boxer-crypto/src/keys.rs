//! Session key material: the 256-bit stream key and the 128-bit base nonce

use zeroize::Zeroize;

use crate::error::{StreamError, StreamResult};
use crate::{BASE_NONCE_SIZE, KEY_SIZE};

/// A 256-bit stream encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct StreamKey {
    bytes: [u8; KEY_SIZE],
}

impl StreamKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from a caller buffer, which must be exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> StreamResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| StreamError::InputLengthMismatch {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for StreamKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The caller-chosen 16-byte prefix of every chunk nonce in a session.
///
/// Reusing a base nonce with the same key for two different plaintexts
/// breaks confidentiality; nothing here can detect that.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BaseNonce {
    bytes: [u8; BASE_NONCE_SIZE],
}

impl BaseNonce {
    pub fn from_bytes(bytes: [u8; BASE_NONCE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a base nonce from a caller buffer, which must be exactly
    /// [`BASE_NONCE_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> StreamResult<Self> {
        let bytes: [u8; BASE_NONCE_SIZE] =
            bytes.try_into().map_err(|_| StreamError::InputLengthMismatch {
                expected: BASE_NONCE_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; BASE_NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for BaseNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BaseNonce(")?;
        for b in &self.bytes {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_slice_exact() {
        let key = StreamKey::from_slice(&[7u8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn test_key_from_slice_wrong_length() {
        let err = StreamKey::from_slice(&[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InputLengthMismatch {
                expected: 32,
                actual: 31
            }
        ));
    }

    #[test]
    fn test_base_nonce_from_slice_wrong_length() {
        let err = BaseNonce::from_slice(&[4u8; 17]).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InputLengthMismatch {
                expected: 16,
                actual: 17
            }
        ));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = StreamKey::from_bytes([0xAB; KEY_SIZE]);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("ab"), "key bytes must not leak into Debug output");
    }

    #[test]
    fn test_base_nonce_debug_is_hex() {
        let nonce = BaseNonce::from_bytes([4u8; BASE_NONCE_SIZE]);
        assert_eq!(format!("{nonce:?}"), format!("BaseNonce({})", "04".repeat(16)));
    }
}
