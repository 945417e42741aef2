use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid chunk size {size} (must be between 1 and {max})")]
    InvalidChunkSize { size: usize, max: usize },

    #[error("authentication failed for chunk {counter}: corrupted or tampered ciphertext")]
    AuthenticationFailure { counter: u64 },

    #[error("stream truncated: input ended before the terminal frame")]
    TruncatedStream,

    #[error("invalid input length, wanted {expected} got {actual}")]
    InputLengthMismatch { expected: usize, actual: usize },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("chunk counter exhausted")]
    CounterExhausted,

    #[error("usage error: {0}")]
    Usage(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StreamError> for std::io::Error {
    fn from(err: StreamError) -> Self {
        use std::io::ErrorKind;

        let kind = match err {
            StreamError::Io(inner) => return inner,
            StreamError::AuthenticationFailure { .. } | StreamError::MalformedFrame(_) => {
                ErrorKind::InvalidData
            }
            StreamError::TruncatedStream => ErrorKind::UnexpectedEof,
            StreamError::InvalidChunkSize { .. } | StreamError::InputLengthMismatch { .. } => {
                ErrorKind::InvalidInput
            }
            StreamError::CounterExhausted | StreamError::Usage(_) => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_io_error_kinds() {
        let e: std::io::Error = StreamError::TruncatedStream.into();
        assert_eq!(e.kind(), ErrorKind::UnexpectedEof);

        let e: std::io::Error = StreamError::AuthenticationFailure { counter: 3 }.into();
        assert_eq!(e.kind(), ErrorKind::InvalidData);

        let e: std::io::Error = StreamError::InvalidChunkSize { size: 0, max: 1 }.into();
        assert_eq!(e.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_io_error_passthrough() {
        let inner = std::io::Error::new(ErrorKind::BrokenPipe, "pipe closed");
        let e: std::io::Error = StreamError::Io(inner).into();
        assert_eq!(e.kind(), ErrorKind::BrokenPipe);
        assert_eq!(e.to_string(), "pipe closed");
    }

    #[test]
    fn test_stream_error_downcast_from_io() {
        let e: std::io::Error = StreamError::TruncatedStream.into();
        let inner = e.into_inner().unwrap().downcast::<StreamError>().unwrap();
        assert!(matches!(*inner, StreamError::TruncatedStream));
    }
}
