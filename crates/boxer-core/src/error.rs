use thiserror::Error;

pub type BoxerResult<T> = Result<T, BoxerError>;

#[derive(Debug, Error)]
pub enum BoxerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input length, wanted {expected} got {actual}")]
    InputLengthMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
