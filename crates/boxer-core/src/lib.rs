pub mod config;
pub mod error;

pub use config::{BoxerConfig, Direction, MaterialSource, SessionConfig, SessionOverrides};
pub use error::{BoxerError, BoxerResult};
