use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BoxerError, BoxerResult};

/// Top-level configuration (loaded from boxer.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxerConfig {
    pub stream: StreamConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Plaintext bytes per frame (default: 65536, max: 16 MiB).
    ///
    /// The default mirrors `boxer_crypto::DEFAULT_CHUNK_SIZE`; this crate does
    /// not depend on the engine, so boxer-cli's
    /// `test_config_default_chunk_matches_engine` keeps the two in step.
    pub chunk_size: usize,
    /// File holding the 32-byte key (prompt when unset)
    pub key_file: Option<PathBuf>,
    /// File holding the 16-byte base nonce (prompt when unset)
    pub nonce_file: Option<PathBuf>,
    /// Warn if a key or nonce file is readable by group/other (default: true)
    pub file_mode_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1 << 16,
            key_file: None,
            nonce_file: None,
            file_mode_check: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl BoxerConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> BoxerResult<Self> {
        let path = expand_tilde(path);
        if !path.exists() {
            tracing::debug!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BoxerError::Config(format!("reading config {}: {e}", path.display())))?;
        Self::parse(&content)
            .map_err(|e| BoxerError::Config(format!("parsing config {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Which way a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Where raw key or nonce bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSource {
    File(PathBuf),
    /// Interactive terminal prompt with echo disabled
    Prompt,
}

impl MaterialSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => MaterialSource::File(expand_tilde(&p)),
            None => MaterialSource::Prompt,
        }
    }
}

/// Everything one encrypt/decrypt run needs, resolved once from flags and
/// config and passed down explicitly.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub direction: Direction,
    pub chunk_size: usize,
    pub nonce: MaterialSource,
    pub key: MaterialSource,
    /// Input file (stdin when unset)
    pub input: Option<PathBuf>,
    /// Output file (stdout when unset)
    pub output: Option<PathBuf>,
    pub file_mode_check: bool,
}

impl SessionConfig {
    /// Merge per-run overrides onto the file config; overrides win.
    pub fn resolve(config: &BoxerConfig, overrides: SessionOverrides) -> Self {
        Self {
            direction: overrides.direction,
            chunk_size: overrides.chunk_size.unwrap_or(config.stream.chunk_size),
            nonce: MaterialSource::from_path(
                overrides.nonce.or_else(|| config.stream.nonce_file.clone()),
            ),
            key: MaterialSource::from_path(
                overrides.key.or_else(|| config.stream.key_file.clone()),
            ),
            input: overrides.input,
            output: overrides.output,
            file_mode_check: config.stream.file_mode_check,
        }
    }
}

/// Per-run settings supplied on the command line.
#[derive(Debug, Clone)]
pub struct SessionOverrides {
    pub direction: Direction,
    pub chunk_size: Option<usize>,
    pub nonce: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{home}/{rest}"))
    } else {
        path.to_path_buf()
    }
}
