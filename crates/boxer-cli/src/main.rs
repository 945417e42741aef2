//! boxer: streaming authenticated encryption CLI
//!
//! Usage:
//!   boxer [--key FILE] [--nonce FILE] [--in FILE] [--out FILE] [--chunk N] [--dec]
//!
//! Input defaults to stdin and output to stdout. Key (32 bytes) and base
//! nonce (16 bytes) are prompted for on the terminal when no file is given.
//! Logs always go to stderr so they never mix with stream data.

mod material;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use boxer_core::{BoxerConfig, Direction, SessionConfig, SessionOverrides};
use boxer_crypto::{BaseNonce, Decryptor, Encryptor, StreamKey, BASE_NONCE_SIZE, KEY_SIZE};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "boxer",
    version,
    about = "Encrypt or decrypt a byte stream in authenticated chunks",
    long_about = "boxer: seal a stream into XChaCha20-Poly1305 frames, or open one back, \
                  failing on any tampering or truncation"
)]
struct Cli {
    /// Path to boxer.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "BOXER_CONFIG",
        default_value = "~/.config/boxer/config.toml"
    )]
    config: PathBuf,

    /// Plaintext bytes per frame when encrypting (overrides config)
    #[arg(long)]
    chunk: Option<usize>,

    /// File to read the 16-byte base nonce from. When unset it is prompted
    /// for, and the typed value must be exactly 16 bytes of UTF-8
    #[arg(long)]
    nonce: Option<PathBuf>,

    /// File to read the 32-byte key from. When unset it is prompted for, and
    /// the typed value must be exactly 32 bytes of UTF-8
    #[arg(long)]
    key: Option<PathBuf>,

    /// Input file, defaults to stdin
    #[arg(long = "in")]
    input: Option<PathBuf>,

    /// Output file, defaults to stdout
    #[arg(long = "out")]
    output: Option<PathBuf>,

    /// Decrypt instead of encrypt
    #[arg(long)]
    dec: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BOXER_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "BOXER_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl Cli {
    fn overrides(&self) -> SessionOverrides {
        SessionOverrides {
            direction: if self.dec {
                Direction::Decrypt
            } else {
                Direction::Encrypt
            },
            chunk_size: self.chunk,
            nonce: self.nonce.clone(),
            key: self.key.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up before config errors are reported, so a broken config
    // file still produces a readable message.
    let config = BoxerConfig::load(&cli.config);
    let log_config = config
        .as_ref()
        .map(|c| c.log.clone())
        .unwrap_or_default();
    let level = cli.log.clone().unwrap_or(log_config.level);
    let format = cli
        .log_format
        .clone()
        .or_else(|| LogFormat::from_str(&log_config.format, true).ok())
        .unwrap_or(LogFormat::Text);
    init_logging(&level, &format);

    let result = config
        .context("loading configuration")
        .and_then(|config| run(SessionConfig::resolve(&config, cli.overrides())));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(session: SessionConfig) -> Result<()> {
    if session.direction == Direction::Encrypt {
        boxer_crypto::encrypt::validate_chunk_size(session.chunk_size).context("--chunk")?;
    }

    let nonce = material::read_material(
        "nonce",
        &session.nonce,
        BASE_NONCE_SIZE,
        session.file_mode_check,
    )
    .context("reading nonce")?;
    let key = material::read_material("key", &session.key, KEY_SIZE, session.file_mode_check)
        .context("reading key")?;
    let nonce = BaseNonce::from_slice(&nonce)?;
    let key = StreamKey::from_slice(&key)?;

    let input: Box<dyn Read> = match &session.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening input {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &session.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating output {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let output = BufWriter::new(output);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        direction = ?session.direction,
        chunk_size = session.chunk_size,
        "boxer starting"
    );

    let bytes = match session.direction {
        Direction::Encrypt => encrypt_stream(input, output, &nonce, &key, session.chunk_size)?,
        Direction::Decrypt => decrypt_stream(input, output, &nonce, &key)?,
    };
    info!(bytes, "done");
    Ok(())
}

/// Encrypt all of `input` into `output`; returns plaintext bytes consumed.
fn encrypt_stream<R: Read, W: Write>(
    mut input: R,
    output: W,
    nonce: &BaseNonce,
    key: &StreamKey,
    chunk_size: usize,
) -> Result<u64> {
    let mut enc = Encryptor::with_chunk_size(output, nonce, key, chunk_size)
        .context("creating encryptor")?;
    let bytes = std::io::copy(&mut input, &mut enc).context("encrypting")?;
    enc.finish().context("closing encrypted stream")?;
    Ok(bytes)
}

/// Decrypt `input` into `output`; returns plaintext bytes produced.
///
/// Plaintext is written as each frame authenticates. A failure part-way means
/// `output` holds an incomplete prefix and must be discarded.
fn decrypt_stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    nonce: &BaseNonce,
    key: &StreamKey,
) -> Result<u64> {
    let mut dec = Decryptor::new(input, nonce, key);
    let bytes = std::io::copy(&mut dec, &mut output).context("decrypting")?;
    output.flush().context("flushing output")?;
    dec.close()?;
    Ok(bytes)
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
