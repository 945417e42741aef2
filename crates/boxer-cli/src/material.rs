//! Key and nonce acquisition: read raw bytes from a file, or prompt on the
//! terminal with echo disabled.
//!
//! `rpassword` hands back a `String`, so prompted material is limited to
//! valid UTF-8. Arbitrary binary keys have to come from a file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use boxer_core::{BoxerError, BoxerResult, MaterialSource};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Read exactly `len` bytes of key material from `source`.
pub fn read_material(
    what: &str,
    source: &MaterialSource,
    len: usize,
    file_mode_check: bool,
) -> BoxerResult<Zeroizing<Vec<u8>>> {
    match source {
        MaterialSource::File(path) => {
            if file_mode_check {
                check_file_mode(what, path);
            }
            read_from_file(path, len)
        }
        MaterialSource::Prompt => {
            let prompt = format!("Input {what}:\n");
            let entered = SecretString::from(rpassword::prompt_password(prompt)?);
            let bytes = entered.expose_secret().as_bytes();
            require_length(bytes, len)?;
            Ok(Zeroizing::new(bytes.to_vec()))
        }
    }
}

/// Read the first `len` bytes of `path`. Anything after them is ignored.
fn read_from_file(path: &Path, len: usize) -> BoxerResult<Zeroizing<Vec<u8>>> {
    let file = File::open(path)?;
    let mut buf = Zeroizing::new(Vec::with_capacity(len));
    file.take(len as u64).read_to_end(&mut buf)?;
    require_length(&buf, len)?;
    debug!(path = %path.display(), len, "read material from file");
    Ok(buf)
}

fn require_length(bytes: &[u8], len: usize) -> BoxerResult<()> {
    if bytes.len() != len {
        return Err(BoxerError::InputLengthMismatch {
            expected: len,
            actual: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn check_file_mode(what: &str, path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        if exposed_mode(meta.permissions().mode()) {
            warn!(
                path = %path.display(),
                "{what} file is readable by group or other; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_mode(_what: &str, _path: &Path) {}

fn exposed_mode(mode: u32) -> bool {
    mode & 0o077 != 0
}
