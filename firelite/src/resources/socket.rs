//! Control socket path generation.
//!
//! Used only when the caller supplied no explicit socket path and no jailer
//! is active. The filename combines a fixed prefix, the current process id,
//! and a small random integer; the random component reduces collision
//! probability across concurrent runs inside the same pid-reuse window and
//! is not a security control.

use crate::errors::{ResourceError, Result};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Recognizable prefix of every generated socket filename.
pub const SOCKET_FILE_PREFIX: &str = ".firelite.sock";

const SOCKET_RANDOM_RANGE: u32 = 1000;

/// Generate a unique socket path in the first usable base directory.
///
/// Candidate directories are `$HOME` then the system temp directory; usable
/// means non-empty and an existing directory. When neither qualifies there
/// is no safe default location and the run aborts with
/// [`ResourceError::NoSocketDir`] rather than silently picking one.
pub fn generate_socket_path() -> Result<PathBuf> {
    let filename = [
        SOCKET_FILE_PREFIX.to_string(),
        std::process::id().to_string(),
        rand::rng().random_range(0..SOCKET_RANDOM_RANGE).to_string(),
    ]
    .join("-");

    let dir = socket_base_dir().ok_or(ResourceError::NoSocketDir)?;
    Ok(dir.join(filename))
}

fn socket_base_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        if exists_and_dir(&home) {
            return Some(home);
        }
    }

    let tmp = std::env::temp_dir();
    if exists_and_dir(&tmp) {
        return Some(tmp);
    }

    None
}

fn exists_and_dir(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_dir()
}
