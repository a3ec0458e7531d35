//! VMM binary location and validation.
//!
//! Run only when no jailer is active; in jailer mode the sandboxing wrapper
//! owns process launch and validates its own exec file.

use crate::errors::{LifecycleError, Result};
use crate::vmm::DEFAULT_VMM_BINARY;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Mask selecting the execute permission bits.
const EXECUTABLE_MASK: u32 = 0o111;

/// Resolve the VMM binary and check it is actually runnable.
///
/// An explicit path is validated as-is; otherwise [`DEFAULT_VMM_BINARY`] is
/// looked up on `$PATH`. No process is launched when validation fails.
pub fn resolve_vmm_binary(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_in_path(DEFAULT_VMM_BINARY).ok_or(LifecycleError::BinaryNotFound {
            path: PathBuf::from(DEFAULT_VMM_BINARY),
        })?,
    };

    validate_vmm_binary(&path)?;
    Ok(path)
}

/// Check that `path` exists, is not a directory, and has at least one
/// execute permission bit set.
pub fn validate_vmm_binary(path: &Path) -> Result<()> {
    let info = match std::fs::metadata(path) {
        Ok(info) => info,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(LifecycleError::BinaryNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(err) => return Err(err.into()),
    };

    if info.is_dir() {
        return Err(LifecycleError::BinaryIsDirectory {
            path: path.to_path_buf(),
        }
        .into());
    }

    if info.permissions().mode() & EXECUTABLE_MASK == 0 {
        return Err(LifecycleError::BinaryNotExecutable {
            path: path.to_path_buf(),
        }
        .into());
    }

    Ok(())
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FireliteError;
    use std::fs::File;
    use tempfile::TempDir;

    fn set_mode(path: &Path, mode: u32) {
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(mode);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_validate_missing_binary() {
        let err = validate_vmm_binary(Path::new("/no/such/vmm")).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Lifecycle(LifecycleError::BinaryNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_directory() {
        let dir = TempDir::new().unwrap();
        let err = validate_vmm_binary(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Lifecycle(LifecycleError::BinaryIsDirectory { .. })
        ));
    }

    #[test]
    fn test_validate_not_executable() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("vmm");
        File::create(&binary).unwrap();
        set_mode(&binary, 0o644);

        let err = validate_vmm_binary(&binary).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Lifecycle(LifecycleError::BinaryNotExecutable { .. })
        ));
    }

    #[test]
    fn test_validate_executable() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("vmm");
        File::create(&binary).unwrap();
        set_mode(&binary, 0o755);

        assert!(validate_vmm_binary(&binary).is_ok());
    }

    #[test]
    fn test_any_single_execute_bit_counts() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("vmm");
        File::create(&binary).unwrap();
        set_mode(&binary, 0o601);

        assert!(validate_vmm_binary(&binary).is_ok());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("vmm");
        File::create(&binary).unwrap();
        set_mode(&binary, 0o755);

        let resolved = resolve_vmm_binary(Some(&binary)).unwrap();
        assert_eq!(resolved, binary);
    }

    #[test]
    fn test_resolve_explicit_missing_path() {
        let err = resolve_vmm_binary(Some(Path::new("/no/such/vmm"))).unwrap_err();
        assert!(matches!(
            err,
            FireliteError::Lifecycle(LifecycleError::BinaryNotFound { .. })
        ));
    }
}
