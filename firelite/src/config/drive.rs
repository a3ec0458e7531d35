//! Block-device descriptor parsing.
//!
//! Additional drives are declared as `<path>:ro` or `<path>:rw`. The path of
//! an additional drive must exist on the host at parse time; the root drive
//! path is not checked here (the VMM validates it when the guest boots).

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Drive id reserved for the root device.
pub const ROOT_DRIVE_ID: &str = "1";

const READ_WRITE_SUFFIX: &str = ":rw";
const READ_ONLY_SUFFIX: &str = ":ro";

/// A block device attached to the guest.
///
/// Field names follow the VMM API drive model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSpec {
    /// Drive id as the VMM expects it. `"1"` is reserved for the root device;
    /// additional drives are numbered `"2"` upward in declaration order.
    pub drive_id: String,
    pub path_on_host: PathBuf,
    pub is_read_only: bool,
    pub is_root_device: bool,
    /// Root partition UUID, only ever set on the root drive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partuuid: Option<String>,
}

/// Parse the additional-drives descriptor list.
///
/// The Nth entry (0-indexed) receives drive id `N + 2`; id 1 is reserved for
/// the root drive. The first failing entry aborts the whole list.
pub fn parse_drive_list(entries: &[String]) -> Result<Vec<DriveSpec>> {
    let mut drives = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let (path, read_only) = if let Some(path) = entry.strip_suffix(READ_WRITE_SUFFIX) {
            (path, false)
        } else if let Some(path) = entry.strip_suffix(READ_ONLY_SUFFIX) {
            (path, true)
        } else {
            return Err(ConfigError::DriveMissingSuffix.into());
        };

        if path.is_empty() {
            return Err(ConfigError::DriveMissingPath.into());
        }

        std::fs::metadata(path).map_err(|source| ConfigError::DrivePathNotFound {
            path: path.to_string(),
            source,
        })?;

        drives.push(DriveSpec {
            drive_id: (i + 2).to_string(),
            path_on_host: PathBuf::from(path),
            is_read_only: read_only,
            is_root_device: false,
            partuuid: None,
        });
    }

    Ok(drives)
}

/// Build the full drive list: parsed additional drives followed by the root
/// drive. The root drive is appended last but always carries id `"1"`.
pub fn build_drives(
    additional: &[String],
    root_path: &Path,
    root_partuuid: Option<&str>,
) -> Result<Vec<DriveSpec>> {
    let mut drives = parse_drive_list(additional)?;

    drives.push(DriveSpec {
        drive_id: ROOT_DRIVE_ID.to_string(),
        path_on_host: root_path.to_path_buf(),
        is_read_only: false,
        is_root_device: true,
        partuuid: root_partuuid.map(str::to_string),
    });

    Ok(drives)
}
