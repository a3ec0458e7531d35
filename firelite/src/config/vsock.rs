//! Vsock descriptor parsing.
//!
//! A vsock device is declared as `<path>:<cid>` where the context id is a
//! decimal unsigned 32-bit integer. The list parses atomically: the first
//! failing entry discards everything parsed before it.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VSOCK_SEPARATOR: char = ':';

/// A vsock device attached to the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VsockSpec {
    /// Host-side unix socket path backing the device.
    pub path: PathBuf,
    /// Guest context id.
    pub cid: u32,
}

/// Parse a list of `PATH:CID` descriptors, all-or-nothing.
pub fn parse_vsock_descriptors(entries: &[String]) -> Result<Vec<VsockSpec>> {
    let mut devices = Vec::with_capacity(entries.len());

    for entry in entries {
        let fields: Vec<&str> = entry.split(VSOCK_SEPARATOR).collect();
        if fields.len() != 2 || fields[0].is_empty() || fields[1].is_empty() {
            return Err(ConfigError::MalformedVsock.into());
        }

        let cid: u32 = fields[1].parse().map_err(|_| ConfigError::InvalidVsockCid)?;

        devices.push(VsockSpec {
            path: PathBuf::from(fields[0]),
            cid,
        });
    }

    Ok(devices)
}
