//! Network interface descriptor parsing.
//!
//! A NIC is declared as `<device>/<mac>`. No existence check is performed on
//! the device; tap devices are created by a separate network-setup step.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};

const NIC_SEPARATOR: char = '/';

/// A network interface attached to the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSpec {
    /// Host tap device name.
    pub host_dev_name: String,
    /// MAC address presented to the guest.
    pub guest_mac: String,
    /// Whether the guest may reach the metadata service over this interface.
    /// Derived from metadata presence, never user-specified.
    pub allow_metadata_service: bool,
}

/// Split a `DEVICE/MACADDR` descriptor into its two fields.
pub fn parse_nic_descriptor(entry: &str) -> Result<(String, String)> {
    let fields: Vec<&str> = entry.split(NIC_SEPARATOR).collect();
    if fields.len() != 2 || fields[0].is_empty() || fields[1].is_empty() {
        return Err(ConfigError::MalformedNic.into());
    }
    Ok((fields[0].to_string(), fields[1].to_string()))
}

/// Build one [`NicSpec`] per declared descriptor.
///
/// `metadata_present` is passed in by the assembler so this stage never
/// reaches into shared parsing state.
pub fn build_interfaces(entries: &[String], metadata_present: bool) -> Result<Vec<NicSpec>> {
    let mut interfaces = Vec::with_capacity(entries.len());
    for entry in entries {
        let (host_dev_name, guest_mac) = parse_nic_descriptor(entry)?;
        interfaces.push(NicSpec {
            host_dev_name,
            guest_mac,
            allow_metadata_service: metadata_present,
        });
    }
    Ok(interfaces)
}
