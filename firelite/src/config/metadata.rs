//! Metadata-service payload resolution.
//!
//! The payload may be supplied inline or via a file path; the inline value
//! takes precedence when both are given. A configuration with no metadata
//! source leaves the payload unset, which is distinct from an explicit empty
//! object.

use crate::errors::{ConfigError, Result};
use std::path::Path;

/// Resolve and parse the metadata payload, if any source was supplied.
pub fn resolve(inline: Option<&str>, file: Option<&Path>) -> Result<Option<serde_json::Value>> {
    let raw = match (inline, file) {
        (Some(raw), _) => raw.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|source| ConfigError::MetadataFile {
                path: path.display().to_string(),
                source,
            })?
        }
        (None, None) => return Ok(None),
    };

    let value = serde_json::from_str(&raw).map_err(ConfigError::InvalidMetadata)?;
    Ok(Some(value))
}
