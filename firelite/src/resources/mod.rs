//! Transient host resource provisioning and guaranteed cleanup.
//!
//! Every transient resource created while assembling a configuration (the
//! fifo temp directory, the open log tee file) is paired with exactly one
//! typed [`Release`] record on a [`ReleaseStack`]. The stack is drained in
//! registration order exactly once, regardless of which code path triggers
//! teardown: success, a validation failure partway through assembly, or a
//! signal-driven shutdown. Individual release failures are logged and never
//! interrupt the drain.

pub mod fifo;
pub mod socket;

pub use fifo::{FifoChannels, FifoRequest};

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

/// A typed cleanup action for one provisioned resource.
#[derive(Debug)]
pub enum Release {
    /// Recursively remove a directory created during provisioning.
    RemoveDirectory(PathBuf),
    /// Flush and close an open file handle.
    CloseFile { path: PathBuf, file: Arc<File> },
}

impl Release {
    fn release(self) {
        match self {
            Release::RemoveDirectory(path) => {
                if let Err(error) = std::fs::remove_dir_all(&path) {
                    tracing::warn!(path = %path.display(), %error, "failed to remove temporary directory");
                } else {
                    tracing::debug!(path = %path.display(), "removed temporary directory");
                }
            }
            Release::CloseFile { path, file } => {
                if let Err(error) = file.sync_all() {
                    tracing::warn!(path = %path.display(), %error, "failed to flush file before close");
                }
                // The handle closes when the last clone of the Arc is gone.
                drop(file);
                tracing::debug!(path = %path.display(), "released file handle");
            }
        }
    }
}

/// Ordered set of release actions accumulated during provisioning.
///
/// Draining happens in registration order via [`ReleaseStack::release_all`];
/// a `Drop` backstop covers early-return paths so no registered record is
/// ever leaked.
#[derive(Debug, Default)]
pub struct ReleaseStack {
    pending: Vec<Release>,
}

impl ReleaseStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleanup action. Every provisioned resource gets exactly one.
    pub fn push(&mut self, release: Release) {
        self.pending.push(release);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every registered release action once, in registration order.
    pub fn release_all(&mut self) {
        for release in self.pending.drain(..) {
            release.release();
        }
    }
}

impl Drop for ReleaseStack {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(
                count = self.pending.len(),
                "draining release stack on drop"
            );
            self.release_all();
        }
    }
}
