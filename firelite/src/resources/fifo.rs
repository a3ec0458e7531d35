//! Log and metric fifo provisioning.
//!
//! Decides whether fifo paths for log and/or metric output need to be
//! synthesized and whether a tee-to-file destination must be opened, then
//! performs that provisioning with cleanup registered on the release stack.
//! The fifos themselves are created by the VMM; this module only owns the
//! paths and the tee file handle.

use crate::errors::{ResourceError, Result};
use crate::resources::{Release, ReleaseStack};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed filename of a generated log fifo.
pub const LOG_FIFO_NAME: &str = "log.fifo";
/// Fixed filename of a generated metrics fifo.
pub const METRICS_FIFO_NAME: &str = "metrics.fifo";

const FIFO_DIR_PREFIX: &str = "firelite-fifo";

/// Caller-supplied fifo options, all optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoRequest<'a> {
    /// Explicit log fifo path.
    pub log_fifo: Option<&'a Path>,
    /// Explicit metrics fifo path.
    pub metrics_fifo: Option<&'a Path>,
    /// Tee the log fifo contents into this regular file.
    pub tee_file: Option<&'a Path>,
}

/// Provisioned fifo paths plus the open tee handle, if one was requested.
#[derive(Debug, Default)]
pub struct FifoChannels {
    pub log_fifo: Option<PathBuf>,
    pub metrics_fifo: Option<PathBuf>,
    pub tee_writer: Option<Arc<File>>,
}

/// Resolve the fifo paths for a configuration.
///
/// A tee-to-file destination implies the system must own fifo creation, so
/// combining it with an explicit log fifo path is an error. When any path
/// needs generating, exactly one fresh temp directory is created (never more
/// than one, even if both paths are missing) and its recursive removal is
/// registered on `releases`.
pub fn provision(request: FifoRequest<'_>, releases: &mut ReleaseStack) -> Result<FifoChannels> {
    let mut generate_log = false;
    let mut generate_metrics = false;
    let mut tee_writer = None;

    let mut log_fifo = request.log_fifo.map(Path::to_path_buf);
    let mut metrics_fifo = request.metrics_fifo.map(Path::to_path_buf);

    if let Some(tee_path) = request.tee_file {
        if log_fifo.is_some() {
            return Err(ResourceError::ConflictingLogOptions.into());
        }
        generate_log = true;
        if metrics_fifo.is_none() {
            generate_metrics = true;
        }

        let file = open_tee_file(tee_path)?;
        let file = Arc::new(file);
        releases.push(Release::CloseFile {
            path: tee_path.to_path_buf(),
            file: Arc::clone(&file),
        });
        tee_writer = Some(file);
    } else if log_fifo.is_some() || metrics_fifo.is_some() {
        generate_log = log_fifo.is_none();
        generate_metrics = metrics_fifo.is_none();
    }

    if generate_log || generate_metrics {
        // One directory serves both generated paths.
        let dir = tempfile::Builder::new()
            .prefix(FIFO_DIR_PREFIX)
            .tempdir()
            .map_err(ResourceError::TempDir)?
            .keep();
        releases.push(Release::RemoveDirectory(dir.clone()));

        if generate_log {
            log_fifo = Some(dir.join(LOG_FIFO_NAME));
        }
        if generate_metrics {
            metrics_fifo = Some(dir.join(METRICS_FIFO_NAME));
        }
    }

    Ok(FifoChannels {
        log_fifo,
        metrics_fifo,
        tee_writer,
    })
}

fn open_tee_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| {
            ResourceError::LogTeeFile {
                path: path.display().to_string(),
                source,
            }
            .into()
        })
}
