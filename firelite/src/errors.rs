//! Hierarchical error types for the firelite runtime.
//!
//! Errors are categorized by the stage that produced them:
//! - [`ConfigError`]: descriptor parsing and validation (user-fixable)
//! - [`ResourceError`]: transient host resource provisioning
//! - [`LifecycleError`]: VMM binary validation and process lifecycle
//!
//! No error is transient; every failure is terminal for the current run and
//! surfaced to the operator. Release failures during teardown are the sole
//! exception: those are logged and swallowed so the drain always completes.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FireliteError>;

// ============================================================================
// Top-Level Error
// ============================================================================

/// Errors that can occur while assembling or supervising a microVM.
#[derive(Debug, Error)]
pub enum FireliteError {
    /// Descriptor parsing or validation failed (user-fixable).
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Host resource provisioning failed.
    #[error("resource: {0}")]
    Resource(#[from] ResourceError),

    /// Binary validation or process lifecycle failed.
    #[error("lifecycle: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Generic IO error (catch-all).
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Config Errors (descriptor parsing)
// ============================================================================

/// Errors produced by the descriptor parsers and the metadata stage.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Drive descriptor does not end in `:ro` or `:rw`.
    #[error("invalid drive specification, must end with a :ro or :rw suffix")]
    DriveMissingSuffix,

    /// Drive descriptor is a bare suffix with no path in front of it.
    #[error("invalid drive specification, must have a path")]
    DriveMissingPath,

    /// Additional drive path does not exist on the host.
    #[error("drive path {path}: {source}")]
    DrivePathNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    /// NIC descriptor is not `DEVICE/MACADDR`.
    #[error("NIC descriptor was not of the form DEVICE/MACADDR")]
    MalformedNic,

    /// Vsock descriptor is not `PATH:CID`.
    #[error("vsock descriptor was not of the form PATH:CID")]
    MalformedVsock,

    /// Vsock CID is not a decimal unsigned 32-bit integer.
    #[error("unable to parse vsock CID as a 32-bit number")]
    InvalidVsockCid,

    /// Metadata payload is not valid JSON.
    #[error("invalid metadata, unable to parse as json: {0}")]
    InvalidMetadata(#[source] serde_json::Error),

    /// Metadata file could not be read.
    #[error("unable to read metadata file {path}: {source}")]
    MetadataFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// CPU template name is not one of the supported templates.
    #[error("unknown CPU template: '{0}'. Supported: C3, T2")]
    UnknownCpuTemplate(String),

    /// Log level name is not recognized.
    #[error("unknown log level: '{0}'. Supported: Error, Warning, Info, Debug")]
    UnknownLogLevel(String),
}

// ============================================================================
// Resource Errors (fifos, temp directories, socket path)
// ============================================================================

/// Errors during transient host resource provisioning.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A caller-supplied log fifo conflicts with a tee-to-file destination.
    #[error("a log fifo path and a log tee file cannot be used together")]
    ConflictingLogOptions,

    /// The tee destination file could not be opened.
    #[error("unable to create log tee file {path}: {source}")]
    LogTeeFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The fifo temp directory could not be created.
    #[error("failed to create temporary fifo directory: {0}")]
    TempDir(#[source] io::Error),

    /// Neither `$HOME` nor the system temp directory is usable for the
    /// control socket. There is no safe default location, so the run aborts.
    #[error("no usable directory for the VMM control socket (checked $HOME and the system temp directory)")]
    NoSocketDir,
}

// ============================================================================
// Lifecycle Errors (binary validation, process supervision)
// ============================================================================

/// Errors during VMM binary validation and process lifecycle transitions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The VMM binary does not exist (or was not found on `$PATH`).
    #[error("VMM binary {} does not exist", .path.display())]
    BinaryNotFound { path: PathBuf },

    /// The VMM binary path refers to a directory.
    #[error("VMM binary {} is a directory", .path.display())]
    BinaryIsDirectory { path: PathBuf },

    /// The VMM binary has no execute permission bit set.
    #[error("VMM binary {} is not executable, check its permission bits", .path.display())]
    BinaryNotExecutable { path: PathBuf },

    /// The VMM process could not be spawned.
    #[error("failed to spawn VMM process {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Start was requested while a VMM process is already attached.
    #[error("VMM process is already running")]
    AlreadyRunning,

    /// An operation that needs a running VMM process found none.
    #[error("VMM process is not running")]
    NotRunning,

    /// The supervisor's start operation failed.
    #[error("failed to start the VMM: {0}")]
    StartFailed(String),

    /// The supervisor's wait operation reported an error.
    #[error("VMM wait returned an error: {0}")]
    WaitFailed(String),

    /// The caller cancelled the run while waiting for the VMM.
    #[error("lifecycle cancelled while waiting for the VMM")]
    Cancelled,

    /// Internal state machine misuse.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
