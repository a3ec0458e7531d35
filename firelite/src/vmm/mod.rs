//! Supervisor-facing interface for the VMM process.
//!
//! The VMM itself (the component that speaks the control-socket protocol and
//! boots the guest) is an external collaborator; this module defines the
//! operations the lifecycle orchestrator needs from it and the
//! child-process-backed implementation the command-line front end uses.

pub mod binary;
pub mod process;

pub use binary::resolve_vmm_binary;
pub use process::ProcessSupervisor;

use crate::config::MachineConfig;
use crate::errors::Result;
use async_trait::async_trait;

/// Binary name looked up on `$PATH` when no explicit path is supplied.
pub const DEFAULT_VMM_BINARY: &str = "firecracker";

/// Operations the lifecycle orchestrator consumes from the VMM collaborator.
#[async_trait]
pub trait Supervisor: Send {
    /// Launch the VMM with the assembled configuration.
    async fn start(&mut self, config: &MachineConfig) -> Result<()>;

    /// Block until the VMM process exits; an error outcome is reported but
    /// never prevents the caller's teardown from running.
    async fn wait(&mut self) -> Result<()>;

    /// Ask the VMM to shut the guest down cleanly.
    async fn request_graceful_shutdown(&mut self) -> Result<()>;

    /// Terminate the VMM immediately, bypassing the graceful path.
    async fn force_stop(&mut self) -> Result<()>;

    /// Push the metadata payload to the running VM. Fire-and-forget at the
    /// orchestration layer: no confirmation is required.
    async fn inject_metadata(&mut self, metadata: &serde_json::Value) -> Result<()>;
}
