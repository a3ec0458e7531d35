//! Child-process-backed VMM supervisor.
//!
//! Spawns the VMM binary (directly, or through the sandboxing wrapper when
//! jailer options are present) with the operator's terminal attached, and
//! implements the [`Supervisor`] operations in terms of the child process.
//! Protocol-level guest control over the API socket belongs to the dedicated
//! control-socket client, not here.

use crate::config::MachineConfig;
use crate::errors::{LifecycleError, Result};
use crate::jailer::JailerOptions;
use crate::vmm::Supervisor;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

enum LaunchMode {
    /// Exec the VMM binary directly.
    Direct { binary: PathBuf },
    /// Launch through the sandboxing wrapper, which owns the final command.
    Jailed { jailer: JailerOptions },
}

/// A [`Supervisor`] that owns the VMM child process.
pub struct ProcessSupervisor {
    launch: LaunchMode,
    child: Option<Child>,
}

impl ProcessSupervisor {
    /// Supervise a directly-launched VMM binary. The caller is expected to
    /// have validated the binary via [`crate::vmm::resolve_vmm_binary`].
    pub fn new(binary: PathBuf) -> Self {
        Self {
            launch: LaunchMode::Direct { binary },
            child: None,
        }
    }

    /// Supervise a VMM launched through the sandboxing wrapper.
    pub fn jailed(jailer: JailerOptions) -> Self {
        Self {
            launch: LaunchMode::Jailed { jailer },
            child: None,
        }
    }

    /// Pid of the VMM process, if it is running.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    fn build_command(&self, config: &MachineConfig) -> Command {
        let mut cmd = match &self.launch {
            LaunchMode::Direct { binary } => Command::new(binary),
            LaunchMode::Jailed { jailer } => jailer.command(),
        };

        if let Some(socket) = &config.socket_path {
            cmd.arg("--api-sock").arg(socket);
        }

        // The VMM shares the operator's terminal; its own log output goes
        // through the fifos configured over the API.
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        cmd
    }

    fn launched_binary(&self) -> &PathBuf {
        match &self.launch {
            LaunchMode::Direct { binary } => binary,
            LaunchMode::Jailed { jailer } => &jailer.jailer_binary,
        }
    }

    fn signal(&self, signum: i32) -> Result<()> {
        let pid = self.pid().ok_or(LifecycleError::NotRunning)?;
        // Safety: plain kill(2) on a pid we own.
        if unsafe { libc::kill(pid as i32, signum) } == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error().into())
        }
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn start(&mut self, config: &MachineConfig) -> Result<()> {
        if self.child.is_some() {
            return Err(LifecycleError::AlreadyRunning.into());
        }

        let mut cmd = self.build_command(config);
        let child = cmd.spawn().map_err(|source| LifecycleError::Spawn {
            binary: self.launched_binary().clone(),
            source,
        })?;

        tracing::info!(
            pid = child.id(),
            binary = %self.launched_binary().display(),
            socket = ?config.socket_path,
            "VMM process spawned"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn wait(&mut self) -> Result<()> {
        let child = self.child.as_mut().ok_or(LifecycleError::NotRunning)?;
        let status = child
            .wait()
            .await
            .map_err(|err| LifecycleError::WaitFailed(err.to_string()))?;

        tracing::debug!(%status, "VMM process exited");
        if status.success() {
            Ok(())
        } else {
            Err(LifecycleError::WaitFailed(format!("VMM exited with {status}")).into())
        }
    }

    async fn request_graceful_shutdown(&mut self) -> Result<()> {
        // The VMM translates SIGTERM into a clean guest stop; protocol-level
        // shutdown (e.g. injecting a power button event) is the API client's
        // concern.
        tracing::info!(pid = ?self.pid(), "requesting clean VMM shutdown");
        self.signal(libc::SIGTERM)
    }

    async fn force_stop(&mut self) -> Result<()> {
        tracing::info!(pid = ?self.pid(), "forcing VMM shutdown");
        let child = self.child.as_mut().ok_or(LifecycleError::NotRunning)?;
        child.start_kill().map_err(Into::into)
    }

    async fn inject_metadata(&mut self, metadata: &serde_json::Value) -> Result<()> {
        // Delivery over the control socket is owned by the API client layer;
        // the process supervisor only records the intent.
        tracing::debug!(
            bytes = metadata.to_string().len(),
            "metadata payload ready for the in-guest metadata service"
        );
        Ok(())
    }
}
