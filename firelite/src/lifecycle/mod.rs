//! VM lifecycle orchestration.
//!
//! Drives the supervised VMM through `Created → Starting → Running →
//! ShuttingDown → Stopped` in response to the process exiting, host signals,
//! or caller cancellation. The signal listener is the only concurrent
//! activity: it sends [`ShutdownIntent`] messages over a channel and the run
//! loop, sole owner of the supervisor handle, performs every transition.

pub mod signals;
pub mod state;

pub use signals::ShutdownIntent;
pub use state::MachineState;

use crate::config::{MachineConfig, VmOptions};
use crate::errors::{FireliteError, LifecycleError, Result};
use crate::resources::ReleaseStack;
use crate::vmm::{ProcessSupervisor, Supervisor, resolve_vmm_binary};
use signals::SignalListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Assemble the configuration, launch the VMM, and supervise it to exit.
///
/// This is the operator entry point. Whatever happens (assembly failure,
/// start failure, signal-driven shutdown, cancellation), every release
/// registered during provisioning is drained exactly once before returning.
/// Cancelling `cancel` interrupts the wait but never skips teardown.
pub async fn launch(options: &VmOptions, cancel: CancellationToken) -> Result<()> {
    let mut releases = ReleaseStack::new();
    let outcome = launch_inner(options, &cancel, &mut releases).await;
    releases.release_all();
    outcome
}

async fn launch_inner(
    options: &VmOptions,
    cancel: &CancellationToken,
    releases: &mut ReleaseStack,
) -> Result<()> {
    let config = options.assemble(releases)?;

    let supervisor = match &config.jailer {
        // The wrapper owns process launch; it validates its own exec file.
        Some(jailer) => ProcessSupervisor::jailed(jailer.clone()),
        None => {
            let binary = resolve_vmm_binary(options.vmm_binary.as_deref())?;
            ProcessSupervisor::new(binary)
        }
    };

    Orchestrator::new(supervisor).run(&config, cancel).await
}

enum RunEvent {
    Exited(Result<()>),
    Intent(ShutdownIntent),
    Cancelled,
}

/// Owns the supervisor handle and the state machine for one VM run.
pub struct Orchestrator<S> {
    supervisor: S,
    state: MachineState,
}

impl<S: Supervisor> Orchestrator<S> {
    pub fn new(supervisor: S) -> Self {
        Self {
            supervisor,
            state: MachineState::Created,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Start the VMM and supervise it until exit, reacting to host signals.
    pub async fn run(&mut self, config: &MachineConfig, cancel: &CancellationToken) -> Result<()> {
        let listener = SignalListener::register()?;
        let (tx, rx) = mpsc::channel(4);
        let listener_task = tokio::spawn(listener.run(tx));

        let outcome = self.run_with_intents(config, rx, cancel).await;
        listener_task.abort();
        outcome
    }

    /// Run loop with an injected intent source, so shutdown decisions are
    /// testable without delivering real signals.
    async fn run_with_intents(
        &mut self,
        config: &MachineConfig,
        mut intents: mpsc::Receiver<ShutdownIntent>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.state.transition_to(MachineState::Starting)?;

        if let Err(err) = self.supervisor.start(config).await {
            self.state.transition_to(MachineState::Stopped)?;
            return Err(LifecycleError::StartFailed(err.to_string()).into());
        }
        self.state.transition_to(MachineState::Running)?;
        tracing::info!(socket = ?config.socket_path, "VMM is running");

        // Fire-and-forget: the metadata service carries on without explicit
        // confirmation at this layer.
        if let Some(metadata) = &config.metadata {
            if let Err(error) = self.supervisor.inject_metadata(metadata).await {
                tracing::warn!(%error, "failed to push metadata to the running VM");
            }
        }

        loop {
            let event = tokio::select! {
                outcome = self.supervisor.wait() => RunEvent::Exited(outcome),
                Some(intent) = intents.recv() => RunEvent::Intent(intent),
                _ = cancel.cancelled() => RunEvent::Cancelled,
            };

            match event {
                RunEvent::Exited(outcome) => {
                    self.state.transition_to(MachineState::Stopped)?;
                    return match outcome {
                        Ok(()) => {
                            tracing::info!("VMM exited cleanly");
                            Ok(())
                        }
                        Err(err @ FireliteError::Lifecycle(_)) => Err(err),
                        Err(err) => Err(LifecycleError::WaitFailed(err.to_string()).into()),
                    };
                }
                RunEvent::Intent(ShutdownIntent::Graceful) => {
                    self.state.transition_to(MachineState::ShuttingDown)?;
                    if let Err(error) = self.supervisor.request_graceful_shutdown().await {
                        tracing::warn!(%error, "graceful shutdown request failed");
                    }
                }
                RunEvent::Intent(ShutdownIntent::Forced) => {
                    self.state.transition_to(MachineState::ShuttingDown)?;
                    if let Err(error) = self.supervisor.force_stop().await {
                        tracing::warn!(%error, "forced stop failed");
                    }
                }
                RunEvent::Cancelled => {
                    tracing::info!("run cancelled, abandoning the wait");
                    return Err(LifecycleError::Cancelled.into());
                }
            }
        }
    }
}
