//! Host signal listening.
//!
//! Three signals map to two shutdown intents: SIGINT and SIGTERM request a
//! graceful shutdown, SIGQUIT an immediate forced one. The listener loops
//! for the lifetime of the run and sends one intent per delivery over an
//! mpsc channel; the run loop, sole owner of the supervisor handle, performs
//! the actual transition. Only one signal is acted upon per delivery.

use std::io;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc;

/// What the operator asked for via a host signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownIntent {
    /// Clean guest shutdown, then wait for process exit.
    Graceful,
    /// Immediate process termination, bypassing the graceful path.
    Forced,
}

/// Registered signal streams for the three shutdown signals.
pub struct SignalListener {
    interrupt: Signal,
    terminate: Signal,
    quit: Signal,
}

impl SignalListener {
    /// Register the signal handlers. Registration happens before the
    /// listener task is spawned so a failure surfaces to the caller.
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Forward each delivered signal as a [`ShutdownIntent`] until the
    /// receiving side goes away.
    pub async fn run(mut self, tx: mpsc::Sender<ShutdownIntent>) {
        loop {
            let (intent, name) = tokio::select! {
                _ = self.interrupt.recv() => (ShutdownIntent::Graceful, "SIGINT"),
                _ = self.terminate.recv() => (ShutdownIntent::Graceful, "SIGTERM"),
                _ = self.quit.recv() => (ShutdownIntent::Forced, "SIGQUIT"),
            };

            match intent {
                ShutdownIntent::Graceful => {
                    tracing::info!(signal = name, "caught signal, requesting clean shutdown");
                }
                ShutdownIntent::Forced => {
                    tracing::info!(signal = name, "caught signal, forcing shutdown");
                }
            }

            if tx.send(intent).await.is_err() {
                // Run loop is gone; nothing left to notify.
                return;
            }
        }
    }
}
