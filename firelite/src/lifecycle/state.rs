//! VM run state machine.
//!
//! ```text
//! Created → Starting → Running → ShuttingDown → Stopped
//! ```
//!
//! A failed start goes straight from Starting to Stopped, and a VMM that
//! exits on its own skips ShuttingDown. ShuttingDown allows a self-loop so
//! repeated shutdown signals are each handled independently; the transition
//! is deliberately not serialized against a racing second request, matching
//! the behavior of the original supervisor.

use crate::errors::{LifecycleError, Result};

/// Lifecycle state of the supervised VMM process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// Configuration assembled, nothing launched yet.
    Created,
    /// Binary validated, start operation in flight.
    Starting,
    /// VMM process is up and the signal listener is armed.
    Running,
    /// A shutdown was requested and the run loop is waiting for exit.
    ShuttingDown,
    /// VMM process has exited.
    Stopped,
}

impl MachineState {
    /// Check if a transition to `target` is valid.
    pub fn can_transition_to(&self, target: MachineState) -> bool {
        use MachineState::*;
        matches!(
            (self, target),
            (Created, Starting)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, ShuttingDown)
                | (Running, Stopped)
                | (ShuttingDown, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    /// Validated transition; rejects anything outside the table above.
    pub fn transition_to(&mut self, target: MachineState) -> Result<()> {
        if !self.can_transition_to(target) {
            return Err(LifecycleError::InvalidTransition {
                from: self.as_str(),
                to: target.as_str(),
            }
            .into());
        }
        tracing::debug!(from = self.as_str(), to = target.as_str(), "state transition");
        *self = target;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(self, MachineState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, MachineState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Created => "created",
            MachineState::Starting => "starting",
            MachineState::Running => "running",
            MachineState::ShuttingDown => "shutting-down",
            MachineState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = MachineState::Created;
        state.transition_to(MachineState::Starting).unwrap();
        state.transition_to(MachineState::Running).unwrap();
        state.transition_to(MachineState::ShuttingDown).unwrap();
        state.transition_to(MachineState::Stopped).unwrap();
        assert!(state.is_stopped());
    }

    #[test]
    fn test_failed_start_goes_to_stopped() {
        let mut state = MachineState::Starting;
        state.transition_to(MachineState::Stopped).unwrap();
        assert!(state.is_stopped());
    }

    #[test]
    fn test_unsolicited_exit_skips_shutting_down() {
        assert!(MachineState::Running.can_transition_to(MachineState::Stopped));
    }

    #[test]
    fn test_repeated_shutdown_requests_are_allowed() {
        let mut state = MachineState::ShuttingDown;
        state.transition_to(MachineState::ShuttingDown).unwrap();
        assert_eq!(state, MachineState::ShuttingDown);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        assert!(!MachineState::Created.can_transition_to(MachineState::Running));
        assert!(!MachineState::Stopped.can_transition_to(MachineState::Running));
        assert!(!MachineState::ShuttingDown.can_transition_to(MachineState::Running));

        let mut state = MachineState::Created;
        let err = state.transition_to(MachineState::Stopped).unwrap_err();
        assert!(err.to_string().contains("invalid lifecycle transition"));
        assert_eq!(state, MachineState::Created);
    }

    #[test]
    fn test_display() {
        assert_eq!(MachineState::ShuttingDown.to_string(), "shutting-down");
        assert_eq!(MachineState::Running.to_string(), "running");
    }
}
