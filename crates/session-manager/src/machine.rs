//! Session phase machine using rust-fsm.
//!
//! Data changes go through the reducer in `state`; this machine only decides
//! whether a transition is legal from the current phase.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Empty      │ (initial)
//! └────────┬────────┘
//!          │ Activated                 ActivationFailed / Failed
//!          ▼                          ┌─────────────────────────┐
//! ┌─────────────────┐     Failed      ▼                         │
//! │     Active      │ ──────────► ┌─────────────────┐           │
//! │                 │ ◄────────── │     Errored     │ ◄─────────┘
//! └────────┬────────┘  Recovered  └────────┬────────┘
//!          │ Released                      │ Released
//!          ▼                               ▼
//!        Empty                           Empty
//! ```
//!
//! Every phase also accepts Activated (→ Active) and ActivationFailed
//! (→ Errored).
//!
//! Activation in flight is not a phase: it runs over whichever phase is
//! current and commits (or is discarded) in one step.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Empty)

    Empty => {
        Activated => Active,
        ActivationFailed => Errored,
        Failed => Errored,
        Released => Empty
    },
    Active => {
        Activated => Active,
        ActivationFailed => Errored,
        Updated => Active,
        Failed => Errored,
        Released => Empty
    },
    Errored => {
        Activated => Active,
        ActivationFailed => Errored,
        // get_provider may still switch chains while errored
        Updated => Errored,
        Recovered => Active,
        Failed => Errored,
        Released => Empty
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Externally visible session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No connector attached.
    Empty,
    /// Connector attached with a resolved account and no error.
    Active,
    /// Last operation failed; the connector, if any, stays attached.
    Errored,
}

impl SessionPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Empty => SessionPhase::Empty,
            SessionMachineState::Active => SessionPhase::Active,
            SessionMachineState::Errored => SessionPhase::Errored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_empty() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Empty);
    }

    #[test]
    fn test_activation_and_release() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::Activated).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Active);

        machine.consume(&SessionMachineInput::Updated).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Active);

        machine.consume(&SessionMachineInput::Released).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Empty);
    }

    #[test]
    fn test_error_and_recovery() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::Activated).unwrap();
        machine.consume(&SessionMachineInput::Failed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Errored);

        machine.consume(&SessionMachineInput::Updated).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Errored);

        machine.consume(&SessionMachineInput::Recovered).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Active);
    }

    #[test]
    fn test_failed_activation_from_empty() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::ActivationFailed)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Errored);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::Updated).is_err());
        assert!(machine.consume(&SessionMachineInput::Recovered).is_err());

        machine.consume(&SessionMachineInput::Activated).unwrap();
        assert!(machine.consume(&SessionMachineInput::Recovered).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Active);
    }

    #[test]
    fn test_phase_from_machine_state() {
        assert_eq!(
            SessionPhase::from(&SessionMachineState::Errored),
            SessionPhase::Errored
        );
        assert!(SessionPhase::Active.is_active());
        assert!(!SessionPhase::Empty.is_active());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SessionPhase::Errored).unwrap();
        assert_eq!(json, "\"errored\"");
    }
}
