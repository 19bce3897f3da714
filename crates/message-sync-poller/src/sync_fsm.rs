//! Fetch state machine. The `Idle/Failed -> Fetching` edge doubles as the
//! re-entrancy guard: a second `FetchStarted` while fetching is rejected.

use rust_fsm::*;
use serde::Serialize;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub sync_machine(Idle)

    Idle => {
        FetchStarted => Fetching
    },
    Fetching => {
        FetchSucceeded => Idle,
        FetchFailed => Failed,
        // Result discarded (unmounted) or the fetch future was dropped
        FetchAbandoned => Idle
    },
    Failed => {
        FetchStarted => Fetching
    }
}

pub use sync_machine::Input as SyncMachineInput;
pub use sync_machine::State as SyncMachineState;
pub use sync_machine::StateMachine as SyncMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Fetching,
    /// Last fetch failed; the cache still holds the previous result.
    Failed,
}

impl From<&SyncMachineState> for SyncState {
    fn from(state: &SyncMachineState) -> Self {
        match state {
            SyncMachineState::Idle => SyncState::Idle,
            SyncMachineState::Fetching => SyncState::Fetching,
            SyncMachineState::Failed => SyncState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_cycle() {
        let mut machine = SyncMachine::new();
        machine.consume(&SyncMachineInput::FetchStarted).unwrap();
        assert_eq!(*machine.state(), SyncMachineState::Fetching);
        machine.consume(&SyncMachineInput::FetchSucceeded).unwrap();
        assert_eq!(*machine.state(), SyncMachineState::Idle);
    }

    #[test]
    fn test_second_fetch_rejected_while_fetching() {
        let mut machine = SyncMachine::new();
        machine.consume(&SyncMachineInput::FetchStarted).unwrap();
        assert!(machine.consume(&SyncMachineInput::FetchStarted).is_err());
        assert_eq!(*machine.state(), SyncMachineState::Fetching);
    }

    #[test]
    fn test_failed_can_retry() {
        let mut machine = SyncMachine::new();
        machine.consume(&SyncMachineInput::FetchStarted).unwrap();
        machine.consume(&SyncMachineInput::FetchFailed).unwrap();
        assert_eq!(SyncState::from(machine.state()), SyncState::Failed);
        machine.consume(&SyncMachineInput::FetchStarted).unwrap();
        assert_eq!(*machine.state(), SyncMachineState::Fetching);
    }

    #[test]
    fn test_abandon_returns_to_idle() {
        let mut machine = SyncMachine::new();
        machine.consume(&SyncMachineInput::FetchStarted).unwrap();
        machine.consume(&SyncMachineInput::FetchAbandoned).unwrap();
        assert_eq!(*machine.state(), SyncMachineState::Idle);
    }

    #[test]
    fn test_results_only_while_fetching() {
        let mut machine = SyncMachine::new();
        assert!(machine.consume(&SyncMachineInput::FetchSucceeded).is_err());
        assert!(machine.consume(&SyncMachineInput::FetchFailed).is_err());
    }
}
