//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! Initializing ──StoredTokenFound──► Verifying ──VerifySucceeded──► Authenticated
//!      │                                 │                              │
//!      │ NoStoredToken                   │ VerifyFailed                 │ LogoutRequested
//!      ▼                                 ▼                              ▼
//! Unauthenticated ◄──────────────────────┴──────LogoutComplete────── LoggingOut
//!      │  ▲
//!      │  └── LoginFailed / RegisterFailed ──┐
//!      │                                      │
//!      ├── LoginAttempt ────► LoggingIn ──────┤──LoginSucceeded────► Authenticated
//!      └── RegisterAttempt ─► Registering ────┘──RegisterSucceeded─► Authenticated
//! ```
//!
//! Login and registration are only accepted from `Unauthenticated`; there is
//! no edge that reaches `Authenticated` without either a server-verified
//! token or a fresh credential exchange.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initializing)

    Initializing => {
        StoredTokenFound => Verifying,
        NoStoredToken => Unauthenticated
    },
    Verifying => {
        VerifySucceeded => Authenticated,
        VerifyFailed => Unauthenticated
    },
    Unauthenticated => {
        LoginAttempt => LoggingIn,
        RegisterAttempt => Registering
    },
    LoggingIn => {
        LoginSucceeded => Authenticated,
        LoginFailed => Unauthenticated
    },
    Registering => {
        RegisterSucceeded => Authenticated,
        RegisterFailed => Unauthenticated
    },
    Authenticated => {
        LogoutRequested => LoggingOut
    },
    LoggingOut => {
        LogoutComplete => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Constructed; startup verification has not run yet.
    Initializing,
    /// A stored token is being checked with the backend.
    Verifying,
    Authenticated,
    Unauthenticated,
    LoggingIn,
    Registering,
    LoggingOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// In-progress states that will settle without further input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::Initializing
                | SessionState::Verifying
                | SessionState::LoggingIn
                | SessionState::Registering
                | SessionState::LoggingOut
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initializing => SessionState::Initializing,
            SessionMachineState::Verifying => SessionState::Verifying,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::LoggingIn => SessionState::LoggingIn,
            SessionMachineState::Registering => SessionState::Registering,
            SessionMachineState::LoggingOut => SessionState::LoggingOut,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Initializing => "initializing",
            SessionState::Verifying => "verifying",
            SessionState::Authenticated => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::LoggingIn => "logging_in",
            SessionState::Registering => "registering",
            SessionState::LoggingOut => "logging_out",
        };
        f.write_str(name)
    }
}
