//! Per-attempt authentication state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────┐ Begin  ┌───────────┐ CredentialIndirect ┌────────────┐
//! │   Idle   │ ─────► │ Acquiring │ ─────────────────► │ Exchanging │
//! └──────────┘        └─────┬─────┘                    └─────┬──────┘
//!                           │ CredentialDirect               │ TokenIssued
//!                           ▼                                ▼
//!                     ┌───────────┐ ◄────────────────────────┘
//!                     │ SigningIn │
//!                     └─────┬─────┘
//!                           │ SignedIn
//!                           ▼
//!                       Succeeded
//!
//! Fail from Acquiring, Exchanging or SigningIn → Failed
//! ```
//!
//! Succeeded and Failed are terminal. No attempt returns to Idle.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub attempt_machine(Idle)

    Idle => {
        Begin => Acquiring
    },
    Acquiring => {
        // Apple, Google: straight to the backend
        CredentialDirect => SigningIn,
        // Kakao, Naver: through the token exchange
        CredentialIndirect => Exchanging,
        Fail => Failed
    },
    Exchanging => {
        TokenIssued => SigningIn,
        Fail => Failed
    },
    SigningIn => {
        SignedIn => Succeeded,
        Fail => Failed
    }
}

pub use attempt_machine::Input as AttemptMachineInput;
pub use attempt_machine::State as AttemptMachineState;
pub use attempt_machine::StateMachine as AttemptMachine;

/// Phase of one authentication attempt, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    Idle,
    Acquiring,
    Exchanging,
    SigningIn,
    Succeeded,
    Failed,
}

impl AttemptPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptPhase::Succeeded | AttemptPhase::Failed)
    }
}

impl From<&AttemptMachineState> for AttemptPhase {
    fn from(state: &AttemptMachineState) -> Self {
        match state {
            AttemptMachineState::Idle => AttemptPhase::Idle,
            AttemptMachineState::Acquiring => AttemptPhase::Acquiring,
            AttemptMachineState::Exchanging => AttemptPhase::Exchanging,
            AttemptMachineState::SigningIn => AttemptPhase::SigningIn,
            AttemptMachineState::Succeeded => AttemptPhase::Succeeded,
            AttemptMachineState::Failed => AttemptPhase::Failed,
        }
    }
}
