//! Dialogue step machine — tracks which input is expected next.

use serde::{Deserialize, Serialize};

/// The input expected from a user's next free-text message.
///
/// Search turn: `Idle → AwaitingKeyword → Idle`. Application flow:
/// `Idle → AwaitingUsername (skipped when a handle is already known) →
/// AwaitingFullName → AwaitingPhone → AwaitingProgram → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStep {
    Idle,
    AwaitingKeyword,
    AwaitingUsername,
    AwaitingFullName,
    AwaitingPhone,
    AwaitingProgram,
}

impl PendingStep {
    /// Check if a transition from `self` to `target` is valid. Any step
    /// may return to `Idle`: that is the cancellation path.
    pub fn can_transition_to(&self, target: PendingStep) -> bool {
        use PendingStep::*;
        if target == Idle {
            return true;
        }
        matches!(
            (self, target),
            (Idle, AwaitingKeyword)
                | (Idle, AwaitingUsername)
                | (Idle, AwaitingFullName)
                | (AwaitingUsername, AwaitingFullName)
                | (AwaitingFullName, AwaitingPhone)
                | (AwaitingPhone, AwaitingProgram)
        )
    }

    /// Whether a free-text message is currently being waited on.
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl Default for PendingStep {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for PendingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingKeyword => "awaiting_keyword",
            Self::AwaitingUsername => "awaiting_username",
            Self::AwaitingFullName => "awaiting_full_name",
            Self::AwaitingPhone => "awaiting_phone",
            Self::AwaitingProgram => "awaiting_program",
        };
        write!(f, "{s}")
    }
}

/// Answers collected so far in the application flow. Each step writes at
/// most one field, and only after validation, so the draft is never
/// half-updated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub telegram_handle: Option<String>,
    pub fio: Option<String>,
    pub phone: Option<String>,
    pub program: Option<String>,
    /// Failed phone inputs in a row; the step is abandoned at the cap.
    pub phone_attempts: u32,
    /// Failed gateway submissions; one user-triggered retry is allowed.
    pub submit_attempts: u32,
}

impl ApplicationDraft {
    pub fn is_complete(&self) -> bool {
        self.telegram_handle.is_some()
            && self.fio.is_some()
            && self.phone.is_some()
            && self.program.is_some()
    }
}
