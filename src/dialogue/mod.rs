//! Per-user dialogue state machine and turn handling.

pub mod engine;
pub mod phone;
pub mod session;
pub mod state;

pub use engine::DialogueEngine;
pub use phone::normalize_phone;
pub use session::{spawn_sweep_task, Session, SessionStore};
pub use state::{ApplicationDraft, PendingStep};
