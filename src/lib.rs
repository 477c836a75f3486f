//! FAQ Assist — conversational FAQ navigation and application intake.

pub mod channels;
pub mod config;
pub mod content;
pub mod dialogue;
pub mod error;
pub mod event;
pub mod intake;
pub mod nav;
pub mod normalize;
pub mod search;
