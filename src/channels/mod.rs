//! Transport adapters that feed events into the dialogue engine.

pub mod telegram;

pub use telegram::TelegramChannel;
