//! Error types for FAQ Assist.

use std::time::Duration;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Content error: {0}")]
    Load(#[from] LoadError),

    #[error("Lookup error: {0}")]
    NotFound(#[from] NotFound),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Content-loading errors. Fatal at startup; the process must not serve
/// traffic after one of these.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to parse content source: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate question id {id} (in \"{category}\" / \"{subcategory}\")")]
    DuplicateQuestionId {
        id: u32,
        category: String,
        subcategory: String,
    },

    #[error("Content tree has no categories")]
    NoCategories,

    #[error("Category \"{category}\" has no subcategories")]
    EmptyCategory { category: String },

    #[error("Subcategory \"{subcategory}\" of \"{category}\" has no questions")]
    EmptySubcategory {
        category: String,
        subcategory: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A tree lookup failed. Recoverable: navigation falls back to the
/// nearest valid ancestor view.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotFound {
    #[error("No category at index {0}")]
    Category(usize),

    #[error("No subcategory at index {1} in category {0}")]
    Subcategory(usize, usize),

    #[error("No question with id {0}")]
    Question(u32),
}

/// A dialogue-step input failed validation. Recoverable: the same step
/// re-prompts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Field \"{field}\" is empty")]
    EmptyField { field: &'static str },

    #[error("Phone number contains no digits")]
    PhoneNoDigits,

    #[error("Phone number starts with '{0}', expected 7 or 8")]
    PhoneBadPrefix(char),
}

/// The intake gateway call failed. Recoverable: the user is informed
/// generically and may retry.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Intake request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Intake request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Intake returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Intake reported status \"{0}\"")]
    Rejected(String),
}

/// Transport-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid update format: {0}")]
    InvalidUpdate(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
