//! Inbound events and button-token parsing.
//!
//! The transport hands the core one of three event kinds. Button tokens
//! are opaque strings on the wire; they are parsed into the closed
//! [`ButtonAction`] enum before any dispatch, and malformed tokens fail
//! closed (ignored and logged) instead of crashing the turn.

/// The end user behind an event. `id` is the stable session key;
/// `username` is the public handle when Telegram exposes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub username: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// One inbound turn, as classified by the transport.
#[derive(Debug, Clone)]
pub enum Event {
    /// A slash command such as `/start`.
    Command { name: String, user: UserRef },
    /// An inline-keyboard tap carrying an opaque token.
    ButtonTap { token: String, user: UserRef },
    /// A plain text message.
    FreeText { content: String, user: UserRef },
}

impl Event {
    pub fn user(&self) -> &UserRef {
        match self {
            Event::Command { user, .. }
            | Event::ButtonTap { user, .. }
            | Event::FreeText { user, .. } => user,
        }
    }
}

/// Program choice offered at the final application step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Higher education.
    Vo,
    /// Vocational education.
    Spo,
}

impl Program {
    pub fn label(&self) -> &'static str {
        match self {
            Program::Vo => "Высшее образование (ВО)",
            Program::Spo => "Среднее профессиональное (СПО)",
        }
    }

    /// Value carried in the intake payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Program::Vo => "ВО",
            Program::Spo => "СПО",
        }
    }
}

/// Typed intent behind a button token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Category(usize),
    Subcategory(usize, usize),
    Question(u32),
    BackToCategories,
    BackToSubcategories(usize),
    Search,
    Apply,
    Program(Program),
}

impl ButtonAction {
    /// Parse a wire token. Returns `None` for anything malformed; the
    /// caller logs and drops the tap.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "back_to_categories" => return Some(Self::BackToCategories),
            "search" => return Some(Self::Search),
            "apply" => return Some(Self::Apply),
            "prog_vo" => return Some(Self::Program(Program::Vo)),
            "prog_spo" => return Some(Self::Program(Program::Spo)),
            _ => {}
        }
        if let Some(rest) = token.strip_prefix("cat_") {
            return rest.parse().ok().map(Self::Category);
        }
        if let Some(rest) = token.strip_prefix("subcat_") {
            let (i, j) = rest.split_once('_')?;
            return Some(Self::Subcategory(i.parse().ok()?, j.parse().ok()?));
        }
        if let Some(rest) = token.strip_prefix("q_") {
            return rest.parse().ok().map(Self::Question);
        }
        if let Some(rest) = token.strip_prefix("back_to_subcat_") {
            return rest.parse().ok().map(Self::BackToSubcategories);
        }
        None
    }

    /// Wire form of this action. Inverse of [`parse`](Self::parse).
    pub fn encode(&self) -> String {
        match self {
            Self::Category(i) => format!("cat_{i}"),
            Self::Subcategory(i, j) => format!("subcat_{i}_{j}"),
            Self::Question(id) => format!("q_{id}"),
            Self::BackToCategories => "back_to_categories".to_string(),
            Self::BackToSubcategories(i) => format!("back_to_subcat_{i}"),
            Self::Search => "search".to_string(),
            Self::Apply => "apply".to_string(),
            Self::Program(Program::Vo) => "prog_vo".to_string(),
            Self::Program(Program::Spo) => "prog_spo".to_string(),
        }
    }
}
