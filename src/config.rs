//! Configuration types.

use std::time::Duration;

/// Bot configuration, read from the environment with defaults.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Path to the FAQ content JSON.
    pub content_path: String,
    /// Intake endpoint URL for completed applications.
    pub intake_url: String,
    /// Timeout for the intake POST.
    pub intake_timeout: Duration,
    /// Name of the category whose menu offers the "apply" button.
    pub intake_category: String,
    /// Sessions idle longer than this are pruned.
    pub session_idle_timeout: Duration,
    /// How often the idle-session sweep runs.
    pub sweep_interval: Duration,
    /// Failed phone inputs tolerated before the flow is abandoned.
    pub phone_max_attempts: u32,
    /// Telegram long-poll timeout in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            content_path: "./data/faq.json".to_string(),
            intake_url: "http://localhost:8000/api/applications".to_string(),
            intake_timeout: Duration::from_secs(10),
            intake_category: "Поступление".to_string(),
            session_idle_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            phone_max_attempts: 3,
            poll_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Build from `FAQ_*` environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            content_path: env_or("FAQ_CONTENT_PATH", defaults.content_path),
            intake_url: env_or("FAQ_INTAKE_URL", defaults.intake_url),
            intake_timeout: Duration::from_secs(env_parsed(
                "FAQ_INTAKE_TIMEOUT_SECS",
                defaults.intake_timeout.as_secs(),
            )),
            intake_category: env_or("FAQ_INTAKE_CATEGORY", defaults.intake_category),
            session_idle_timeout: Duration::from_secs(env_parsed(
                "FAQ_SESSION_TTL_SECS",
                defaults.session_idle_timeout.as_secs(),
            )),
            sweep_interval: Duration::from_secs(env_parsed(
                "FAQ_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            phone_max_attempts: env_parsed("FAQ_PHONE_MAX_ATTEMPTS", defaults.phone_max_attempts),
            poll_timeout_secs: env_parsed("FAQ_POLL_TIMEOUT_SECS", defaults.poll_timeout_secs),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
