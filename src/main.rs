use std::sync::Arc;

use faq_assist::channels::TelegramChannel;
use faq_assist::config::BotConfig;
use faq_assist::content::ContentTree;
use faq_assist::dialogue::{spawn_sweep_task, DialogueEngine, SessionStore};
use faq_assist::intake::HttpIntakeGateway;
use faq_assist::nav::Navigator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
        eprintln!("Error: TELEGRAM_BOT_TOKEN not set");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    let config = BotConfig::from_env();

    eprintln!("📚 FAQ Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Content: {}", config.content_path);
    eprintln!("   Intake: {}", config.intake_url);
    eprintln!(
        "   Sessions: TTL {}s, sweep every {}s",
        config.session_idle_timeout.as_secs(),
        config.sweep_interval.as_secs()
    );

    // Content load is the only fatal error path: the process must not
    // serve traffic over a malformed tree.
    let tree = ContentTree::load_file(&config.content_path).unwrap_or_else(|e| {
        eprintln!("Error: Failed to load content from {}: {}", config.content_path, e);
        std::process::exit(1);
    });
    eprintln!(
        "   Loaded {} categories, {} questions",
        tree.categories.len(),
        tree.iter_questions().count()
    );

    let navigator = Navigator::new(Arc::new(tree), config.intake_category.clone());
    let sessions = Arc::new(SessionStore::new(config.session_idle_timeout));
    let gateway = Arc::new(HttpIntakeGateway::new(
        config.intake_url.clone(),
        config.intake_timeout,
    ));
    let engine = Arc::new(DialogueEngine::new(
        navigator,
        Arc::clone(&sessions),
        gateway,
        config.phone_max_attempts,
    ));

    let _sweep_handle = spawn_sweep_task(sessions, config.sweep_interval);

    let channel = TelegramChannel::new(bot_token.into(), config.poll_timeout_secs);
    if let Err(e) = channel.health_check().await {
        eprintln!("Error: Telegram health check failed: {e}");
        std::process::exit(1);
    }
    tracing::info!("Startup complete");

    channel.run(engine).await;

    Ok(())
}
