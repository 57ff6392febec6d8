use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::info;
use uuid::Uuid;

use email_capture::config::RunnerConfig;
use email_capture::context::InvocationContext;
use email_capture::error::Result;
use email_capture::llm::{ExtractorConfig, LlmConfig, LlmExtractor, create_provider};
use email_capture::pipeline::{EmailCaptureHandler, Event};
use email_capture::store::{ActivityRecordUpdater, ActivityStore, LibSqlBackend};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Warning: rustls crypto provider was already installed");
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    run().await?;
    Ok(())
}

/// Handle one event read from the file named on the command line, or stdin.
async fn run() -> Result<()> {
    let config = RunnerConfig::from_env()?;
    let llm_config = LlmConfig::from_env()?;
    let extractor_config = ExtractorConfig::from_env()?;

    eprintln!("📇 email-capture v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Message pointer: {}", config.message_pointer);

    let event = read_event(std::env::args().nth(1)).await?;

    // ── Extraction ───────────────────────────────────────────────────
    let llm = create_provider(&llm_config)?;
    let extractor = Arc::new(LlmExtractor::new(llm, extractor_config));

    // ── Activity record ──────────────────────────────────────────────
    let store: Arc<dyn ActivityStore> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    let activity_id = config
        .activity_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    store.ensure_activity(&activity_id).await?;
    let updater = Arc::new(ActivityRecordUpdater::new(
        Arc::clone(&store),
        activity_id.clone(),
    ));

    // ── Invoke ───────────────────────────────────────────────────────
    let ctx = InvocationContext::new(extractor, updater);
    let handler = EmailCaptureHandler::new(config.message_locator());
    info!(
        invocation_id = %ctx.invocation_id,
        activity_id = %activity_id,
        locator = ?handler.locator(),
        "Handling event"
    );
    handler.handle(&event, &ctx).await?;

    if let Some(record) = store.get_activity(&activity_id).await? {
        eprintln!(
            "   Activity {}: email = {}",
            record.id,
            record.email().unwrap_or("(none)")
        );
    }

    Ok(())
}

async fn read_event(path: Option<String>) -> Result<Event> {
    let text = match path {
        Some(path) => tokio::fs::read_to_string(&path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    Ok(Event::from_json(&text)?)
}
