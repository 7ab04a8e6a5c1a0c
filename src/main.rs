// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): screener, classifier, pipeline
// - `infra/` = Implementations of core traits (SQLite, OpenRouter)
// - `discord/` = Discord-specific adapters (commands, events, chat actions)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::ai::{AiConfig, AiService};
use crate::core::history::{HistoryService, SUMMARY_PROMPT};
use crate::core::moderation::{
    HeuristicScreener, ModerationConfig, ModerationService, RemoteClassifier, ScreeningRules,
};
use crate::discord::moderation::message_handler;
use crate::discord::{Data, Error};
use crate::infra::ai::openrouter_client::DEFAULT_OPENROUTER_URL;
use crate::infra::ai::OpenRouterClient;
use crate::infra::moderation::SqliteModerationStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-distill-llama-70b:free";
const DEFAULT_DB_PATH: &str = "data/moderation.db";

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        message_handler::handle_message(ctx, new_message, data);
    }

    Ok(())
}

/// Read an optional env var, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn init_tracing() {
    let fallback = std::env::var("LOG_LEVEL")
        .map(|level| level.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&fallback))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    init_tracing();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;
    let oversight_channel_id: u64 = std::env::var("ADMIN_CHANNEL_ID")
        .context("Missing ADMIN_CHANNEL_ID environment variable!")?
        .trim()
        .parse()
        .context("ADMIN_CHANNEL_ID must be a Discord channel id")?;
    anyhow::ensure!(oversight_channel_id != 0, "ADMIN_CHANNEL_ID must not be 0");
    let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
        .context("Missing OPENROUTER_API_KEY environment variable!")?;
    let openrouter_url =
        std::env::var("OPENROUTER_URL").unwrap_or_else(|_| DEFAULT_OPENROUTER_URL.to_string());
    let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let defaults = ModerationConfig::default();
    let config = ModerationConfig {
        confidence_threshold: env_or(
            "PHISHING_CONFIDENCE_THRESHOLD",
            defaults.confidence_threshold,
        ),
        max_history: env_or("MAX_CONTEXT_LENGTH", defaults.max_history),
        classifier_timeout: Duration::from_secs(env_or(
            "CLASSIFIER_TIMEOUT_SECS",
            defaults.classifier_timeout.as_secs(),
        )),
        oversight_channel_id,
        keyword_sample_size: env_or("KEYWORD_SAMPLE_SIZE", defaults.keyword_sample_size),
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // Keep the runtime database in a dedicated folder so the repo root stays tidy.
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent).context("Failed to create data directory for SQLite")?;
    }
    let store = Arc::new(
        SqliteModerationStore::open(std::path::Path::new(&db_path), config.max_history)
            .await
            .context("Failed to connect to moderation DB")?,
    );
    store
        .migrate()
        .await
        .context("Failed to migrate moderation DB")?;
    tracing::info!("Database initialized successfully");

    // One HTTP client for both verification and summaries. Its own timeout is
    // a backstop; the classifier enforces `classifier_timeout` itself.
    let provider = Arc::new(
        OpenRouterClient::new(
            openrouter_api_key,
            openrouter_url,
            config.classifier_timeout + Duration::from_secs(30),
        )
        .context("Failed to create OpenRouter client")?,
    );

    let rules = ScreeningRules::default_rules().with_keyword_sample_size(config.keyword_sample_size);
    let screener = HeuristicScreener::new(rules).context("Failed to compile screening rules")?;
    let classifier =
        RemoteClassifier::new(Arc::clone(&provider), model.clone(), config.classifier_timeout);

    let moderation = Arc::new(ModerationService::new(
        screener,
        classifier,
        Arc::clone(&store),
        Arc::clone(&store),
        config,
    ));

    let summarizer = AiService::new(Arc::clone(&provider), SUMMARY_PROMPT, AiConfig::new(model));
    let history = Arc::new(HistoryService::new(Arc::clone(&store), summarizer));

    let data = Data {
        moderation,
        history,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::history::summarize(),
                discord::commands::history::clear(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
