//! f1desk application binary - composition root.
//!
//! 1. Parse flags and load configuration from TOML, env, then flags
//! 2. Open the Q&A, notification and analytics stores
//! 3. Build the optional external clients and the resolution pipeline
//! 4. Start the idle-session sweeper
//! 5. Serve the axum API until Ctrl-C

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use f1desk_api::auth::generate_token;
use f1desk_api::{AppState, Stores};
use f1desk_chat::{
    ChatOrchestrator, GenerativeResponder, HttpIntentClassifier, IntentClassifier,
    OpenAiResponder, ResolutionPipeline,
};
use f1desk_core::config::F1DeskConfig;
use f1desk_storage::SqliteStore;

use crate::cli::{expand_home, CliArgs};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn open_stores(config: &F1DeskConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    match config.storage.backend.as_str() {
        "sqlite" => {
            let path = expand_home(&config.storage.sqlite_path);
            let store = SqliteStore::open(&path)?;
            tracing::info!(path = %path.display(), "SQLite store ready");
            Ok(Stores::sqlite(store))
        }
        _ => {
            let stores = Stores::memory()?;
            tracing::info!("In-memory store ready");
            Ok(stores)
        }
    }
}

fn intent_classifier(
    config: &F1DeskConfig,
    timeout: Duration,
) -> Option<Arc<dyn IntentClassifier>> {
    if !config.intent.is_usable() {
        tracing::info!("Intent classifier disabled");
        return None;
    }
    match HttpIntentClassifier::from_config(&config.intent, timeout) {
        Ok(client) => {
            tracing::info!(base_url = %config.intent.base_url, "Intent classifier enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "Intent classifier unavailable, continuing without it");
            None
        }
    }
}

fn generative_responder(
    config: &F1DeskConfig,
    timeout: Duration,
) -> Option<Arc<dyn GenerativeResponder>> {
    if !config.generative.is_usable() {
        tracing::info!("Generative responder disabled");
        return None;
    }
    match OpenAiResponder::from_config(&config.generative, timeout) {
        Ok(client) => {
            tracing::info!(model = %config.generative.model, "Generative responder enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "Generative responder unavailable, continuing without it");
            None
        }
    }
}

/// Drop idle sessions on a fixed cadence. Zero idle minutes disables it.
fn spawn_session_sweeper(chat: Arc<ChatOrchestrator>, idle_minutes: u64) {
    if idle_minutes == 0 {
        return;
    }
    let max_idle = Duration::from_secs(idle_minutes * 60);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = chat.prune_idle(max_idle);
            if removed > 0 {
                tracing::debug!(removed, "Idle chat sessions pruned");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Logging is not up yet, so load warnings surface after init.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        F1DeskConfig::load(&config_file)?
    } else {
        F1DeskConfig::default()
    };
    config.apply_env_overrides();
    args.apply_to(&mut config);

    // Tracing. RUST_LOG wins over the flag and the config file.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting f1desk v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }
    config.validate()?;

    // Storage.
    let stores = open_stores(&config)?;

    // Pipeline.
    let timeout = Duration::from_secs(config.chat.stage_timeout_secs);
    let pipeline = ResolutionPipeline::standard(
        &config.chat,
        Arc::clone(&stores.questions),
        Arc::clone(&stores.analytics),
        intent_classifier(&config, timeout),
        generative_responder(&config, timeout),
    );
    tracing::info!(stages = ?pipeline.stage_names(), "Resolution pipeline ready");
    let chat = ChatOrchestrator::new(pipeline, config.chat.max_message_length);

    let admin_token = match config.api.admin_token.clone() {
        Some(token) => token,
        None => {
            tracing::warn!(
                "No admin token configured; generated one for this run. \
                 Set F1DESK_ADMIN_TOKEN to use admin routes."
            );
            generate_token()
        }
    };

    let idle_minutes = config.chat.session_idle_minutes;
    let state = AppState::new(config, stores, chat, admin_token);
    spawn_session_sweeper(Arc::clone(&state.chat), idle_minutes);

    f1desk_api::start_server(state, shutdown_signal()).await?;
    Ok(())
}
