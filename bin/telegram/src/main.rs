//! Telegram bot front end for chat-relay.

mod api;
mod bot;
mod error;
mod reply;

use api::TelegramApi;
use bot::Bot;
use chat_relay_ai::{ChatCompletionClient, ClientSetupError};
use chat_relay_conversation::{FileTranscriptStore, SessionManager};
use chat_relay_router::{MessageRouter, RelayConfig, RouterSettings};
use error::StartupError;
use rootcause::prelude::{Report, ResultExt};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let bot = match start().await {
        Ok(bot) => bot,
        Err(report) => {
            tracing::error!(error = %report, "Bot failed to start");
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        () = bot.poll() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        }
    }
    ExitCode::SUCCESS
}

async fn start() -> Result<Bot, Report<StartupError>> {
    let config = RelayConfig::load_interactive(Path::new(".env")).context(StartupError::Config)?;
    tracing::info!(
        model = %config.ai_model,
        data_dir = %config.data_dir.display(),
        "Loaded configuration"
    );

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .map_err(|e| StartupError::DataDir {
            path: config.data_dir.display().to_string(),
            reason: e.to_string(),
        })?;

    let client = ChatCompletionClient::new(config.client_settings())
        .map_err(Report::<ClientSetupError>::from)
        .context(StartupError::Client)?;
    let api = TelegramApi::new(config.telegram_bot_token.clone()).context(StartupError::Client)?;
    let me = api.get_me().await.context(StartupError::Client)?;
    tracing::info!(bot = me.username.as_deref().unwrap_or("unknown"), "Connected to Telegram");

    let store = FileTranscriptStore::new(&config.data_dir);
    let sessions = Arc::new(SessionManager::new(Arc::new(store), config.persona.clone()));
    let router = MessageRouter::new(sessions, Arc::new(client), RouterSettings::from(&config));

    Ok(Bot::new(Arc::new(api), Arc::new(router), me.username))
}
