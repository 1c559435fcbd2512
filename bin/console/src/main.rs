//! Interactive console front end for chat-relay.

mod console;

use chat_relay_ai::{ChatCompletionClient, ClientSetupError};
use chat_relay_conversation::{FileTranscriptStore, SessionManager};
use chat_relay_router::{MessageRouter, RelayConfig, RouterSettings};
use console::ConsoleSurface;
use rootcause::prelude::{Report, ResultExt};
use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ConsoleError {
    Startup,
    Terminal,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "failed to start console chat"),
            Self::Terminal => write!(f, "terminal input/output failed"),
        }
    }
}

impl std::error::Error for ConsoleError {}

#[tokio::main]
async fn main() -> ExitCode {
    // Keep logs quiet so they do not interleave with the chat.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<ConsoleError>> {
    let config = RelayConfig::load_interactive(Path::new(".env")).context(ConsoleError::Startup)?;
    tracing::debug!(?config, "Loaded configuration");

    let client = ChatCompletionClient::new(config.client_settings())
        .map_err(Report::<ClientSetupError>::from)
        .context(ConsoleError::Startup)?;
    let store = FileTranscriptStore::new(&config.data_dir);
    let sessions = Arc::new(SessionManager::new(Arc::new(store), config.persona.clone()));
    let router = MessageRouter::new(sessions, Arc::new(client), RouterSettings::from(&config));

    let surface = ConsoleSurface::new(tokio::io::stdout());
    console::run(&router, BufReader::new(tokio::io::stdin()), &surface)
        .await
        .map_err(Report::<std::io::Error>::from)
        .context(ConsoleError::Terminal)
}
