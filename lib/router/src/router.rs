//! Inbound event dispatch and the relay pipeline.
//!
//! Every event ends at this boundary: failures are logged and answered
//! with a fixed apology, never propagated to the dispatch loop.

use crate::chunk::{DEFAULT_CHUNK_SIZE, split_text};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::surface::{ReplySurface, TextFormat};
use chat_relay_ai::CompletionBackend;
use chat_relay_conversation::SessionManager;
use chat_relay_core::{EventId, SessionKey};
use rootcause::prelude::ResultExt;
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// Placeholder shown while a completion is pending.
pub const PROCESSING_PLACEHOLDER: &str = "⏳ Please wait, processing your request...";

const CLEARED: &str = "Chat history has been cleared!";
const ALREADY_EMPTY: &str = "Chat history is already empty!";
const START_FAILED: &str = "An error occurred while starting the chat bot.";
const CLEAR_FAILED: &str = "An error occurred while clearing chat history.";
const MESSAGE_FAILED: &str = "An error occurred while processing your message.";

/// What an inbound event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Seed the persona and greet the user.
    Start,
    /// Delete the transcript.
    Clear,
    /// Relay a message to the model.
    Message(String),
}

impl EventKind {
    /// Classifies messaging-surface text.
    ///
    /// `/start` and `/clear`, optionally followed by arguments, are
    /// commands. A command addressed as `/start@name` only counts when
    /// `name` matches `bot_username`, ignoring case. Anything else is a
    /// message.
    #[must_use]
    pub fn from_chat_text(text: &str, bot_username: Option<&str>) -> Self {
        let command = text
            .strip_prefix('/')
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|word| match word.split_once('@') {
                None => Some(word),
                Some((name, mention))
                    if bot_username.is_some_and(|bot| bot.eq_ignore_ascii_case(mention)) =>
                {
                    Some(name)
                }
                Some(_) => None,
            });

        match command {
            Some("start") => Self::Start,
            Some("clear") => Self::Clear,
            _ => Self::Message(text.to_string()),
        }
    }

    /// Returns the originating text, for logging.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Start => "/start",
            Self::Clear => "/clear",
            Self::Message(text) => text,
        }
    }

    fn failure_apology(&self) -> &'static str {
        match self {
            Self::Start => START_FAILED,
            Self::Clear => CLEAR_FAILED,
            Self::Message(_) => MESSAGE_FAILED,
        }
    }
}

/// One inbound event from a user surface.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Correlation ID for logs.
    pub id: EventId,
    /// The session owner.
    pub identity: SessionKey,
    /// What the event asks for.
    pub kind: EventKind,
}

impl InboundEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(identity: SessionKey, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            identity,
            kind,
        }
    }
}

/// How an event was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Welcome sent; `seeded` if the persona was newly added.
    Started { seeded: bool },
    /// Clear handled; `existed` if a transcript was deleted.
    Cleared { existed: bool },
    /// Reply relayed in `chunks` messages; `apologized` if the completion
    /// failed and the apology was sent instead.
    Replied { chunks: usize, apologized: bool },
    /// Handling failed and the failure apology was sent.
    Failed,
}

/// Router behavior settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Maximum reply chunk length, in characters.
    pub chunk_size: usize,
    /// Text answered to a start event.
    pub welcome_message: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            welcome_message: "Welcome to AI Chat Bot!".to_string(),
        }
    }
}

impl From<&RelayConfig> for RouterSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            welcome_message: config.welcome_message.clone(),
        }
    }
}

/// Dispatches inbound events to session operations.
pub struct MessageRouter {
    sessions: Arc<SessionManager>,
    backend: Arc<dyn CompletionBackend>,
    settings: RouterSettings,
}

impl MessageRouter {
    /// Creates a new router.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionManager>,
        backend: Arc<dyn CompletionBackend>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            sessions,
            backend,
            settings,
        }
    }

    /// Handles one event, answering on `surface`.
    ///
    /// Events for the same identity are handled one at a time; events for
    /// different identities run concurrently.
    #[instrument(skip_all, fields(id = %event.id, identity = %event.identity))]
    pub async fn handle(&self, event: InboundEvent, surface: &dyn ReplySurface) -> EventOutcome {
        let _guard = self.sessions.lock(&event.identity).await;

        let result = match &event.kind {
            EventKind::Start => self.start(&event.identity, surface).await,
            EventKind::Clear => self.clear(&event.identity, surface).await,
            EventKind::Message(text) => self.relay(&event.identity, text, surface).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(report) => {
                error!(
                    identity = %event.identity,
                    text = %event.kind.text(),
                    error = %report,
                    "Error handling event"
                );
                if let Err(report) = surface.notify(event.kind.failure_apology()).await {
                    error!(error = %report, "Failed to deliver apology");
                }
                EventOutcome::Failed
            }
        }
    }

    async fn start(
        &self,
        identity: &SessionKey,
        surface: &dyn ReplySurface,
    ) -> chat_relay_core::Result<EventOutcome, RelayError> {
        let seeded = match self.sessions.bootstrap(identity).await {
            Ok(seeded) => seeded,
            Err(report) => {
                // The welcome still goes out; the persona is retried on the next start.
                error!(error = %report, "Failed to save seeded persona");
                false
            }
        };

        surface
            .notify(&self.settings.welcome_message)
            .await
            .context(RelayError::Delivery {
                identity: identity.to_string(),
            })?;
        Ok(EventOutcome::Started { seeded })
    }

    async fn clear(
        &self,
        identity: &SessionKey,
        surface: &dyn ReplySurface,
    ) -> chat_relay_core::Result<EventOutcome, RelayError> {
        let existed = self
            .sessions
            .reset(identity)
            .await
            .context(RelayError::Clear {
                identity: identity.to_string(),
            })?;

        let notice = if existed { CLEARED } else { ALREADY_EMPTY };
        surface
            .notify(notice)
            .await
            .context(RelayError::Delivery {
                identity: identity.to_string(),
            })?;
        Ok(EventOutcome::Cleared { existed })
    }

    async fn relay(
        &self,
        identity: &SessionKey,
        text: &str,
        surface: &dyn ReplySurface,
    ) -> chat_relay_core::Result<EventOutcome, RelayError> {
        let mut transcript = self.sessions.append_user_turn(identity, text).await;

        let placeholder = surface
            .show_placeholder(PROCESSING_PLACEHOLDER)
            .await
            .unwrap_or_else(|report| {
                warn!(error = %report, "Failed to show processing placeholder");
                None
            });

        let (reply, apologized) = match self.backend.complete(transcript.turns()).await {
            Ok(reply) => (reply, false),
            Err(failure) => {
                warn!(failure = %failure, "Completion failed, sending apology");
                (failure.apology().to_string(), true)
            }
        };

        if let Err(report) = self
            .sessions
            .append_assistant_turn(identity, &mut transcript, &reply)
            .await
        {
            error!(error = %report, "Failed to save conversation");
        }

        if let Some(id) = placeholder
            && let Err(report) = surface.remove_placeholder(id).await
        {
            warn!(error = %report, "Failed to remove processing placeholder");
        }

        let chunks = split_text(&reply, self.settings.chunk_size);
        let format = if chunks.len() > 1 {
            TextFormat::Plain
        } else {
            TextFormat::Rich
        };
        for chunk in &chunks {
            surface
                .send(chunk, format)
                .await
                .context(RelayError::Delivery {
                    identity: identity.to_string(),
                })?;
        }

        Ok(EventOutcome::Replied {
            chunks: chunks.len(),
            apologized,
        })
    }
}
