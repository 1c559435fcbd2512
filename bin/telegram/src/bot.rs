//! Long-polling loop and update dispatch.

use crate::api::{TelegramApi, Update};
use crate::reply::TelegramReply;
use chat_relay_core::SessionKey;
use chat_relay_router::{EventKind, EventOutcome, InboundEvent, MessageRouter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Delay before polling again after a failed poll.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// A text message worth routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
}

impl IncomingText {
    /// Extracts the routable text message from an update, if any.
    ///
    /// Updates without a message, without text, or without a sender are
    /// skipped.
    pub fn from_update(update: Update) -> Option<Self> {
        let message = update.message?;
        let from = message.from?;
        let text = message.text?;
        Some(Self {
            chat_id: message.chat.id,
            message_id: message.message_id,
            user_id: from.id,
            username: from.username,
            text,
        })
    }
}

/// Routes Telegram messages through the relay.
#[derive(Clone)]
pub struct Bot {
    api: Arc<TelegramApi>,
    router: Arc<MessageRouter>,
    username: Option<String>,
}

impl Bot {
    /// `username` is the bot's own account name, used to recognize
    /// commands addressed as `/start@username`.
    pub fn new(
        api: Arc<TelegramApi>,
        router: Arc<MessageRouter>,
        username: Option<String>,
    ) -> Self {
        Self {
            api,
            router,
            username,
        }
    }

    /// Polls for updates forever, handling each text message on its own task.
    pub async fn poll(&self) {
        if let Err(report) = self.api.delete_webhook(true).await {
            warn!(error = %report, "Failed to delete webhook");
        }
        info!("Bot is polling for messages");

        let mut offset = 0;
        loop {
            let updates = match self.api.get_updates(offset).await {
                Ok(updates) => updates,
                Err(report) => {
                    warn!(error = %report, "Polling failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(incoming) = IncomingText::from_update(update) else {
                    continue;
                };
                let bot = self.clone();
                tokio::spawn(async move {
                    bot.handle(incoming).await;
                });
            }
        }
    }

    /// Handles one text message.
    pub async fn handle(&self, incoming: IncomingText) -> EventOutcome {
        let kind = EventKind::from_chat_text(&incoming.text, self.username.as_deref());
        if matches!(kind, EventKind::Message(_)) {
            info!(
                "User @{} ({}) wrote: {}",
                incoming.username.as_deref().unwrap_or("unknown"),
                incoming.user_id,
                incoming.text
            );
        }

        let event = InboundEvent::new(SessionKey::from(incoming.user_id), kind);
        let surface = TelegramReply::new(&self.api, incoming.chat_id, incoming.message_id);
        self.router.handle(event, &surface).await
    }
}
