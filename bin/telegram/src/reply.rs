//! Reply surface for one Telegram chat.

use crate::api::{ParseMode, SendMessage, TelegramApi};
use async_trait::async_trait;
use chat_relay_router::{PlaceholderId, ReplySurface, SurfaceError, TextFormat};
use rootcause::prelude::{Report, ResultExt};
use tracing::warn;

/// Answers the message `message_id` in chat `chat_id`.
pub struct TelegramReply<'a> {
    api: &'a TelegramApi,
    chat_id: i64,
    message_id: i64,
}

impl<'a> TelegramReply<'a> {
    pub fn new(api: &'a TelegramApi, chat_id: i64, message_id: i64) -> Self {
        Self {
            api,
            chat_id,
            message_id,
        }
    }

    fn delivery(&self, action: &str) -> SurfaceError {
        SurfaceError::Delivery {
            reason: format!("{action} in chat {}", self.chat_id),
        }
    }
}

#[async_trait]
impl ReplySurface for TelegramReply<'_> {
    async fn send(&self, text: &str, format: TextFormat) -> Result<(), Report<SurfaceError>> {
        let plain = SendMessage::new(self.chat_id, text);

        if format == TextFormat::Rich {
            let rich = SendMessage::new(self.chat_id, text).parse_mode(ParseMode::Markdown);
            match self.api.send_message(&rich).await {
                Ok(_) => return Ok(()),
                Err(report) if report.current_context().is_bad_request() => {
                    warn!(error = %report, "Markdown rejected, resending as plain text");
                }
                Err(report) => return Err(report.context(self.delivery("sendMessage"))),
            }
        }

        self.api
            .send_message(&plain)
            .await
            .context(self.delivery("sendMessage"))?;
        Ok(())
    }

    async fn show_placeholder(
        &self,
        text: &str,
    ) -> Result<Option<PlaceholderId>, Report<SurfaceError>> {
        let message = SendMessage::new(self.chat_id, text).reply_to(self.message_id);
        let sent = self
            .api
            .send_message(&message)
            .await
            .context(self.delivery("show placeholder"))?;
        Ok(Some(PlaceholderId(sent.message_id)))
    }

    async fn remove_placeholder(&self, id: PlaceholderId) -> Result<(), Report<SurfaceError>> {
        self.api
            .delete_message(self.chat_id, id.0)
            .await
            .context(self.delivery("remove placeholder"))
    }
}
