//! Minimal Telegram Bot API client.
//!
//! Only the methods the relay needs: `getMe`, long polling with
//! `getUpdates`, `sendMessage`, `deleteMessage` and `deleteWebhook`.

use crate::error::TelegramError;
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Seconds the server holds a `getUpdates` request open.
pub const LONG_POLL_SECS: u64 = 30;

/// An incoming update. Only message updates are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Text formatting mode for `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Serialize)]
struct ReplyParameters {
    message_id: i64,
}

/// Parameters of one `sendMessage` call.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

impl<'a> SendMessage<'a> {
    pub fn new(chat_id: i64, text: &'a str) -> Self {
        Self {
            chat_id,
            text,
            parse_mode: None,
            reply_parameters: None,
        }
    }

    #[must_use]
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_parameters = Some(ReplyParameters { message_id });
        self
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramApi {
    /// Creates a client for the public Bot API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, Report<TelegramError>> {
        // Must outlive the long-poll hold time.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 30))
            .build()
            .map_err(|e| TelegramError::Client {
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API host.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn call<P, T>(
        &self,
        method: &'static str,
        params: &P,
    ) -> Result<T, Report<TelegramError>>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| TelegramError::Request {
                method,
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TelegramError::Request {
            method,
            reason: e.to_string(),
        })?;
        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();

        match parsed {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Some(ApiResponse { description, .. }) if !status.is_success() => {
                Err(TelegramError::Api {
                    method,
                    status: status.as_u16(),
                    description: description.unwrap_or_default(),
                }
                .into())
            }
            Some(ApiResponse { description, .. }) => Err(TelegramError::Decode {
                method,
                reason: description.unwrap_or_else(|| "missing result".to_string()),
            }
            .into()),
            None if !status.is_success() => Err(TelegramError::Api {
                method,
                status: status.as_u16(),
                description: body,
            }
            .into()),
            None => Err(TelegramError::Decode {
                method,
                reason: "response is not a Bot API envelope".to_string(),
            }
            .into()),
        }
    }

    /// Returns the bot's own account.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn get_me(&self) -> Result<User, Report<TelegramError>> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Removes any webhook so that long polling is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn delete_webhook(
        &self,
        drop_pending_updates: bool,
    ) -> Result<(), Report<TelegramError>> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({ "drop_pending_updates": drop_pending_updates }),
            )
            .await?;
        Ok(())
    }

    /// Long-polls for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, Report<TelegramError>> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &serde_json::json!({
                    "offset": offset,
                    "timeout": LONG_POLL_SECS,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;
        debug!(count = updates.len(), offset, "Received updates");
        Ok(updates)
    }

    /// Sends a message, returning the sent message.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn send_message(
        &self,
        message: &SendMessage<'_>,
    ) -> Result<Message, Report<TelegramError>> {
        self.call("sendMessage", message).await
    }

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), Report<TelegramError>> {
        let _: bool = self
            .call(
                "deleteMessage",
                &serde_json::json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }
}
