//! Completion backend abstraction.
//!
//! The remote API is stateless from our side: every call carries the whole
//! transcript, and the reply is the content of the first choice.

use crate::error::CompletionFailure;
use async_trait::async_trait;
use chat_relay_conversation::Turn;
use serde::{Deserialize, Serialize};

/// A chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// The full transcript, in conversation order.
    pub messages: &'a [Turn],
}

/// A chat-completion response body.
///
/// Only the fields needed to extract the reply are modeled; anything else
/// the provider sends is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One candidate reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

/// The message of a candidate reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Extracts the reply text from the first choice.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionFailure::EmptyReply`] if there is no first choice
    /// or its content is missing or empty.
    pub fn into_reply(self) -> Result<String, CompletionFailure> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or(CompletionFailure::EmptyReply)
    }
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Requests one reply for the given transcript.
    ///
    /// Single attempt; no retries.
    ///
    /// # Errors
    ///
    /// Returns a [`CompletionFailure`] if no usable reply was produced.
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionFailure>;
}
