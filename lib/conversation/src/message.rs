//! Turn and transcript types for conversations.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona instruction seeded at the start of a session.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
}

impl Role {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored the turn.
    pub role: Role,
    /// Turn content.
    pub content: String,
}

impl Turn {
    /// Creates a new turn.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The ordered turns of one session.
///
/// Turns are only ever appended; existing turns cannot be edited, removed
/// or reordered through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript from turns in conversation order.
    #[must_use]
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Returns the turns in conversation order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the transcript has no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Seeds the persona instruction. Returns false if the transcript
    /// already has turns, in which case nothing is appended.
    pub fn seed_persona(&mut self, persona: impl Into<String>) -> bool {
        if !self.turns.is_empty() {
            return false;
        }
        self.turns.push(Turn::system(persona));
        true
    }

    /// Appends a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Appends an assistant turn answering the preceding user turn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ReplyWithoutPrompt`] unless the last turn was
    /// authored by the user.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        match self.turns.last().map(|t| t.role) {
            Some(Role::User) => {
                self.turns.push(Turn::assistant(content));
                Ok(())
            }
            last_role => Err(SessionError::ReplyWithoutPrompt { last_role }),
        }
    }
}
