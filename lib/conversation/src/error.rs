//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StorageError`: Errors from transcript persistence
//! - `SessionError`: Errors from session operations (also used as a
//!   context wrapper around `StorageError`)

use crate::message::Role;
use std::fmt;

/// Errors from transcript storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Filesystem operation failed.
    Io {
        operation: &'static str,
        path: String,
        reason: String,
    },
    /// Transcript could not be encoded.
    Serialize { reason: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                operation,
                path,
                reason,
            } => write!(f, "failed to {operation} transcript '{path}': {reason}"),
            Self::Serialize { reason } => {
                write!(f, "failed to encode transcript: {reason}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Storage operation context (use as context wrapper).
    Storage { identity: String },
    /// An assistant turn was appended without a preceding user turn.
    ReplyWithoutPrompt { last_role: Option<Role> },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { identity } => {
                write!(f, "session storage failed for {identity}")
            }
            Self::ReplyWithoutPrompt { last_role: None } => {
                write!(f, "assistant reply appended to an empty transcript")
            }
            Self::ReplyWithoutPrompt {
                last_role: Some(role),
            } => {
                write!(f, "assistant reply must follow a user turn, found {role}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
