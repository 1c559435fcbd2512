//! Error types for the Telegram front end.

use std::fmt;

/// Errors from the Bot API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramError {
    /// The HTTP client could not be built.
    Client { reason: String },
    /// The request did not complete.
    Request { method: &'static str, reason: String },
    /// The Bot API answered with an error status.
    Api {
        method: &'static str,
        status: u16,
        description: String,
    },
    /// The response could not be understood.
    Decode { method: &'static str, reason: String },
}

impl TelegramError {
    /// Returns true if Telegram rejected the request itself, e.g. because
    /// of malformed Markdown.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::Api { status: 400, .. })
    }
}

impl fmt::Display for TelegramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client { reason } => write!(f, "failed to build HTTP client: {reason}"),
            Self::Request { method, reason } => write!(f, "{method} request failed: {reason}"),
            Self::Api {
                method,
                status,
                description,
            } => write!(f, "{method} rejected with status {status}: {description}"),
            Self::Decode { method, reason } => {
                write!(f, "unexpected {method} response: {reason}")
            }
        }
    }
}

impl std::error::Error for TelegramError {}

/// Bot startup context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    Config,
    DataDir { path: String, reason: String },
    Client,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "failed to load configuration"),
            Self::DataDir { path, reason } => {
                write!(f, "failed to create data directory '{path}': {reason}")
            }
            Self::Client => write!(f, "failed to create API client"),
        }
    }
}

impl std::error::Error for StartupError {}
