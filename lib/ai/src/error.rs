//! Error types for the AI crate.
//!
//! - `CompletionFailure`: A completion attempt that produced no usable
//!   reply. Never fatal; callers substitute [`CompletionFailure::apology`].
//! - `ClientSetupError`: The HTTP client could not be constructed.

use std::fmt;

/// Shown to the user when the completion endpoint could not be reached.
pub const TRANSPORT_APOLOGY: &str = "An error occurred while processing your request.";

/// Shown to the user when the endpoint answered without a usable reply.
pub const INVALID_REPLY_APOLOGY: &str = "Received an invalid response from the AI service.";

/// Why a completion attempt produced no reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionFailure {
    /// Network error or non-2xx status.
    Transport {
        status: Option<u16>,
        reason: String,
    },
    /// The first choice had no content.
    EmptyReply,
    /// A 2xx body that is not a completion payload.
    InvalidResponse { reason: String },
}

impl CompletionFailure {
    /// Returns the fixed user-visible text substituted for the reply.
    #[must_use]
    pub const fn apology(&self) -> &'static str {
        match self {
            Self::Transport { .. } => TRANSPORT_APOLOGY,
            Self::EmptyReply | Self::InvalidResponse { .. } => INVALID_REPLY_APOLOGY,
        }
    }
}

impl fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport {
                status: Some(status),
                reason,
            } => write!(f, "completion request failed with status {status}: {reason}"),
            Self::Transport {
                status: None,
                reason,
            } => write!(f, "completion request failed: {reason}"),
            Self::EmptyReply => write!(f, "AI response is empty"),
            Self::InvalidResponse { reason } => {
                write!(f, "failed to parse completion response: {reason}")
            }
        }
    }
}

impl std::error::Error for CompletionFailure {}

/// The completion client could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSetupError {
    pub reason: String,
}

impl fmt::Display for ClientSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build completion client: {}", self.reason)
    }
}

impl std::error::Error for ClientSetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apology_by_failure_kind() {
        let transport = CompletionFailure::Transport {
            status: Some(502),
            reason: "bad gateway".to_string(),
        };
        assert_eq!(transport.apology(), TRANSPORT_APOLOGY);
        assert_eq!(CompletionFailure::EmptyReply.apology(), INVALID_REPLY_APOLOGY);
        assert_eq!(
            CompletionFailure::InvalidResponse {
                reason: "eof".to_string()
            }
            .apology(),
            INVALID_REPLY_APOLOGY
        );
    }

    #[test]
    fn completion_failure_display() {
        let err = CompletionFailure::Transport {
            status: Some(401),
            reason: "unauthorized".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("unauthorized"));
    }
}
