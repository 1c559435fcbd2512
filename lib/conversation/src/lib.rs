//! Conversation service for chat-relay.
//!
//! This crate provides:
//!
//! - **Transcript**: Ordered, append-only turns of one session
//! - **Transcript Store**: Durable per-identity persistence
//! - **Session Manager**: Bootstrap/append/reset operations over the store

pub mod error;
pub mod message;
pub mod session;
pub mod store;

pub use error::{SessionError, StorageError};
pub use message::{Role, Transcript, Turn};
pub use session::{SessionGuard, SessionManager};
pub use store::{FileTranscriptStore, TranscriptStore};
