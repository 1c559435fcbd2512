//! Message routing for chat-relay.
//!
//! This crate sits between a user surface (console or messaging platform)
//! and the conversation/completion crates:
//!
//! - **Config**: [`RelayConfig`] built once at startup and injected
//! - **Router**: Dispatches start/clear/message events and runs the relay pipeline
//! - **Surface**: The [`ReplySurface`] trait implemented by each entry point
//! - **Chunking**: Splits oversized replies on a fixed character boundary

pub mod chunk;
pub mod config;
pub mod error;
pub mod router;
pub mod surface;

pub use chunk::split_text;
pub use config::{REQUIRED_SETTINGS, RelayConfig};
pub use error::{ConfigError, RelayError, SurfaceError};
pub use router::{
    EventKind, EventOutcome, InboundEvent, MessageRouter, PROCESSING_PLACEHOLDER, RouterSettings,
};
pub use surface::{PlaceholderId, ReplySurface, TextFormat};
