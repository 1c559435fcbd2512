//! Core identity types and utilities for chat-relay.
//!
//! This crate provides the foundational types and error handling shared by
//! the conversation, AI and router crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EventId, SessionKey};
