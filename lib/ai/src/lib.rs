//! Completion primitives for chat-relay.
//!
//! This crate provides a single primitive: send the full transcript of a
//! session to a remote chat-completion model and get one reply back.
//!
//! - **Backend**: The [`CompletionBackend`] trait and request/response wire types
//! - **Client**: [`ChatCompletionClient`], an OpenAI-compatible HTTP backend

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{CompletionBackend, CompletionRequest, CompletionResponse};
pub use client::{ChatCompletionClient, ClientSettings};
pub use error::{ClientSetupError, CompletionFailure};
