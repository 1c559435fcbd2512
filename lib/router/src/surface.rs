//! User surface abstraction.
//!
//! A surface is where replies for one inbound event go: the console, or a
//! single chat on a messaging platform.

use crate::error::SurfaceError;
use async_trait::async_trait;
use rootcause::prelude::Report;

/// How reply text should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Sent verbatim.
    Plain,
    /// Rendered with the surface's rich-text markup.
    Rich,
}

/// Handle to a transient placeholder shown while a reply is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(pub i64);

/// Trait for reply surfaces.
#[async_trait]
pub trait ReplySurface: Send + Sync {
    /// Sends one piece of model output.
    ///
    /// # Errors
    ///
    /// Returns an error if the text could not be delivered.
    async fn send(&self, text: &str, format: TextFormat) -> Result<(), Report<SurfaceError>>;

    /// Sends a fixed system notice (welcome, clear confirmation, apology).
    ///
    /// # Errors
    ///
    /// Returns an error if the text could not be delivered.
    async fn notify(&self, text: &str) -> Result<(), Report<SurfaceError>> {
        self.send(text, TextFormat::Plain).await
    }

    /// Shows a transient "processing" placeholder.
    ///
    /// Surfaces without placeholders return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder could not be shown.
    async fn show_placeholder(
        &self,
        _text: &str,
    ) -> Result<Option<PlaceholderId>, Report<SurfaceError>> {
        Ok(None)
    }

    /// Removes a placeholder shown by [`Self::show_placeholder`].
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder could not be removed.
    async fn remove_placeholder(&self, _id: PlaceholderId) -> Result<(), Report<SurfaceError>> {
        Ok(())
    }
}
