//! Shared result alias.
//!
//! Domain error enums live in the crate that raises them; this alias only
//! fixes the shape of a fallible return across crate boundaries.

use rootcause::Report;

/// A result whose error is a rootcause [`Report`] with context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
