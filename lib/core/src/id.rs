//! Identity types.
//!
//! A [`SessionKey`] names the owner of one conversation transcript. Event
//! IDs use ULID, so log lines for one inbound event can be correlated.

use std::borrow::Cow;
use std::fmt;
use ulid::Ulid;

/// Record name used for the single implicit console session.
const CONSOLE_RECORD: &str = "user";

/// The owner of a conversation transcript.
///
/// The console entry point has exactly one implicit session. The messaging
/// entry point keys sessions by the platform's numeric user identifier,
/// which also makes every record name a safe file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// The single console session.
    Console,
    /// A messaging-platform user.
    User(i64),
}

impl SessionKey {
    /// Returns the stable name of the persisted record for this key.
    #[must_use]
    pub fn record_name(&self) -> Cow<'static, str> {
        match self {
            Self::Console => Cow::Borrowed(CONSOLE_RECORD),
            Self::User(id) => Cow::Owned(id.to_string()),
        }
    }
}

impl From<i64> for SessionKey {
    fn from(id: i64) -> Self {
        Self::User(id)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("console"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Unique identifier for one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(Ulid);

impl EventId {
    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt_{}", self.0)
    }
}
