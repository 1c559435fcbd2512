//! Conversation session management.
//!
//! The session manager applies bootstrap/append/reset operations to the
//! transcript of one identity, round-tripping every change through the
//! [`TranscriptStore`].
//!
//! The store rewrites whole documents, so two interleaved load→append→save
//! cycles for the same identity would lose a turn. Callers hold the guard
//! returned by [`SessionManager::lock`] for the duration of a cycle.

use crate::error::SessionError;
use crate::message::Transcript;
use crate::store::TranscriptStore;
use chat_relay_core::SessionKey;
use rootcause::prelude::{Report, ResultExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Exclusive access to one identity's transcript.
pub type SessionGuard = OwnedMutexGuard<()>;

/// Owns the mapping from identity to transcript.
pub struct SessionManager {
    store: Arc<dyn TranscriptStore>,
    persona: String,
    locks: Mutex<HashMap<SessionKey, Arc<AsyncMutex<()>>>>,
}

impl SessionManager {
    /// Creates a session manager.
    ///
    /// `persona` is the system instruction seeded by [`Self::bootstrap`].
    #[must_use]
    pub fn new(store: Arc<dyn TranscriptStore>, persona: impl Into<String>) -> Self {
        Self {
            store,
            persona: persona.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to an identity's transcript.
    pub async fn lock(&self, key: &SessionKey) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody is holding or waiting on.
            locks.retain(|k, l| k == key || Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(*key).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn transcript(&self, key: &SessionKey) -> Transcript {
        self.store.load(key).await
    }

    /// Seeds the persona for an identity with no prior turns.
    ///
    /// Returns true if the persona was seeded, false if turns already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the seeded transcript cannot be persisted.
    pub async fn bootstrap(&self, key: &SessionKey) -> Result<bool, Report<SessionError>> {
        let mut transcript = self.store.load(key).await;
        if !transcript.seed_persona(self.persona.as_str()) {
            return Ok(false);
        }
        self.store
            .save(key, &transcript)
            .await
            .context(SessionError::Storage {
                identity: key.to_string(),
            })?;
        debug!(identity = %key, "Seeded persona");
        Ok(true)
    }

    /// Loads the transcript and appends a user turn.
    ///
    /// The returned transcript is not persisted.
    pub async fn append_user_turn(&self, key: &SessionKey, text: &str) -> Transcript {
        let mut transcript = self.store.load(key).await;
        transcript.push_user(text);
        transcript
    }

    /// Appends an assistant turn and persists the whole transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the last turn is not a user turn (nothing is
    /// appended) or if persisting fails (the turn stays appended in memory).
    pub async fn append_assistant_turn(
        &self,
        key: &SessionKey,
        transcript: &mut Transcript,
        text: &str,
    ) -> Result<(), Report<SessionError>> {
        transcript.push_assistant(text)?;
        self.store
            .save(key, transcript)
            .await
            .context(SessionError::Storage {
                identity: key.to_string(),
            })?;
        Ok(())
    }

    /// Deletes the identity's transcript. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    pub async fn reset(&self, key: &SessionKey) -> Result<bool, Report<SessionError>> {
        let existed = self
            .store
            .clear(key)
            .await
            .context(SessionError::Storage {
                identity: key.to_string(),
            })?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Role, Turn};
    use crate::store::FileTranscriptStore;
    use std::time::Duration;
    use tempfile::TempDir;

    const PERSONA: &str = "Hi, You are a helpful assistant!";

    fn manager() -> (TempDir, SessionManager) {
        let dir = TempDir::new().expect("tempdir");
        let store = FileTranscriptStore::new(dir.path());
        (dir, SessionManager::new(Arc::new(store), PERSONA))
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(1_i64);

        assert!(sessions.bootstrap(&key).await.expect("bootstrap"));
        assert!(!sessions.bootstrap(&key).await.expect("bootstrap"));

        let transcript = sessions.transcript(&key).await;
        assert_eq!(transcript.turns(), &[Turn::system(PERSONA)]);
    }

    #[tokio::test]
    async fn bootstrap_skips_existing_history() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(2_i64);

        let mut transcript = sessions.append_user_turn(&key, "hello").await;
        sessions
            .append_assistant_turn(&key, &mut transcript, "hi")
            .await
            .expect("append");

        assert!(!sessions.bootstrap(&key).await.expect("bootstrap"));
        let transcript = sessions.transcript(&key).await;
        assert!(transcript.turns().iter().all(|t| t.role != Role::System));
    }

    #[tokio::test]
    async fn user_turn_is_not_persisted_until_reply() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(3_i64);

        let mut transcript = sessions.append_user_turn(&key, "hello").await;
        assert_eq!(transcript.turns(), &[Turn::user("hello")]);
        assert!(sessions.transcript(&key).await.is_empty());

        sessions
            .append_assistant_turn(&key, &mut transcript, "hi there")
            .await
            .expect("append");

        let stored = sessions.transcript(&key).await;
        assert_eq!(
            stored.turns(),
            &[Turn::user("hello"), Turn::assistant("hi there")]
        );
    }

    #[tokio::test]
    async fn orphan_reply_is_rejected_and_not_saved() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(4_i64);
        let mut transcript = Transcript::new();

        let result = sessions
            .append_assistant_turn(&key, &mut transcript, "nobody asked")
            .await;

        assert!(result.is_err());
        assert!(transcript.is_empty());
        assert!(sessions.transcript(&key).await.is_empty());
    }

    #[tokio::test]
    async fn persona_survives_appends_until_reset() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(5_i64);
        sessions.bootstrap(&key).await.expect("bootstrap");

        let mut transcript = sessions.append_user_turn(&key, "q").await;
        sessions
            .append_assistant_turn(&key, &mut transcript, "a")
            .await
            .expect("append");

        let roles: Vec<Role> = sessions
            .transcript(&key)
            .await
            .turns()
            .iter()
            .map(|t| t.role)
            .collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        assert!(sessions.reset(&key).await.expect("reset"));
        assert!(sessions.transcript(&key).await.is_empty());
    }

    #[tokio::test]
    async fn reset_unseen_identity_is_noop() {
        let (_dir, sessions) = manager();
        let key = SessionKey::from(6_i64);

        assert!(!sessions.reset(&key).await.expect("reset"));
        assert!(sessions.transcript(&key).await.is_empty());
    }

    #[tokio::test]
    async fn identities_are_isolated() {
        let (_dir, sessions) = manager();
        let alice = SessionKey::from(10_i64);
        let bob = SessionKey::from(11_i64);

        let mut transcript = sessions.append_user_turn(&alice, "from alice").await;
        sessions
            .append_assistant_turn(&alice, &mut transcript, "to alice")
            .await
            .expect("append");

        assert!(sessions.transcript(&bob).await.is_empty());
        assert_eq!(sessions.transcript(&alice).await.len(), 2);
    }

    #[tokio::test]
    async fn lock_serializes_same_identity() {
        let (_dir, sessions) = manager();
        let sessions = Arc::new(sessions);
        let key = SessionKey::from(12_i64);

        let guard = sessions.lock(&key).await;

        let waiter = {
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move {
                let _guard = sessions.lock(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        // A different identity is not blocked.
        let _other = sessions.lock(&SessionKey::from(13_i64)).await;

        drop(guard);
        waiter.await.expect("waiter");
    }
}
