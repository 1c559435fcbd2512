//! Durable transcript storage.
//!
//! One JSON document per session identity. Every save rewrites the whole
//! document; there is no append log and no versioning.

use crate::error::StorageError;
use crate::message::{Transcript, Turn};
use async_trait::async_trait;
use chat_relay_core::SessionKey;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Trait for transcript persistence.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Loads the transcript for a session.
    ///
    /// A missing or unreadable record yields an empty transcript; this never
    /// fails the caller.
    async fn load(&self, key: &SessionKey) -> Transcript;

    /// Overwrites the persisted record with the full transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn save(&self, key: &SessionKey, transcript: &Transcript)
    -> Result<(), Report<StorageError>>;

    /// Deletes the persisted record. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    async fn clear(&self, key: &SessionKey) -> Result<bool, Report<StorageError>>;
}

/// On-disk document written by [`FileTranscriptStore`].
#[derive(Serialize)]
struct RecordRef<'a> {
    messages: &'a [Turn],
}

/// Accepted on-disk shapes. Older records are a bare array of turns.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Document { messages: Vec<Turn> },
    Legacy(Vec<Turn>),
}

impl From<StoredRecord> for Transcript {
    fn from(record: StoredRecord) -> Self {
        match record {
            StoredRecord::Document { messages } | StoredRecord::Legacy(messages) => {
                Transcript::from_turns(messages)
            }
        }
    }
}

/// Stores each transcript as `<root>/<record name>.json`.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    root: PathBuf,
}

impl FileTranscriptStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the record path for a session.
    #[must_use]
    pub fn record_path(&self, key: &SessionKey) -> PathBuf {
        self.root.join(format!("{}.json", key.record_name()))
    }

    fn io_error(operation: &'static str, path: &Path, err: &std::io::Error) -> StorageError {
        StorageError::Io {
            operation,
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Encodes a transcript as a pretty-printed document with 4-space indent.
fn encode(transcript: &Transcript) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    RecordRef {
        messages: transcript.turns(),
    }
    .serialize(&mut serializer)
    .map_err(|e| StorageError::Serialize {
        reason: e.to_string(),
    })?;
    Ok(buf)
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn load(&self, key: &SessionKey) -> Transcript {
        let path = self.record_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(identity = %key, "No conversation history, starting new chat");
                return Transcript::new();
            }
            Err(e) => {
                warn!(
                    identity = %key,
                    path = %path.display(),
                    error = %e,
                    "Failed to read conversation history, starting fresh"
                );
                return Transcript::new();
            }
        };

        match serde_json::from_slice::<StoredRecord>(&bytes) {
            Ok(record) => record.into(),
            Err(e) => {
                warn!(
                    identity = %key,
                    path = %path.display(),
                    error = %e,
                    "Failed to decode conversation history, starting fresh"
                );
                Transcript::new()
            }
        }
    }

    async fn save(
        &self,
        key: &SessionKey,
        transcript: &Transcript,
    ) -> Result<(), Report<StorageError>> {
        let body = encode(transcript)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Self::io_error("create directory for", &self.root, &e))?;

        let path = self.record_path(key);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(|e| Self::io_error("write", &tmp_path, &e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Self::io_error("replace", &path, &e))?;

        debug!(identity = %key, turns = transcript.len(), "Saved conversation");
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> Result<bool, Report<StorageError>> {
        let path = self.record_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error("delete", &path, &e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileTranscriptStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = FileTranscriptStore::new(dir.path().join("data"));
        (dir, store)
    }

    fn sample() -> Transcript {
        Transcript::from_turns(vec![
            Turn::system("Hi, You are a helpful assistant!"),
            Turn::user("Привет"),
            Turn::assistant("Hello! 👋"),
        ])
    }

    #[tokio::test]
    async fn load_unseen_identity_is_empty() {
        let (_dir, store) = store();
        let transcript = store.load(&SessionKey::from(7_i64)).await;
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let key = SessionKey::from(42_i64);
        let transcript = sample();

        store.save(&key, &transcript).await.expect("save");
        assert_eq!(store.load(&key).await, transcript);
    }

    #[tokio::test]
    async fn record_is_pretty_printed_with_messages_field() {
        let (_dir, store) = store();
        let key = SessionKey::Console;
        store.save(&key, &sample()).await.expect("save");

        let path = store.record_path(&key);
        assert!(path.ends_with("data/user.json"));

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("{\n    \"messages\": ["));
        assert!(text.contains("Привет"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let (_dir, store) = store();
        let key = SessionKey::from(1_i64);
        store.save(&key, &sample()).await.expect("save");

        let shorter = Transcript::from_turns(vec![Turn::user("only")]);
        store.save(&key, &shorter).await.expect("save");

        assert_eq!(store.load(&key).await, shorter);
    }

    #[tokio::test]
    async fn legacy_array_record_is_normalized() {
        let (_dir, store) = store();
        let key = SessionKey::from(5_i64);
        let dir = store.record_path(&key).parent().expect("parent").to_path_buf();
        std::fs::create_dir_all(dir).expect("mkdir");
        std::fs::write(
            store.record_path(&key),
            r#"[{"role": "user", "content": "old"}, {"role": "assistant", "content": "format"}]"#,
        )
        .expect("write");

        let transcript = store.load(&key).await;
        assert_eq!(
            transcript.turns(),
            &[Turn::user("old"), Turn::assistant("format")]
        );
    }

    #[tokio::test]
    async fn corrupt_record_loads_as_empty() {
        let (_dir, store) = store();
        let key = SessionKey::from(9_i64);
        let dir = store.record_path(&key).parent().expect("parent").to_path_buf();
        std::fs::create_dir_all(dir).expect("mkdir");
        std::fs::write(store.record_path(&key), "{not json").expect("write");

        assert!(store.load(&key).await.is_empty());

        std::fs::write(store.record_path(&key), r#"{"history": []}"#).expect("write");
        assert!(store.load(&key).await.is_empty());
    }

    #[tokio::test]
    async fn clear_reports_whether_record_existed() {
        let (_dir, store) = store();
        let key = SessionKey::from(3_i64);

        assert!(!store.clear(&key).await.expect("clear"));

        store.save(&key, &sample()).await.expect("save");
        assert!(store.clear(&key).await.expect("clear"));
        assert!(!store.clear(&key).await.expect("clear"));
        assert!(store.load(&key).await.is_empty());
    }

    #[tokio::test]
    async fn save_fails_when_root_is_a_file() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").expect("write");

        let store = FileTranscriptStore::new(blocker.clone());
        let result = store.save(&SessionKey::Console, &sample()).await;
        assert!(result.is_err());
    }
}
