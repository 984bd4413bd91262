//! On-disk transcripts for runtime threads.
//!
//! The thread store only remembers which runtime reference belongs to a
//! conversation. The messages behind that reference are kept here, one
//! `{dir}/{runtime_ref}.json` file per thread, so a restarted runtime can
//! pick a conversation up where it stopped.

use crate::fs::write_atomic;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runtime references are generated uuids; anything else is not a
    /// file this store could have written.
    fn transcript_path(&self, runtime_ref: &str) -> Option<PathBuf> {
        let safe = !runtime_ref.is_empty()
            && runtime_ref
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{runtime_ref}.json")))
    }

    /// Load a transcript. `Ok(None)` when no transcript exists.
    pub async fn load<T: DeserializeOwned>(&self, runtime_ref: &str) -> std::io::Result<Option<T>> {
        let Some(path) = self.transcript_path(runtime_ref) else {
            return Ok(None);
        };
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
    }

    pub async fn save<T: Serialize>(&self, runtime_ref: &str, transcript: &T) -> std::io::Result<()> {
        let path = self.transcript_path(runtime_ref).ok_or_else(|| {
            std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid runtime reference: {runtime_ref:?}"),
            )
        })?;
        let content = serde_json::to_string(transcript)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        write_atomic(&self.dir, &path, runtime_ref, &content).await
    }

    /// Idempotent.
    pub async fn remove(&self, runtime_ref: &str) -> std::io::Result<()> {
        let Some(path) = self.transcript_path(runtime_ref) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
