//! File-backed thread store.
//!
//! Each handle lives in `{base_path}/{id}.json`. Handles are loaded lazily
//! on first `get` and cached in memory afterwards, so a restarted process
//! picks up existing conversations without scanning the directory.

use crate::fs::write_atomic;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};
use vaultpilot_application::{ThreadStore, ThreadStoreError};
use vaultpilot_domain::{ThreadHandle, ThreadId};

pub struct FileThreadStore {
    base_path: PathBuf,
    cache: RwLock<HashMap<ThreadId, ThreadHandle>>,
}

impl FileThreadStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn thread_path(&self, id: &ThreadId) -> Result<PathBuf, ThreadStoreError> {
        Self::validate_id(id.as_str())?;
        Ok(self.base_path.join(format!("{}.json", id)))
    }

    /// Reject ids that are not safe as a file name.
    fn validate_id(id: &str) -> Result<(), ThreadStoreError> {
        if id.is_empty() {
            return Err(ThreadStoreError::InvalidId(
                "thread id cannot be empty".to_string(),
            ));
        }
        if id.contains('/') || id.contains('\\') || id.contains("..") || id.contains('\0') {
            return Err(ThreadStoreError::InvalidId(format!(
                "thread id contains invalid characters: {id:?}"
            )));
        }
        if id.chars().any(|c| c.is_control()) {
            return Err(ThreadStoreError::InvalidId(format!(
                "thread id contains control characters: {id:?}"
            )));
        }
        Ok(())
    }

    fn cached(&self, id: &ThreadId) -> Option<ThreadHandle> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn remember(&self, handle: ThreadHandle) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id.clone(), handle);
    }

    fn forget(&self, id: &ThreadId) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    async fn load(&self, id: &ThreadId) -> Result<Option<ThreadHandle>, ThreadStoreError> {
        let path = self.thread_path(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let handle: ThreadHandle =
            serde_json::from_str(&content).map_err(|e| ThreadStoreError::Corrupt {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        if handle.id != *id {
            return Err(ThreadStoreError::Corrupt {
                id: id.to_string(),
                message: format!("file holds thread {}", handle.id),
            });
        }
        Ok(Some(handle))
    }

    async fn save(&self, handle: &ThreadHandle) -> Result<(), ThreadStoreError> {
        let path = self.thread_path(&handle.id)?;
        let content = serde_json::to_string_pretty(handle)
            .map_err(|e| ThreadStoreError::Other(e.to_string()))?;
        write_atomic(&self.base_path, &path, handle.id.as_str(), &content).await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for FileThreadStore {
    async fn create(&self) -> Result<ThreadHandle, ThreadStoreError> {
        let id = ThreadId::generate();
        let handle = ThreadHandle::new(id.clone(), id.as_str());
        self.save(&handle).await?;
        self.remember(handle.clone());
        Ok(handle)
    }

    async fn get(&self, id: &ThreadId) -> Result<Option<ThreadHandle>, ThreadStoreError> {
        if let Some(handle) = self.cached(id) {
            return Ok(Some(handle));
        }
        let loaded = self.load(id).await?;
        if let Some(handle) = &loaded {
            debug!(thread = %id, "Loaded thread handle from disk");
            self.remember(handle.clone());
        }
        Ok(loaded)
    }

    async fn register(&self, handle: ThreadHandle) -> Result<ThreadId, ThreadStoreError> {
        self.save(&handle).await?;
        let id = handle.id.clone();
        self.remember(handle);
        Ok(id)
    }

    async fn delete(&self, id: &ThreadId) -> Result<(), ThreadStoreError> {
        let path = self.thread_path(id)?;
        self.forget(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), ThreadStoreError> {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove thread file");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FileThreadStore::new(dir.path());

        let id = store
            .register(ThreadHandle::new("conv-1", "runtime-abc"))
            .await
            .unwrap();
        assert!(dir.path().join("conv-1.json").exists());

        let handle = store.get(&id).await.unwrap().unwrap();
        assert_eq!(handle.runtime_ref, "runtime-abc");
    }

    #[tokio::test]
    async fn test_lazy_reconstruction_after_restart() {
        let dir = TempDir::new().unwrap();
        let created = {
            let store = FileThreadStore::new(dir.path());
            store.create().await.unwrap()
        };

        let restarted = FileThreadStore::new(dir.path());
        let loaded = restarted.get(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_missing_thread_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileThreadStore::new(dir.path().join("not-yet-created"));
        assert!(store.get(&ThreadId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileThreadStore::new(dir.path());
        let id = store
            .register(ThreadHandle::new("conv-1", "rt"))
            .await
            .unwrap();

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_unsafe_ids() {
        let dir = TempDir::new().unwrap();
        let store = FileThreadStore::new(dir.path());

        for id in ["", "../escape", "a/b", "a\\b", "bad\nid"] {
            let err = store.get(&ThreadId::new(id)).await.unwrap_err();
            assert!(matches!(err, ThreadStoreError::InvalidId(_)), "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_corrupt_record() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("conv-1.json"), "{not json").unwrap();
        let store = FileThreadStore::new(dir.path());

        let err = store.get(&ThreadId::new("conv-1")).await.unwrap_err();
        assert!(matches!(err, ThreadStoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_clear_removes_files() {
        let dir = TempDir::new().unwrap();
        let store = FileThreadStore::new(dir.path());
        store.register(ThreadHandle::new("a", "1")).await.unwrap();
        store.register(ThreadHandle::new("b", "2")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get(&ThreadId::new("a")).await.unwrap().is_none());
        assert!(!dir.path().join("b.json").exists());
    }
}
