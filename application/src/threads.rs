//! In-memory thread store.
//!
//! Handles are spread over independently locked shards, so lookups from
//! unrelated conversations rarely contend. All state is lost on restart;
//! the infrastructure layer provides a file-backed variant.

use crate::ports::thread_store::{ThreadStore, ThreadStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};
use vaultpilot_domain::{ThreadHandle, ThreadId};

const DEFAULT_SHARDS: usize = 16;

type Shard = RwLock<HashMap<ThreadId, ThreadHandle>>;

pub struct ShardedThreadStore {
    shards: Vec<Shard>,
}

impl Default for ShardedThreadStore {
    fn default() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }
}

impl ShardedThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shards(count: usize) -> Self {
        Self {
            shards: (0..count.max(1)).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, id: &ThreadId) -> &Shard {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, handle: ThreadHandle) -> ThreadId {
        let id = handle.id.clone();
        self.shard(&id)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), handle);
        id
    }
}

#[async_trait]
impl ThreadStore for ShardedThreadStore {
    async fn create(&self) -> Result<ThreadHandle, ThreadStoreError> {
        let id = ThreadId::generate();
        let handle = ThreadHandle::new(id.clone(), id.as_str());
        self.insert(handle.clone());
        Ok(handle)
    }

    async fn get(&self, id: &ThreadId) -> Result<Option<ThreadHandle>, ThreadStoreError> {
        Ok(self
            .shard(id)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn register(&self, handle: ThreadHandle) -> Result<ThreadId, ThreadStoreError> {
        Ok(self.insert(handle))
    }

    async fn delete(&self, id: &ThreadId) -> Result<(), ThreadStoreError> {
        self.shard(id)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ThreadStoreError> {
        for shard in &self.shards {
            shard.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_get_delete() {
        let store = ShardedThreadStore::new();
        let id = store
            .register(ThreadHandle::new("conv-1", "runtime-abc"))
            .await
            .unwrap();

        let handle = store.get(&id).await.unwrap().unwrap();
        assert_eq!(handle.runtime_ref, "runtime-abc");

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        // Deleting twice is fine
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_registers_fresh_handle() {
        let store = ShardedThreadStore::new();
        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.get(&a.id).await.unwrap(), Some(a));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_register_replaces_existing_handle() {
        let store = ShardedThreadStore::new();
        store.register(ThreadHandle::new("conv-1", "old")).await.unwrap();
        store.register(ThreadHandle::new("conv-1", "new")).await.unwrap();

        let handle = store.get(&ThreadId::new("conv-1")).await.unwrap().unwrap();
        assert_eq!(handle.runtime_ref, "new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conversations() {
        let store = Arc::new(ShardedThreadStore::with_shards(4));
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("conv-{i}");
                store
                    .register(ThreadHandle::new(id.as_str(), format!("rt-{i}")))
                    .await
                    .unwrap();
                store.get(&ThreadId::new(id)).await.unwrap().unwrap().runtime_ref
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!("rt-{i}"));
        }
        assert_eq!(store.len(), 64);

        store.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
