//! Tool catalog: discovery with caching across independent servers.
//!
//! ```text
//! get_tools ──> fresh snapshot? ──yes──> return it (no lock, no I/O)
//!                    │ no
//!                    ▼
//!             refresh mutex ──> fresh now? ──yes──> return it
//!                    │ no
//!                    ▼
//!        fan-out ListTools to every server (own timeout each)
//!                    │
//!                    ▼
//!        merge in configured order ──> publish new snapshot
//! ```
//!
//! Concurrent callers within one TTL window trigger at most one fan-out.
//! A server that fails or times out contributes zero tools.

use crate::config::CatalogParams;
use crate::ports::tool_provider::ToolServer;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vaultpilot_domain::{CatalogSnapshot, ServerDiscovery};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog refresh cancelled")]
    Cancelled,
}

impl CatalogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

/// Process-wide tool catalog.
///
/// Constructed once at startup and shared via `Arc`. Readers of a fresh
/// snapshot only take a short read lock; refreshes are serialized by a
/// separate async mutex.
pub struct ToolCatalog {
    servers: Vec<Arc<dyn ToolServer>>,
    params: CatalogParams,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_lock: Mutex<()>,
    fan_outs: AtomicU64,
}

impl ToolCatalog {
    /// Servers are merged in the order given here.
    pub fn new(servers: Vec<Arc<dyn ToolServer>>, params: CatalogParams) -> Self {
        Self {
            servers,
            params,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            fan_outs: AtomicU64::new(0),
        }
    }

    pub fn params(&self) -> &CatalogParams {
        &self.params
    }

    pub fn servers(&self) -> &[Arc<dyn ToolServer>] {
        &self.servers
    }

    /// Look up a configured server by id.
    pub fn server(&self, id: &str) -> Option<&Arc<dyn ToolServer>> {
        self.servers.iter().find(|s| s.id() == id)
    }

    /// Number of remote fan-outs performed so far.
    pub fn fan_out_count(&self) -> u64 {
        self.fan_outs.load(Ordering::Relaxed)
    }

    /// Return the current snapshot, refreshing it if missing or expired.
    pub async fn get_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            guard = self.refresh_lock.lock() => guard,
        };

        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.fresh_snapshot() {
            debug!("Catalog refreshed by a concurrent caller");
            return Ok(snapshot);
        }

        let snapshot = Arc::new(self.refresh(cancel).await?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next `get_tools` refreshes.
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("Tool catalog invalidated");
    }

    /// Last published snapshot, even if expired.
    pub fn last_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh())
            .cloned()
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<CatalogSnapshot, CatalogError> {
        self.fan_outs.fetch_add(1, Ordering::Relaxed);
        info!(servers = self.servers.len(), "Refreshing tool catalog");

        // join_all keeps configured order, so the merge is deterministic
        // regardless of which server answers first.
        let discoveries = join_all(
            self.servers
                .iter()
                .map(|server| self.discover(server.as_ref(), cancel)),
        );
        let discoveries = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            discoveries = discoveries => discoveries,
        };

        let snapshot = CatalogSnapshot::merge(discoveries, self.params.ttl);
        for count in snapshot.per_server_counts() {
            debug!(server = %count.server, tools = count.count, "Server contribution");
        }
        info!(tools = snapshot.len(), "Tool catalog refreshed");
        Ok(snapshot)
    }

    async fn discover(&self, server: &dyn ToolServer, cancel: &CancellationToken) -> ServerDiscovery {
        let id = server.id();
        match tokio::time::timeout(self.params.discovery_timeout, server.list_tools(cancel)).await {
            Ok(Ok(tools)) => {
                debug!(server = %id, tools = tools.len(), "Discovered tools");
                ServerDiscovery::new(id, tools)
            }
            Ok(Err(e)) => {
                warn!(server = %id, error = %e, "Tool discovery failed; server contributes no tools");
                ServerDiscovery::empty(id)
            }
            Err(_) => {
                warn!(
                    server = %id,
                    timeout_ms = self.params.discovery_timeout.as_millis() as u64,
                    "Tool discovery timed out; server contributes no tools"
                );
                ServerDiscovery::empty(id)
            }
        }
    }
}
