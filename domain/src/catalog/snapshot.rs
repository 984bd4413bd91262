//! Immutable tool catalog snapshot.
//!
//! A [`CatalogSnapshot`] is built once from the per-server discovery results
//! of a refresh and never mutated afterwards. Readers hold it behind an
//! `Arc` and a refresh publishes a completely new one.

use crate::tool::entities::{ToolDescriptor, tool_key};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Number of tools one server contributed to the merged set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerToolCount {
    pub server: String,
    pub count: usize,
}

/// Tools returned by one server during a refresh.
///
/// `tools` is empty when the server failed or timed out.
#[derive(Debug, Clone)]
pub struct ServerDiscovery {
    pub server: String,
    pub tools: Vec<ToolDescriptor>,
}

impl ServerDiscovery {
    pub fn new(server: impl Into<String>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            server: server.into(),
            tools,
        }
    }

    /// A server that contributed nothing (failure, timeout, cancellation).
    pub fn empty(server: impl Into<String>) -> Self {
        Self::new(server, Vec::new())
    }
}

/// Merged, deduplicated view of every tool discovered in one refresh.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    tools: Vec<ToolDescriptor>,
    /// Lowercased tool name -> index into `tools`
    index: HashMap<String, usize>,
    per_server_counts: Vec<ServerToolCount>,
    expires_at: Instant,
    refreshed_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Merge discovery results into a snapshot valid for `ttl`.
    ///
    /// Servers are merged in the order given; the first server to advertise
    /// a (case-insensitive) name wins and later duplicates are dropped.
    /// `per_server_counts` records how many tools each server contributed
    /// to the merged set, so the counts always sum to `len()`.
    pub fn merge(discoveries: Vec<ServerDiscovery>, ttl: Duration) -> Self {
        let mut tools = Vec::new();
        let mut index = HashMap::new();
        let mut per_server_counts = Vec::with_capacity(discoveries.len());

        for discovery in discoveries {
            let mut contributed = 0;
            for mut tool in discovery.tools {
                let key = tool.key();
                if index.contains_key(&key) {
                    continue;
                }
                tool.server = discovery.server.clone();
                index.insert(key, tools.len());
                tools.push(tool);
                contributed += 1;
            }
            per_server_counts.push(ServerToolCount {
                server: discovery.server,
                count: contributed,
            });
        }

        Self {
            tools,
            index,
            per_server_counts,
            expires_at: Instant::now() + ttl,
            refreshed_at: Utc::now(),
        }
    }

    /// Snapshot with no tools (zero servers configured).
    pub fn empty(ttl: Duration) -> Self {
        Self::merge(Vec::new(), ttl)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up a tool by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(&tool_key(name)).map(|&i| &self.tools[i])
    }

    pub fn per_server_counts(&self) -> &[ServerToolCount] {
        &self.per_server_counts
    }

    /// Contribution count of one server, if it was part of the refresh.
    pub fn count_for(&self, server: &str) -> Option<usize> {
        self.per_server_counts
            .iter()
            .find(|c| c.server == server)
            .map(|c| c.count)
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
