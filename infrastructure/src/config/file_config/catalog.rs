//! Tool catalog configuration from TOML (`[catalog]` and `[[servers]]`)

use super::issue::{ConfigIssue, ConfigValidationError, zero_timeout};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use vaultpilot_application::CatalogParams;

/// ```toml
/// [catalog]
/// ttl_secs = 300
/// discovery_timeout_secs = 10
/// call_timeout_secs = 60
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    pub ttl_secs: u64,
    pub discovery_timeout_secs: u64,
    pub call_timeout_secs: u64,
}

impl Default for FileCatalogConfig {
    fn default() -> Self {
        let defaults = CatalogParams::default();
        Self {
            ttl_secs: defaults.ttl.as_secs(),
            discovery_timeout_secs: defaults.discovery_timeout.as_secs(),
            call_timeout_secs: defaults.call_timeout.as_secs(),
        }
    }
}

impl FileCatalogConfig {
    pub fn to_params(&self) -> CatalogParams {
        CatalogParams {
            ttl: Duration::from_secs(self.ttl_secs),
            discovery_timeout: Duration::from_secs(self.discovery_timeout_secs),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// One tool provider server. Order in the file is merge order.
///
/// ```toml
/// [[servers]]
/// id = "vault"
/// url = "http://localhost:3010/rpc"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileServerConfig {
    pub id: String,
    pub url: String,
}

pub(crate) fn validate(catalog: &FileCatalogConfig, servers: &[FileServerConfig]) -> Vec<ConfigIssue> {
    // A zero TTL is allowed: it disables caching.
    let mut issues: Vec<ConfigIssue> = [
        zero_timeout("catalog.discovery_timeout_secs", catalog.discovery_timeout_secs),
        zero_timeout("catalog.call_timeout_secs", catalog.call_timeout_secs),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut seen = HashSet::new();
    for server in servers {
        if !seen.insert(server.id.as_str()) {
            issues.push(ConfigIssue::error(ConfigValidationError::DuplicateServerId(
                server.id.clone(),
            )));
        }
        if server.url.trim().is_empty() {
            issues.push(ConfigIssue::error(ConfigValidationError::EmptyServerUrl(
                server.id.clone(),
            )));
        }
    }
    issues
}
