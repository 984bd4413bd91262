//! Vault and thread storage configuration (`[vault]`, `[threads]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vaultpilot_domain::vault::DEFAULT_EXTENSION;

/// ```toml
/// [vault]
/// listing_url = "http://localhost:3010/paths"
/// extension = ".md"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVaultConfig {
    /// GET endpoint returning every note path; resolution falls back to
    /// plain normalization when unset.
    pub listing_url: Option<String>,
    pub extension: String,
}

impl Default for FileVaultConfig {
    fn default() -> Self {
        Self {
            listing_url: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// ```toml
/// [threads]
/// directory = "~/.local/share/vaultpilot/threads"
/// ```
///
/// Threads are kept in memory only when `directory` is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileThreadsConfig {
    pub directory: Option<PathBuf>,
}

impl FileThreadsConfig {
    /// `directory` with a leading `~` expanded.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        let dir = self.directory.as_ref()?;
        match dir.strip_prefix("~") {
            Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
            Err(_) => Some(dir.clone()),
        }
    }
}
