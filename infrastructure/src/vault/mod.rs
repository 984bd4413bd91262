//! Vault listing adapters

use crate::http;
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vaultpilot_application::{ProviderError, VaultListing};

/// Listing payload: either a bare array or `{ "paths": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Bare(Vec<String>),
    Wrapped { paths: Vec<String> },
}

impl ListingBody {
    fn into_paths(self) -> Vec<String> {
        match self {
            ListingBody::Bare(paths) | ListingBody::Wrapped { paths } => paths,
        }
    }
}

/// Fetches every note path from an HTTP endpoint (GET, JSON).
pub struct HttpVaultListing {
    url: String,
    client: reqwest::Client,
}

impl HttpVaultListing {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl VaultListing for HttpVaultListing {
    async fn list_all_paths(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, ProviderError> {
        let body: ListingBody = http::get_json(self.client.get(&self.url), cancel)
            .await
            .map_err(ProviderError::from)?;
        let paths = body.into_paths();
        debug!(count = paths.len(), "Fetched vault listing");
        Ok(paths)
    }
}

/// Used when no listing URL is configured; resolution then falls back to
/// plain normalization.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredVaultListing;

#[async_trait]
impl VaultListing for UnconfiguredVaultListing {
    async fn list_all_paths(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::Unavailable(
            "no vault listing URL configured".to_string(),
        ))
    }
}
