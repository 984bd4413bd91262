//! Path resolver: loose note names to canonical vault paths.
//!
//! Resolution never fails. When the listing service is unreachable or no
//! entry matches, the normalized candidate is returned unchanged.

use crate::ports::vault_listing::VaultListing;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vaultpilot_domain::PathNormalizer;

pub struct PathResolver {
    listing: Arc<dyn VaultListing>,
    normalizer: PathNormalizer,
}

impl PathResolver {
    pub fn new(listing: Arc<dyn VaultListing>, normalizer: PathNormalizer) -> Self {
        Self {
            listing,
            normalizer,
        }
    }

    pub fn normalize(&self, candidate: &str) -> String {
        self.normalizer.normalize(candidate)
    }

    /// Resolve `candidate` against the authoritative vault listing.
    pub async fn resolve(&self, candidate: &str, cancel: &CancellationToken) -> String {
        let listing = match self.listing.list_all_paths(cancel).await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(candidate, error = %e, "Vault listing unavailable; using normalized path");
                return self.normalize(candidate);
            }
        };

        match self.normalizer.select_match(candidate, &listing) {
            Some(path) => {
                debug!(candidate, resolved = path, "Resolved vault path");
                path.to_string()
            }
            None => {
                debug!(candidate, "No vault path matched; using normalized path");
                self.normalize(candidate)
            }
        }
    }
}
