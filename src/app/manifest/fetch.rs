//! Remote manifest retrieval with compiled-in fallback

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::client::Origin;
use crate::errors::ManifestResult;

use super::types::{CatalogManifest, FetchedManifest, ManifestConfig, ManifestSource};

/// Downloads the catalog manifest from the origin
pub struct ManifestFetcher {
    origin: Arc<dyn Origin>,
    path: String,
}

impl ManifestFetcher {
    pub fn new(origin: Arc<dyn Origin>, config: &ManifestConfig) -> Self {
        Self {
            origin,
            path: config.path(),
        }
    }

    /// Origin-relative path being fetched
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch the manifest, bypassing intermediary caches
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` for network failures, malformed JSON or an
    /// inverted date range
    pub async fn try_fetch_manifest(&self) -> ManifestResult<CatalogManifest> {
        let object = self.origin.fetch(&self.path, true).await?;
        let manifest = CatalogManifest::from_json(&object.bytes)?;
        debug!(
            "Remote manifest v{}: {} to {}",
            manifest.version, manifest.start_date, manifest.end_date
        );
        Ok(manifest)
    }

    /// Fetch the manifest, falling back to the compiled-in one on any failure
    pub async fn fetch_manifest(&self) -> FetchedManifest {
        match self.try_fetch_manifest().await {
            Ok(manifest) => {
                info!("Using remote manifest version {}", manifest.version);
                FetchedManifest {
                    manifest,
                    source: ManifestSource::Remote,
                }
            }
            Err(e) => {
                warn!("Manifest unavailable ({}), using built-in fallback", e);
                FetchedManifest {
                    manifest: CatalogManifest::fallback(),
                    source: ManifestSource::Fallback,
                }
            }
        }
    }
}
