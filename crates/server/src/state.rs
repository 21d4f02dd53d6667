use std::path::Path;
use std::sync::Arc;

use arnft_core::{ArtifactStore, Config, NftService, SanitizedConfig, StorageBackend};

/// Shared application state
pub struct AppState {
    config: Config,
    nft: Arc<NftService>,
}

impl AppState {
    pub fn new(config: Config, nft: Arc<NftService>) -> Self {
        Self { config, nft }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn nft(&self) -> &NftService {
        self.nft.as_ref()
    }

    /// Store shared by every upload path.
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        self.nft.store()
    }

    /// Directory served under `/outputs`, when artifacts are kept locally.
    pub fn outputs_dir(&self) -> Option<&Path> {
        match self.config.storage.backend {
            StorageBackend::Local => Some(self.config.storage.local.dir.as_path()),
            StorageBackend::S3 => None,
        }
    }
}
