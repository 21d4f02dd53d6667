//! Types for the nft module.

use serde::{Deserialize, Serialize};

use crate::storage::ArtifactKey;

/// The artifacts produced for one image. Both are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftArtifacts {
    pub marker_url: String,
    pub video_url: String,
    pub marker_key: ArtifactKey,
    pub video_key: ArtifactKey,
}
