//! NFT asset creation.
//!
//! [`NftService`] runs the stages that turn one uploaded image into a
//! tracking marker and a companion video:
//!
//! 1. compile the marker
//! 2. upload the marker
//! 3. generate the video (the generator uploads it)
//!
//! Stages are gated: a failed stage stops the sequence and its error is
//! returned unchanged. Artifacts uploaded by earlier stages are kept.

mod error;
mod service;
mod types;

pub use error::NftError;
pub use service::NftService;
pub use types::NftArtifacts;
