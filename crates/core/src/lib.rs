pub mod config;
pub mod marker;
pub mod metrics;
pub mod nft;
pub mod storage;
pub mod testing;
pub mod video;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig, ServerConfig,
};
pub use marker::{
    CompileError, CompileProgress, CompiledMarker, MarkerCompiler, MarkerConfig, WorkerCompiler,
};
pub use nft::{NftArtifacts, NftError, NftService};
pub use storage::{
    create_store, ArtifactKey, ArtifactStore, FsStore, S3Store, StorageBackend, StorageConfig,
    StorageError, StoredArtifact,
};
pub use video::{
    GeneratedVideo, GenerationError, NovitaGenerator, VideoConfig, VideoGenerator,
};
