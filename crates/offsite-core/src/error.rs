use thiserror::Error;

/// All the ways things can go wrong in offsite
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Install failed: {0}")]
    InstallError(String),

    #[error("Lifecycle violation: {0}")]
    LifecycleError(String),

    #[error("Cache operation failed: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Origin fetch failed: {0}")]
    OriginError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] offsite_cache::StoreError),

    #[error("Network error: {0}")]
    NetworkError(#[from] offsite_net::OriginError),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
