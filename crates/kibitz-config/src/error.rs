//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration document")]
    Json(#[from] serde_json::Error),

    /// The settings blob was valid JSON but not an object of dotted paths.
    #[error("settings blob must be a JSON object of dotted override paths")]
    BlobNotObject,

    /// An override path addressed into a non-object config node.
    #[error("invalid override path '{path}': {reason}")]
    BadOverride { path: String, reason: String },
}
