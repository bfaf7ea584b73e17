//! Error types for the core crate
use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration is structurally valid but semantically wrong
    #[error("Config error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A vibe, mood or effect name that is not part of the vocabulary
    #[error("Unknown {kind}: {name}")]
    UnknownName {
        /// Vocabulary the name was looked up in
        kind: &'static str,
        /// Offending name
        name: String,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
