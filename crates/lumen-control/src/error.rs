//! Error types for the conscious engine
use lumen_core::CoreError;
use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Error bubbled up from a pipeline component or the configuration
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// A dream simulator failed to produce a verdict
    #[error("Simulation error: {0}")]
    Simulation(String),

    /// The confirmation channel has no receiver any more
    #[error("Confirmation channel closed")]
    ChannelClosed,

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ControlError>;
