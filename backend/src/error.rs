//! Error types for the MysticChests backend
//!
//! The core library surfaces codec, compression and store-open failures
//! as their own types; this module wraps them together with the
//! backend's configuration errors for the daemon and command surface.

use thiserror::Error;

use mysticchests_shared::{ChestError, StoreError};

/// Main error type for the MysticChests backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Opening the chest database failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A single chest's payload could not be read or written
    #[error("Chest error: {0}")]
    Chest(#[from] ChestError),

    /// File system operation errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// Internal daemon errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("Configuration parsing failed: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
