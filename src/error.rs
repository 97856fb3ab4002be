//! Error types for the Lumen bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Lumen bridge
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing or malformed credential/setting)
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote hub rejected the login
    #[error("auth error: {0}")]
    Auth(String),

    /// Remote device handle could not be accessed (stale or unreachable)
    #[error("stale device: {0}")]
    StaleDevice(String),

    /// Host asked for a device identifier not present in the registry
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// Remote hub returned an unusable response
    #[error("remote hub error: {0}")]
    Remote(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
