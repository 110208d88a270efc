//! Error types for the Managed SAN reconciler

use thiserror::Error;

/// Result type alias using the reconciler Error
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Lookup by name returned nothing. Carries the fixed operator-facing message.
    #[error("{0}")]
    ResourceNotFound(String),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed resource: {0}")]
    MalformedResource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("OneView API error (HTTP {status}, {error_code}): {message}")]
    Api {
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("Task {uri} ended in state {state}: {message}")]
    TaskFailed {
        uri: String,
        state: String,
        message: String,
    },

    #[error("Operation timeout after {seconds}s")]
    Timeout { seconds: u64 },
}

impl Error {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField { field: field.into() }
    }

    /// True for the reconciliation not-found failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound(_))
    }
}
