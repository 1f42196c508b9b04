//! Error types shared by the ports and infrastructure layers.

use std::path::PathBuf;

/// Errors raised while obtaining the syntax tree of one file.
#[derive(Debug, thiserror::Error)]
pub enum TreeSourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode tree for {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("tree service at {endpoint} unreachable: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tree service protocol error: {0}")]
    Protocol(String),

    #[error("tree service could not parse {path}: {message}")]
    Rejected { path: PathBuf, message: String },

    #[error("tree cache error: {0}")]
    Cache(String),
}

impl TreeSourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TreeSourceError::Connect { .. } | TreeSourceError::Protocol(_))
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
