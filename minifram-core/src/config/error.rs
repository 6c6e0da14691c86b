use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("inference model must not be empty")]
    MissingModel,

    #[error("inference endpoint must not be empty")]
    MissingEndpoint,

    #[error("invalid server address '{addr}': {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("tool server '{name}' is configured more than once")]
    DuplicateServer { name: String },

    #[error("tool server entry #{index} has an empty {field}")]
    InvalidServer { index: usize, field: &'static str },
}
