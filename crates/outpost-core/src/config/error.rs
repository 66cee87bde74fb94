use std::path::PathBuf;

use thiserror::Error;

use crate::plugin_system::error::RegistryError;

/// Errors raised while reading or validating the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown or unsupported config format for path: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: String, message: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid plugin lists: {0}")]
    InvalidPluginSet(#[from] RegistryError),
}
