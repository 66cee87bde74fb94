//! # Outpost Plugin System Errors
//!
//! Defines error types specific to the Outpost Plugin System.
//!
//! [`PluginError`] is what a plugin's own entry hooks return. The supervisor
//! never lets it escape on its own: every failure crossing the supervisor
//! boundary is wrapped into a [`PluginLifecycleError`] naming the phase and
//! the plugin. [`RegistryError`] covers contract violations on the registry,
//! the factory catalog and the configured plugin set.
use std::path::PathBuf;

use crate::plugin_system::traits::PluginPhase;

/// Failure raised by a plugin's entry hooks or by its factory.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("No factory registered for plugin '{0}'")]
    FactoryNotFound(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plugin data in '{path}': {source}")]
    InvalidData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Resource subtree for '{0}' could not be mounted")]
    MountConflict(String),

    #[error("Registry rejected plugin: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Other(String),
}

impl PluginError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PluginError::Io { path: path.into(), source }
    }
}

impl From<&str> for PluginError {
    fn from(msg: &str) -> Self {
        PluginError::Other(msg.to_string())
    }
}

impl From<String> for PluginError {
    fn from(msg: String) -> Self {
        PluginError::Other(msg)
    }
}

/// A plugin failure caught at the supervisor boundary.
#[derive(Debug, thiserror::Error)]
#[error("plugin '{plugin_name}' failed to {phase}: {cause}")]
pub struct PluginLifecycleError {
    pub phase: PluginPhase,
    pub plugin_name: String,
    #[source]
    pub cause: PluginError,
}

impl PluginLifecycleError {
    pub fn new(phase: PluginPhase, plugin_name: impl Into<String>, cause: impl Into<PluginError>) -> Self {
        Self {
            phase,
            plugin_name: plugin_name.into(),
            cause: cause.into(),
        }
    }
}

/// Contract violations on the registry, the factory catalog or the plugin set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Plugin '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("Plugin '{0}' is not loaded")]
    NotLoaded(String),

    #[error("Plugin '{0}' is not part of the configured plugin set")]
    NotConfigured(String),

    #[error("Plugin '{0}' is configured more than once")]
    DuplicateConfigured(String),

    #[error("A factory is already registered for plugin '{0}'")]
    DuplicateFactory(String),

    #[error("Plugin name '{0}' is reserved by the platform")]
    ReservedName(String),
}
