//! # Outpost Kernel Errors
//!
//! [`Error`] aggregates the subsystem errors the orchestrator and the binary
//! can run into. Subsystem enums convert in through `#[from]`; the two
//! startup-fatal cases ([`Error::Connect`] and [`Error::CorePluginFailed`])
//! are built explicitly so the cause stays visible in the variant.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::kernel::phase::LifecyclePhase;
use crate::plugin_system::error::{PluginLifecycleError, RegistryError};
use crate::resource::ResourceError;
use crate::site::SiteError;
use crate::transport::TransportError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// The server session could not be established; nothing was loaded
    #[error("Connect error: {0}")]
    Connect(#[source] TransportError),

    /// A core plugin failed to load or start; startup was rolled back
    #[error("Core plugin failure: {0}")]
    CorePluginFailed(#[source] PluginLifecycleError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginLifecycleError),

    #[error("Plugin registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Resource tree error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Site error: {0}")]
    Site(#[from] SiteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation attempted in the wrong lifecycle phase
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError { phase: LifecyclePhase, message: String },

    #[error("I/O error during '{operation}' on '{}': {source}", .path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
