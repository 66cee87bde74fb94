use std::fmt;
use async_trait::async_trait;

use crate::plugin_system::error::PluginError;

/// The four entry hooks, in the order the supervisor calls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginPhase {
    Load,
    Start,
    Stop,
    Unload,
}

impl fmt::Display for PluginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginPhase::Load => write!(f, "load"),
            PluginPhase::Start => write!(f, "start"),
            PluginPhase::Stop => write!(f, "stop"),
            PluginPhase::Unload => write!(f, "unload"),
        }
    }
}

/// Partition of the configured plugin list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Required for baseline operation. Loaded/started first, stopped/unloaded last.
    Core,
    /// Loaded/started after core and independently failable.
    Optional,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Core => write!(f, "core"),
            Partition::Optional => write!(f, "optional"),
        }
    }
}

/// Where a registered plugin currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// `load` succeeded; not serving.
    Loaded,
    /// `start` succeeded; subtree mounted.
    Started,
    /// `stop` was called after a start.
    Stopped,
}

/// Entry-hook contract every plugin package implements.
///
/// The supervisor calls the hooks strictly in the order
/// `load` → `start` → `stop` → `unload` and never skips one: a plugin that is
/// still started when it is unloaded gets `stop` first. Plugins keep their
/// mutable state behind their own synchronisation since the registry shares
/// instances as `Arc<dyn Plugin>`.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The name the plugin was constructed with
    fn name(&self) -> &str;

    /// Parse and prepare the plugin's own resources. Must not accept traffic yet.
    async fn load(&self) -> Result<(), PluginError>;

    /// Begin serving and subscribing.
    async fn start(&self) -> Result<(), PluginError>;

    /// Cease serving and release external subscriptions.
    async fn stop(&self) -> Result<(), PluginError>;

    /// Release all remaining resources.
    async fn unload(&self) -> Result<(), PluginError>;
}
