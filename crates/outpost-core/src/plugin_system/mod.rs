//! # Outpost Plugin System
//!
//! Owns the lifecycle of the plugins a client node runs. Plugins are
//! configured by name in two partitions: **core** plugins the node cannot
//! serve without, and **optional** plugins whose failures are logged and
//! tolerated.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: The [`Plugin`] trait (`load`, `start`, `stop`, `unload`)
//!   plus the [`Partition`], [`PluginPhase`] and [`PluginState`] enums.
//! - **[`catalog`]**: [`PluginCatalog`], the named factories plugin packages
//!   register. Resolving a configured name is a lookup here.
//! - **[`platform`]**: [`PlatformHook`], the per-plugin capabilities handed to
//!   a factory, including the plugin's own resource roots.
//! - **[`registry`]**: [`PluginSet`] (configured names) and
//!   [`PluginRegistry`] (loaded instances and their state).
//! - **[`supervisor`]**: [`PluginSupervisor`], which drives one lifecycle
//!   operation over one partition and reports per-plugin outcomes as a
//!   [`PhaseReport`].
//! - **[`error`]**: [`PluginError`], [`PluginLifecycleError`] and
//!   [`RegistryError`].
pub mod catalog;
pub mod error;
pub mod platform;
pub mod registry;
pub mod supervisor;
pub mod traits;

pub use catalog::{PluginCatalog, PluginFactory};
pub use error::{PluginError, PluginLifecycleError, RegistryError};
pub use platform::{PlatformHook, PlatformSettings};
pub use registry::{PluginRegistry, PluginSet, RegisteredPlugin};
pub use supervisor::{PhaseReport, PluginSupervisor};
pub use traits::{Partition, Plugin, PluginPhase, PluginState};

// Test module declaration
#[cfg(test)]
pub(crate) mod tests;
