use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::error::RegistryError;
use crate::plugin_system::platform::PlatformHook;
use crate::plugin_system::traits::{Partition, Plugin, PluginState};

/// The configured plugins, split into core and optional, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSet {
    core: Vec<String>,
    optional: Vec<String>,
}

impl PluginSet {
    /// Build a plugin set. A name may appear only once across both partitions.
    pub fn new(core: Vec<String>, optional: Vec<String>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for name in core.iter().chain(optional.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::DuplicateConfigured(name.clone()));
            }
        }
        Ok(Self { core, optional })
    }

    pub fn names(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::Core => &self.core,
            Partition::Optional => &self.optional,
        }
    }

    /// Which partition `name` belongs to, if configured at all
    pub fn partition_of(&self, name: &str) -> Option<Partition> {
        if self.core.iter().any(|n| n == name) {
            Some(Partition::Core)
        } else if self.optional.iter().any(|n| n == name) {
            Some(Partition::Optional)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.optional.is_empty()
    }
}

/// A loaded plugin as the registry holds it.
pub struct RegisteredPlugin {
    /// The live instance
    pub instance: Arc<dyn Plugin>,
    /// The hook it was constructed with; owns the plugin's resource roots
    pub platform: Arc<PlatformHook>,
    pub state: PluginState,
}

impl RegisteredPlugin {
    pub fn new(instance: Arc<dyn Plugin>, platform: Arc<PlatformHook>) -> Self {
        Self {
            instance,
            platform,
            state: PluginState::Loaded,
        }
    }
}

impl fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("name", &self.instance.name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Registry of loaded plugins, at most one per name.
///
/// Entries are inserted only at the end of a successful load and removed
/// exactly once during unload.
#[derive(Debug)]
pub struct PluginRegistry {
    plugin_set: PluginSet,
    plugins: HashMap<String, RegisteredPlugin>,
}

impl PluginRegistry {
    pub fn new(plugin_set: PluginSet) -> Self {
        Self {
            plugin_set,
            plugins: HashMap::new(),
        }
    }

    pub fn plugin_set(&self) -> &PluginSet {
        &self.plugin_set
    }

    /// Register a freshly loaded plugin
    pub fn register(&mut self, name: &str, plugin: RegisteredPlugin) -> Result<(), RegistryError> {
        if self.plugin_set.partition_of(name).is_none() {
            return Err(RegistryError::NotConfigured(name.to_string()));
        }
        if self.plugins.contains_key(name) {
            return Err(RegistryError::AlreadyLoaded(name.to_string()));
        }
        self.plugins.insert(name.to_string(), plugin);
        Ok(())
    }

    /// Remove a plugin, handing the entry back to the caller
    pub fn unregister(&mut self, name: &str) -> Result<RegisteredPlugin, RegistryError> {
        self.plugins
            .remove(name)
            .ok_or_else(|| RegistryError::NotLoaded(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredPlugin, RegistryError> {
        self.plugins
            .get(name)
            .ok_or_else(|| RegistryError::NotLoaded(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut RegisteredPlugin, RegistryError> {
        self.plugins
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotLoaded(name.to_string()))
    }

    /// Update the lifecycle state of a registered plugin
    pub fn set_state(&mut self, name: &str, state: PluginState) -> Result<(), RegistryError> {
        self.get_mut(name)?.state = state;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// All configured names in `partition`, configuration order
    pub fn all_names(&self, partition: Partition) -> &[String] {
        self.plugin_set.names(partition)
    }

    /// Configured names in `partition` that are currently registered, configuration order
    pub fn loaded_names(&self, partition: Partition) -> Vec<String> {
        self.all_names(partition)
            .iter()
            .filter(|name| self.plugins.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Iterate over registered plugins (no particular order)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegisteredPlugin)> {
        self.plugins.iter()
    }
}
