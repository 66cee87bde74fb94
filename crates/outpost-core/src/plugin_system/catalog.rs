use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::plugin_system::error::{PluginError, RegistryError};
use crate::plugin_system::platform::PlatformHook;
use crate::plugin_system::traits::Plugin;

/// Constructor a plugin package exposes: (plugin name, plugin root dir, platform hook).
pub type PluginFactory =
    Arc<dyn Fn(&str, &Path, Arc<PlatformHook>) -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>;

/// Named plugin factories.
///
/// Plugin packages are linked into the binary and register a factory under
/// the name the configuration refers to them by. Discovery is a lookup here.
#[derive(Default, Clone)]
pub struct PluginCatalog {
    factories: HashMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&str, &Path, Arc<PlatformHook>) -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateFactory(name));
        }
        log::debug!("Registered plugin factory '{}'", name);
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Resolve the factory for `name`
    pub fn resolve(&self, name: &str) -> Result<PluginFactory, PluginError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::FactoryNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("factories", &self.names())
            .finish()
    }
}
