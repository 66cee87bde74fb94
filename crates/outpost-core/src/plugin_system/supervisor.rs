use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::plugin_system::catalog::PluginCatalog;
use crate::plugin_system::error::{PluginError, PluginLifecycleError};
use crate::plugin_system::platform::{PlatformHook, PlatformSettings};
use crate::plugin_system::registry::{PluginRegistry, PluginSet, RegisteredPlugin};
use crate::plugin_system::traits::{Partition, Plugin, PluginPhase, PluginState};
use crate::resource::ResourceTree;

/// Outcome of one supervisor operation over one partition.
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: PluginPhase,
    pub partition: Partition,
    /// Names the operation succeeded for, in processing order
    pub succeeded: Vec<String>,
    /// Per-plugin failures, in processing order
    pub failures: Vec<PluginLifecycleError>,
}

impl PhaseReport {
    fn new(phase: PluginPhase, partition: Partition) -> Self {
        Self {
            phase,
            partition,
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True if no plugin failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True if nothing was attempted
    pub fn is_noop(&self) -> bool {
        self.succeeded.is_empty() && self.failures.is_empty()
    }

    fn record_failure(&mut self, error: PluginLifecycleError) {
        match self.partition {
            Partition::Core => log::error!("Core {}", error),
            Partition::Optional => log::warn!("Optional {}", error),
        }
        self.failures.push(error);
    }
}

/// Drives load/start/stop/unload across a plugin partition.
///
/// Every operation walks the partition in configuration order (stop and
/// unload in reverse), isolates per-plugin failures and returns once every
/// name was attempted. Calling an operation again when there is nothing left
/// to do is a no-op. Which partition goes first is the orchestrator's call.
pub struct PluginSupervisor {
    registry: Arc<Mutex<PluginRegistry>>,
    catalog: PluginCatalog,
    resources: Arc<ResourceTree>,
    settings: PlatformSettings,
}

impl PluginSupervisor {
    pub fn new(
        plugin_set: PluginSet,
        catalog: PluginCatalog,
        resources: Arc<ResourceTree>,
        settings: PlatformSettings,
    ) -> Self {
        Self {
            registry: Arc::new(Mutex::new(PluginRegistry::new(plugin_set))),
            catalog,
            resources,
            settings,
        }
    }

    /// Shared handle to the registry for read paths
    pub fn registry(&self) -> &Arc<Mutex<PluginRegistry>> {
        &self.registry
    }

    pub fn resources(&self) -> &Arc<ResourceTree> {
        &self.resources
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Construct, load and register every configured plugin of `partition`
    /// that is not registered yet.
    pub async fn load_plugins(&self, partition: Partition) -> PhaseReport {
        let mut report = PhaseReport::new(PluginPhase::Load, partition);
        let names = self.registry.lock().await.all_names(partition).to_vec();

        for name in names {
            if self.registry.lock().await.contains(&name) {
                log::debug!("Plugin '{}' already loaded, skipping", name);
                continue;
            }

            log::info!("Loading {} plugin '{}'", partition, name);
            let loaded = match self.load_one(&name).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    report.record_failure(e);
                    continue;
                }
            };

            let instance = Arc::clone(&loaded.instance);
            let registered = self.registry.lock().await.register(&name, loaded);
            match registered {
                Ok(()) => {
                    log::info!("Loaded plugin '{}'", name);
                    report.succeeded.push(name);
                }
                Err(e) => {
                    // Lost a race with another load of the same name; the
                    // registered instance wins and this one is released.
                    log::error!("Registry rejected plugin '{}': {}", name, e);
                    if let Err(unload_err) = instance.unload().await {
                        log::warn!("Unloading rejected plugin '{}' failed: {}", name, unload_err);
                    }
                    report.record_failure(PluginLifecycleError::new(PluginPhase::Load, name, e));
                }
            }
        }
        report
    }

    async fn load_one(&self, name: &str) -> Result<RegisteredPlugin, PluginLifecycleError> {
        let factory = self
            .catalog
            .resolve(name)
            .map_err(|e| PluginLifecycleError::new(PluginPhase::Load, name, e))?;

        let root_dir = self.settings.plugin_dir.join(name);
        if !root_dir.is_dir() {
            log::debug!("Plugin '{}' has no root directory at {}", name, root_dir.display());
        }

        let platform = Arc::new(PlatformHook::new(name, &self.settings));
        let instance = factory(name, &root_dir, Arc::clone(&platform))
            .map_err(|e| PluginLifecycleError::new(PluginPhase::Load, name, e))?;

        instance
            .load()
            .await
            .map_err(|e| PluginLifecycleError::new(PluginPhase::Load, name, e))?;

        Ok(RegisteredPlugin::new(instance, platform))
    }

    /// Start every registered plugin of `partition` and mount its subtree.
    pub async fn start_plugins(&self, partition: Partition) -> PhaseReport {
        let mut report = PhaseReport::new(PluginPhase::Start, partition);
        let names = self.registry.lock().await.loaded_names(partition);

        for name in names {
            let Some((instance, platform, state)) = self.snapshot(&name).await else {
                continue;
            };
            if state == PluginState::Started {
                continue;
            }

            log::info!("Starting {} plugin '{}'", partition, name);
            if let Err(e) = instance.start().await {
                report.record_failure(PluginLifecycleError::new(PluginPhase::Start, name, e));
                continue;
            }

            if let Err(e) = self.resources.mount(&name, &platform) {
                log::error!("Mounting resources for plugin '{}' failed: {}", name, e);
                if let Err(stop_err) = instance.stop().await {
                    log::warn!("Stopping unmountable plugin '{}' failed: {}", name, stop_err);
                }
                self.set_state(&name, PluginState::Stopped).await;
                report.record_failure(PluginLifecycleError::new(
                    PluginPhase::Start,
                    name.clone(),
                    PluginError::MountConflict(name),
                ));
                continue;
            }

            self.set_state(&name, PluginState::Started).await;
            log::info!("Started plugin '{}'", name);
            report.succeeded.push(name);
        }
        report
    }

    /// Stop every started plugin of `partition`, in reverse configuration order.
    pub async fn stop_plugins(&self, partition: Partition) -> PhaseReport {
        let mut report = PhaseReport::new(PluginPhase::Stop, partition);
        let names = self.registry.lock().await.loaded_names(partition);

        for name in names.into_iter().rev() {
            let Some((instance, _, state)) = self.snapshot(&name).await else {
                continue;
            };
            if state != PluginState::Started {
                continue;
            }
            self.stop_one(&name, instance.as_ref(), &mut report).await;
        }
        report
    }

    async fn stop_one(&self, name: &str, instance: &dyn Plugin, report: &mut PhaseReport) {
        log::info!("Stopping plugin '{}'", name);
        let result = instance.stop().await;
        // A failed stop is not retried
        self.set_state(name, PluginState::Stopped).await;
        match result {
            Ok(()) => {
                log::info!("Stopped plugin '{}'", name);
                if report.phase == PluginPhase::Stop {
                    report.succeeded.push(name.to_string());
                }
            }
            Err(e) => report.record_failure(PluginLifecycleError::new(PluginPhase::Stop, name, e)),
        }
    }

    /// Unmount, unload and unregister every registered plugin of `partition`,
    /// in reverse configuration order.
    pub async fn unload_plugins(&self, partition: Partition) -> PhaseReport {
        let mut report = PhaseReport::new(PluginPhase::Unload, partition);
        let names = self.registry.lock().await.loaded_names(partition);

        for name in names.into_iter().rev() {
            let Some((instance, _, state)) = self.snapshot(&name).await else {
                continue;
            };
            if state == PluginState::Started {
                self.stop_one(&name, instance.as_ref(), &mut report).await;
            }

            if let Err(e) = self.resources.unmount(&name) {
                log::debug!("Nothing to unmount for plugin '{}': {}", name, e);
            }

            log::info!("Unloading plugin '{}'", name);
            let result = instance.unload().await;

            if let Err(e) = self.registry.lock().await.unregister(&name) {
                log::error!("Registry invariant violated while unloading '{}': {}", name, e);
            }
            drop(instance);

            match result {
                Ok(()) => {
                    log::info!("Unloaded plugin '{}'", name);
                    report.succeeded.push(name);
                }
                Err(e) => report.record_failure(PluginLifecycleError::new(PluginPhase::Unload, name, e)),
            }
        }
        report
    }

    /// Clone what an operation needs out of the registry so the lock is not
    /// held across plugin calls.
    async fn snapshot(&self, name: &str) -> Option<(Arc<dyn Plugin>, Arc<PlatformHook>, PluginState)> {
        let registry = self.registry.lock().await;
        match registry.get(name) {
            Ok(entry) => Some((Arc::clone(&entry.instance), Arc::clone(&entry.platform), entry.state)),
            Err(e) => {
                log::debug!("Skipping '{}': {}", name, e);
                None
            }
        }
    }

    async fn set_state(&self, name: &str, state: PluginState) {
        if let Err(e) = self.registry.lock().await.set_state(name, state) {
            log::error!("Registry invariant violated while marking '{}' {:?}: {}", name, state, e);
        }
    }
}

impl Debug for PluginSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Avoid locking in Debug
        f.debug_struct("PluginSupervisor")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
