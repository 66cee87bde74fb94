
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;

use crate::plugin_system::catalog::PluginCatalog;
use crate::plugin_system::error::PluginError;
use crate::plugin_system::platform::PlatformHook;
use crate::plugin_system::traits::{Plugin, PluginPhase};
use crate::resource::{FrontEnd, StaticResource, leaf};

/// Shared call journal, entries look like `"start:alpha"`.
pub type Journal = Arc<StdMutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(StdMutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Test plugin that records every hook call and fails on request.
pub struct RecordingPlugin {
    name: String,
    platform: Arc<PlatformHook>,
    journal: Journal,
    fail_on: Option<PluginPhase>,
}

impl RecordingPlugin {
    pub fn new(name: &str, platform: Arc<PlatformHook>, journal: Journal, fail_on: Option<PluginPhase>) -> Self {
        Self {
            name: name.to_string(),
            platform,
            journal,
            fail_on,
        }
    }

    fn record(&self, phase: PluginPhase) -> Result<(), PluginError> {
        self.journal.lock().unwrap().push(format!("{}:{}", phase, self.name));
        if self.fail_on == Some(phase) {
            return Err(PluginError::Other(format!("{} refused to {}", self.name, phase)));
        }
        Ok(())
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), PluginError> {
        self.record(PluginPhase::Load)?;
        self.platform
            .root_resource(FrontEnd::Mobile)
            .put_child("index", leaf(StaticResource::html(format!("<h1>{}</h1>", self.name))));
        Ok(())
    }

    async fn start(&self) -> Result<(), PluginError> {
        self.record(PluginPhase::Start)
    }

    async fn stop(&self) -> Result<(), PluginError> {
        self.record(PluginPhase::Stop)
    }

    async fn unload(&self) -> Result<(), PluginError> {
        self.record(PluginPhase::Unload)
    }
}

/// Register a [`RecordingPlugin`] factory for every name; names listed in
/// `failures` fail in the paired phase.
pub fn recording_catalog(names: &[&str], journal: &Journal, failures: &[(&str, PluginPhase)]) -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    for name in names {
        let journal = Arc::clone(journal);
        let fail_on = failures.iter().find(|(n, _)| n == name).map(|(_, phase)| *phase);
        catalog
            .register(*name, move |name: &str, _root: &Path, platform: Arc<PlatformHook>| {
                let plugin: Arc<dyn Plugin> =
                    Arc::new(RecordingPlugin::new(name, platform, Arc::clone(&journal), fail_on));
                Ok(plugin)
            })
            .unwrap();
    }
    catalog
}
