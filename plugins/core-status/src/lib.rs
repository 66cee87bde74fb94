use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use log::info;
use serde_json::json;

use outpost_core::plugin_system::{PlatformHook, Plugin, PluginError};
use outpost_core::resource::{FrontEnd, JsonResource, StaticResource, leaf};
use outpost_core::utils::read_optional_string;

pub const PLUGIN_NAME: &str = "core-status";

/// Leaf name of the status document on the mobile and desktop roots
pub const STATUS_RESOURCE: &str = "status";
/// Leaf name of the help page on the doc root
pub const HELP_RESOURCE: &str = "help";

/// Factory registered in the plugin catalog.
pub fn factory(name: &str, root: &Path, platform: Arc<PlatformHook>) -> Result<Arc<dyn Plugin>, PluginError> {
    Ok(Arc::new(StatusPlugin::new(name, root, platform)))
}

/// Publishes whether the node's plugins are up and for how long.
pub struct StatusPlugin {
    name: String,
    root: PathBuf,
    platform: Arc<PlatformHook>,
    started_at: Arc<Mutex<Option<Instant>>>,
}

impl StatusPlugin {
    pub fn new(name: &str, root: &Path, platform: Arc<PlatformHook>) -> Self {
        Self {
            name: name.to_string(),
            root: root.to_path_buf(),
            platform,
            started_at: Arc::new(Mutex::new(None)),
        }
    }

    fn set_started(&self, at: Option<Instant>) {
        *self.started_at.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    fn status_resource(&self) -> JsonResource {
        let name = self.name.clone();
        let started_at = Arc::clone(&self.started_at);
        JsonResource::new(move || {
            let started = *started_at.lock().unwrap_or_else(PoisonError::into_inner);
            json!({
                "name": name,
                "started": started.is_some(),
                "uptime_secs": started.map(|at| at.elapsed().as_secs()).unwrap_or(0),
            })
        })
    }
}

#[async_trait]
impl Plugin for StatusPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), PluginError> {
        let status = leaf(self.status_resource());
        self.platform
            .root_resource(FrontEnd::Mobile)
            .put_child(STATUS_RESOURCE, Arc::clone(&status));
        self.platform
            .root_resource(FrontEnd::Desktop)
            .put_child(STATUS_RESOURCE, status);

        let help_path = self.root.join("doc").join("index.html");
        match read_optional_string(&help_path).map_err(|e| PluginError::io(e, &help_path))? {
            Some(html) => {
                self.platform
                    .root_resource(FrontEnd::Doc)
                    .put_child(HELP_RESOURCE, leaf(StaticResource::html(html)));
            }
            None => log::debug!("No help page at {}", help_path.display()),
        }
        Ok(())
    }

    async fn start(&self) -> Result<(), PluginError> {
        self.set_started(Some(Instant::now()));
        info!("{} started", self.name);
        Ok(())
    }

    async fn stop(&self) -> Result<(), PluginError> {
        self.set_started(None);
        info!("{} stopped", self.name);
        Ok(())
    }

    async fn unload(&self) -> Result<(), PluginError> {
        self.platform.root_resource(FrontEnd::Mobile).delete_child(STATUS_RESOURCE);
        self.platform.root_resource(FrontEnd::Desktop).delete_child(STATUS_RESOURCE);
        self.platform.root_resource(FrontEnd::Doc).delete_child(HELP_RESOURCE);
        Ok(())
    }
}
