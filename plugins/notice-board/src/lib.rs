//! Serves the notices listed in `<plugin root>/notices.json`.
//!
//! The file is read once at load. Notices are only published between `start`
//! and `stop`.
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use outpost_core::plugin_system::{PlatformHook, Plugin, PluginError};
use outpost_core::resource::{FrontEnd, JsonResource, leaf};
use outpost_core::utils::read_optional_string;

pub const PLUGIN_NAME: &str = "notice-board";

pub const NOTICES_FILE: &str = "notices.json";
pub const NOTICES_RESOURCE: &str = "notices";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

pub fn factory(name: &str, root: &Path, platform: Arc<PlatformHook>) -> Result<Arc<dyn Plugin>, PluginError> {
    Ok(Arc::new(NoticeBoardPlugin::new(name, root, platform)))
}

pub struct NoticeBoardPlugin {
    name: String,
    root: PathBuf,
    platform: Arc<PlatformHook>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBoardPlugin {
    pub fn new(name: &str, root: &Path, platform: Arc<PlatformHook>) -> Self {
        Self {
            name: name.to_string(),
            root: root.to_path_buf(),
            platform,
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn read_notices(&self) -> Result<Vec<Notice>, PluginError> {
        let path = self.root.join(NOTICES_FILE);
        match read_optional_string(&path).map_err(|e| PluginError::io(e, &path))? {
            Some(data) => serde_json::from_str(&data).map_err(|source| PluginError::InvalidData { path, source }),
            None => {
                log::debug!("{} has no {}, starting empty", self.name, NOTICES_FILE);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Plugin for NoticeBoardPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), PluginError> {
        let notices = self.read_notices()?;
        log::info!("{} loaded {} notice(s)", self.name, notices.len());
        *self.notices.lock().unwrap_or_else(PoisonError::into_inner) = notices;
        Ok(())
    }

    async fn start(&self) -> Result<(), PluginError> {
        let notices = Arc::clone(&self.notices);
        let resource = leaf(JsonResource::new(move || {
            let notices = notices.lock().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_value(&*notices).unwrap_or_default()
        }));
        for front_end in [FrontEnd::Mobile, FrontEnd::Desktop] {
            self.platform
                .root_resource(front_end)
                .put_child(NOTICES_RESOURCE, Arc::clone(&resource));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), PluginError> {
        for front_end in [FrontEnd::Mobile, FrontEnd::Desktop] {
            self.platform.root_resource(front_end).delete_child(NOTICES_RESOURCE);
        }
        Ok(())
    }

    async fn unload(&self) -> Result<(), PluginError> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }
}
