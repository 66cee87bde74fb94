use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::resource::{FrontEnd, ResourceNode};

/// Settings shared by every plugin's platform hook.
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    /// Directory holding one sub-directory per plugin package
    pub plugin_dir: PathBuf,
    /// Peer name of the central server on the transport
    pub server_peer_name: String,
    /// Scratch directory plugins may write into
    pub tmp_dir: PathBuf,
}

/// Capabilities the platform hands to a single plugin at construction.
///
/// Every plugin gets its own hook and therefore its own resource roots. The
/// supervisor mounts those roots under the plugin's name once `start`
/// succeeds, so whatever the plugin hangs off them becomes servable.
#[derive(Debug)]
pub struct PlatformHook {
    plugin_name: String,
    server_peer_name: String,
    tmp_dir: PathBuf,
    mobile_resource: Arc<ResourceNode>,
    desktop_resource: Arc<ResourceNode>,
    doc_resource: Arc<ResourceNode>,
}

impl PlatformHook {
    pub fn new(plugin_name: impl Into<String>, settings: &PlatformSettings) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            server_peer_name: settings.server_peer_name.clone(),
            tmp_dir: settings.tmp_dir.clone(),
            mobile_resource: Arc::new(ResourceNode::new()),
            desktop_resource: Arc::new(ResourceNode::new()),
            doc_resource: Arc::new(ResourceNode::new()),
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn server_peer_name(&self) -> &str {
        &self.server_peer_name
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// The plugin's own root for `front_end`
    pub fn root_resource(&self, front_end: FrontEnd) -> &Arc<ResourceNode> {
        match front_end {
            FrontEnd::Mobile => &self.mobile_resource,
            FrontEnd::Desktop => &self.desktop_resource,
            FrontEnd::Doc => &self.doc_resource,
        }
    }

    pub fn mobile_resource(&self) -> &Arc<ResourceNode> {
        &self.mobile_resource
    }

    pub fn desktop_resource(&self) -> &Arc<ResourceNode> {
        &self.desktop_resource
    }

    pub fn doc_resource(&self) -> &Arc<ResourceNode> {
        &self.doc_resource
    }
}
