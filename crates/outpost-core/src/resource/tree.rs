use std::fmt;
use std::sync::Arc;

use crate::plugin_system::platform::PlatformHook;
use crate::resource::{ResourceError, ResourceNode};

/// The front-ends a client node serves, each on its own HTTP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontEnd {
    Mobile,
    Desktop,
    Doc,
}

impl FrontEnd {
    pub const ALL: [FrontEnd; 3] = [FrontEnd::Mobile, FrontEnd::Desktop, FrontEnd::Doc];
}

impl fmt::Display for FrontEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontEnd::Mobile => write!(f, "mobile"),
            FrontEnd::Desktop => write!(f, "desktop"),
            FrontEnd::Doc => write!(f, "doc"),
        }
    }
}

/// The front-end roots plugins mount into.
#[derive(Debug, Default)]
pub struct ResourceTree {
    mobile: Arc<ResourceNode>,
    desktop: Arc<ResourceNode>,
    doc: Arc<ResourceNode>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self, front_end: FrontEnd) -> &Arc<ResourceNode> {
        match front_end {
            FrontEnd::Mobile => &self.mobile,
            FrontEnd::Desktop => &self.desktop,
            FrontEnd::Doc => &self.doc,
        }
    }

    /// Mount a plugin's contributed subtrees under `name` on every root.
    ///
    /// Either every root gains the plugin's node or none does.
    pub fn mount(&self, name: &str, platform: &PlatformHook) -> Result<(), ResourceError> {
        let mut mounted = Vec::new();
        for front_end in FrontEnd::ALL {
            let subtree = platform.root_resource(front_end);
            let root = self.root(front_end);
            let already_there = root.has_child(name);
            if root.put_child_if_vacant(name, subtree) {
                if !already_there {
                    mounted.push(front_end);
                }
            } else {
                for done in mounted {
                    self.root(done).delete_child(name);
                }
                return Err(ResourceError::MountConflict {
                    name: name.to_string(),
                    root: front_end.to_string(),
                });
            }
        }
        log::debug!("Mounted resource subtree '{}' on all front-end roots", name);
        Ok(())
    }

    /// Remove `name` from every root.
    ///
    /// Fails with [`ResourceError::NotMounted`] if no root had it; roots that do
    /// have it are cleared either way.
    pub fn unmount(&self, name: &str) -> Result<(), ResourceError> {
        let mut removed_any = false;
        for front_end in FrontEnd::ALL {
            removed_any |= self.root(front_end).delete_child(name).is_some();
        }
        if removed_any {
            log::debug!("Unmounted resource subtree '{}'", name);
            Ok(())
        } else {
            Err(ResourceError::NotMounted {
                name: name.to_string(),
                root: "any".to_string(),
            })
        }
    }

    /// True if `name` is mounted on at least one root
    pub fn is_mounted(&self, name: &str) -> bool {
        FrontEnd::ALL.iter().any(|fe| self.root(*fe).has_child(name))
    }

    /// True if no root has any children
    pub fn is_empty(&self) -> bool {
        FrontEnd::ALL.iter().all(|fe| self.root(*fe).is_empty())
    }
}
