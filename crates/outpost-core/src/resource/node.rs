use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::resource::{Resource, ResourceRequest, ResourceResponse};

/// A named node in a resource tree.
///
/// Children are only ever inserted or removed as whole `Arc`s while the write
/// lock is held, and the lock is never held across an `.await`.
#[derive(Default)]
pub struct ResourceNode {
    resource: Option<Arc<dyn Resource>>,
    children: RwLock<BTreeMap<String, Arc<ResourceNode>>>,
}

impl ResourceNode {
    /// An empty directory-like node
    pub fn new() -> Self {
        Self::default()
    }

    /// A node that renders `resource` when addressed directly
    pub fn with_resource(resource: Arc<dyn Resource>) -> Self {
        Self {
            resource: Some(resource),
            children: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn resource(&self) -> Option<&Arc<dyn Resource>> {
        self.resource.as_ref()
    }

    /// Publish `child` under `name`, returning whatever was there before.
    pub fn put_child(&self, name: impl Into<String>, child: Arc<ResourceNode>) -> Option<Arc<ResourceNode>> {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        children.insert(name.into(), child)
    }

    /// Publish `child` under `name` unless a different node already owns it.
    ///
    /// Re-inserting the same `Arc` succeeds, so a plugin started twice does not
    /// conflict with itself.
    pub fn put_child_if_vacant(&self, name: &str, child: &Arc<ResourceNode>) -> bool {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        match children.get(name) {
            Some(existing) => Arc::ptr_eq(existing, child),
            None => {
                children.insert(name.to_string(), Arc::clone(child));
                true
            }
        }
    }

    pub fn delete_child(&self, name: &str) -> Option<Arc<ResourceNode>> {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        children.remove(name)
    }

    pub fn child(&self, name: &str) -> Option<Arc<ResourceNode>> {
        let children = self.children.read().unwrap_or_else(PoisonError::into_inner);
        children.get(name).cloned()
    }

    pub fn has_child(&self, name: &str) -> bool {
        let children = self.children.read().unwrap_or_else(PoisonError::into_inner);
        children.contains_key(name)
    }

    /// Child names in sorted order
    pub fn child_names(&self) -> Vec<String> {
        let children = self.children.read().unwrap_or_else(PoisonError::into_inner);
        children.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        let children = self.children.read().unwrap_or_else(PoisonError::into_inner);
        children.is_empty()
    }

    /// Walk `segments` as far as the tree allows.
    ///
    /// Returns the deepest node reached and the segments it did not consume.
    /// Empty segments (from `//` or a trailing slash) are ignored.
    pub fn resolve(self: &Arc<Self>, segments: &[&str]) -> (Arc<ResourceNode>, Vec<String>) {
        let mut node = Arc::clone(self);
        let mut remaining = segments.iter().filter(|s| !s.is_empty()).peekable();
        while let Some(segment) = remaining.peek() {
            match node.child(segment) {
                Some(next) => {
                    node = next;
                    remaining.next();
                }
                None => break,
            }
        }
        (node, remaining.map(|s| s.to_string()).collect())
    }

    /// Resolve `path` and render the leaf found there.
    pub fn render_path(self: &Arc<Self>, path: &str, mut request: ResourceRequest) -> ResourceResponse {
        let segments: Vec<&str> = path.split('/').collect();
        let (node, remaining) = self.resolve(&segments);
        match node.resource() {
            Some(resource) => {
                request.remaining = remaining;
                resource.render(&request)
            }
            None => ResourceResponse::not_found(),
        }
    }
}

impl fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceNode")
            .field("has_resource", &self.resource.is_some())
            .field("children", &self.child_names())
            .finish()
    }
}
