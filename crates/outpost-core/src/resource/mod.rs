//! # Outpost Resource Tree
//!
//! A composable namespace of HTTP-servable resources. Each front-end (mobile,
//! desktop, documentation) has its own root [`ResourceNode`]; every started
//! plugin contributes one child per root, keyed by its plugin name.
//!
//! ## Key Submodules:
//!
//! - **[`node`]**: [`ResourceNode`], a node whose children sit behind a
//!   read/write lock. Children are published as `Arc`s, so a subtree is always
//!   fully built before a request can reach it.
//! - **[`tree`]**: [`ResourceTree`], the set of front-end roots plus the
//!   mount/unmount operations the supervisor uses.
//! - **[`error`]**: [`ResourceError`].
//!
//! Leaves implement the [`Resource`] trait. Rendering is synchronous and must
//! not block; anything expensive belongs in a plugin's `load`.
pub mod error;
pub mod node;
pub mod tree;

use std::fmt;
use std::sync::Arc;

pub use error::ResourceError;
pub use node::ResourceNode;
pub use tree::{FrontEnd, ResourceTree};

/// A request as seen by a leaf resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    /// HTTP method, upper case
    pub method: String,
    /// Path segments left over after walking the tree down to the leaf
    pub remaining: Vec<String>,
    /// Raw query string, if any
    pub query: Option<String>,
    pub body: Vec<u8>,
}

impl ResourceRequest {
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            ..Self::default()
        }
    }
}

/// What a leaf resource renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl ResourceResponse {
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        // Serializing a Value cannot fail
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::ok("application/json", body)
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: b"Not Found".to_vec(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: b"Method Not Allowed".to_vec(),
        }
    }
}

/// A servable leaf.
pub trait Resource: Send + Sync {
    fn render(&self, request: &ResourceRequest) -> ResourceResponse;
}

/// Fixed content, served for GET and HEAD.
#[derive(Debug, Clone)]
pub struct StaticResource {
    content_type: String,
    body: Vec<u8>,
}

impl StaticResource {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::new("text/html; charset=utf-8", body)
    }
}

impl Resource for StaticResource {
    fn render(&self, request: &ResourceRequest) -> ResourceResponse {
        if !request.remaining.is_empty() {
            return ResourceResponse::not_found();
        }
        match request.method.as_str() {
            "GET" | "HEAD" => ResourceResponse::ok(self.content_type.clone(), self.body.clone()),
            _ => ResourceResponse::method_not_allowed(),
        }
    }
}

/// JSON produced on every GET by a closure.
pub struct JsonResource {
    producer: Box<dyn Fn() -> serde_json::Value + Send + Sync>,
}

impl JsonResource {
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            producer: Box::new(producer),
        }
    }
}

impl fmt::Debug for JsonResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonResource").finish_non_exhaustive()
    }
}

impl Resource for JsonResource {
    fn render(&self, request: &ResourceRequest) -> ResourceResponse {
        if !request.remaining.is_empty() {
            return ResourceResponse::not_found();
        }
        match request.method.as_str() {
            "GET" | "HEAD" => ResourceResponse::json(&(self.producer)()),
            _ => ResourceResponse::method_not_allowed(),
        }
    }
}

/// Convenience for building a leaf node.
pub fn leaf<R: Resource + 'static>(resource: R) -> Arc<ResourceNode> {
    Arc::new(ResourceNode::with_resource(Arc::new(resource)))
}
