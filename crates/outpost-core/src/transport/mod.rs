//! # Outpost Transport
//!
//! The message transport linking a client node to the central server. The
//! orchestrator only talks to it through the [`Transport`] trait; the
//! concrete [`TcpTransport`] speaks newline-delimited frames over one TCP
//! session per peer and relays browser WebSocket traffic onto that session.
pub mod error;
pub mod tcp;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::Stream;

pub use error::TransportError;
pub use tcp::TcpTransport;

use crate::resource::ResourceNode;
use crate::site::{SiteHandle, SiteOptions};

/// Online/offline transitions of one peer. `true` means online.
pub type StatusStream = Pin<Box<dyn Stream<Item = bool> + Send>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the session to `peer`. A single attempt; callers bound it with a timeout.
    async fn connect(&self, peer: &str, host: &str, port: u16) -> Result<(), TransportError>;

    /// Status changes of `peer` from now on. The current value is not replayed.
    fn subscribe_status(&self, peer: &str) -> StatusStream;

    fn is_online(&self, peer: &str) -> bool;

    /// Attach the transport's HTTP endpoint under `name` on `root`.
    fn create_server(&self, name: &str, root: &Arc<ResourceNode>) -> Result<(), TransportError>;

    /// Start the WebSocket endpoint browsers use to reach the server.
    async fn create_websocket_server(
        &self,
        name: &str,
        port: u16,
        options: &SiteOptions,
    ) -> Result<SiteHandle, TransportError>;

    /// Close every session. Safe to call more than once.
    async fn shutdown(&self);
}

#[cfg(test)]
mod tests;
