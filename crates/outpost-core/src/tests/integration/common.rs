#![cfg(test)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::config::ClientConfig;
use crate::kernel::restart::ProcessRestarter;
use crate::resource::{JsonResource, ResourceNode, leaf};
use crate::site::{SiteHandle, SiteOptions, setup_site};
use crate::transport::{StatusStream, Transport, TransportError};

pub use crate::plugin_system::tests::{Journal, entries, journal, recording_catalog};

// ===== FAKE COLLABORATORS =====

/// How [`FakeTransport::connect`] behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Refuse,
    /// Never completes
    Hang,
    /// Succeeds, but the session is already gone when connect returns
    DropAfterConnect,
}

/// In-memory transport whose server status tests flip by hand.
pub struct FakeTransport {
    behavior: ConnectBehavior,
    status: watch::Sender<bool>,
    connects: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl FakeTransport {
    pub fn new(behavior: ConnectBehavior) -> Arc<Self> {
        let (status, _) = watch::channel(false);
        Arc::new(Self {
            behavior,
            status,
            connects: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        })
    }

    pub fn go_offline(&self) {
        self.status.send_replace(false);
    }

    pub fn go_online(&self) {
        self.status.send_replace(true);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, peer: &str, host: &str, port: u16) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ConnectBehavior::Succeed => {
                self.status.send_replace(true);
                Ok(())
            }
            ConnectBehavior::Refuse => Err(TransportError::Connect {
                peer: peer.to_string(),
                addr: format!("{}:{}", host, port),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
            ConnectBehavior::Hang => std::future::pending().await,
            ConnectBehavior::DropAfterConnect => {
                self.status.send_replace(true);
                self.status.send_replace(false);
                Ok(())
            }
        }
    }

    fn subscribe_status(&self, _peer: &str) -> StatusStream {
        Box::pin(WatchStream::from_changes(self.status.subscribe()))
    }

    fn is_online(&self, _peer: &str) -> bool {
        *self.status.borrow()
    }

    fn create_server(&self, name: &str, root: &Arc<ResourceNode>) -> Result<(), TransportError> {
        root.put_child(name, leaf(JsonResource::new(|| serde_json::json!({ "fake": true }))));
        Ok(())
    }

    async fn create_websocket_server(
        &self,
        name: &str,
        port: u16,
        options: &SiteOptions,
    ) -> Result<SiteHandle, TransportError> {
        Ok(setup_site(name, Arc::new(ResourceNode::new()), port, options).await?)
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts restart requests instead of replacing the process
#[derive(Debug, Default)]
pub struct CountingRestarter {
    restarts: AtomicUsize,
}

impl CountingRestarter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl ProcessRestarter for CountingRestarter {
    fn restart_process(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }
}

// ===== HELPERS =====

/// Config on loopback with OS-assigned ports, paths inside `tmp`.
pub fn test_config(tmp: &TempDir, core: &[&str], optional: &[&str]) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.sites.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.sites.mobile_port = 0;
    config.sites.desktop_port = 0;
    config.sites.doc_port = 0;
    config.sites.websocket_port = 0;
    config.server.connect_timeout_secs = 1;
    config.paths.tmp_path = tmp.path().join("tmp");
    config.paths.plugin_dir = tmp.path().join("plugins");
    config.plugins.core = core.iter().map(|s| s.to_string()).collect();
    config.plugins.optional = optional.iter().map(|s| s.to_string()).collect();
    config
}

/// Minimal HTTP/1.1 GET; returns (status code, body)
pub async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect to site");
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).to_string();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = text.split_once("\r\n\r\n").map(|(_, b)| b.to_string()).unwrap_or_default();
    (status, body)
}

/// Poll `check` until it holds or a few seconds pass
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
