use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

use crate::resource::{JsonResource, ResourceNode, leaf};
use crate::site::{self, SiteHandle, SiteOptions};
use crate::transport::{StatusStream, Transport, TransportError};

/// Frames from any peer, fanned out to WebSocket clients
const INBOUND_CAPACITY: usize = 256;

/// TCP transport speaking newline-delimited frames.
///
/// The first frame on every session is a JSON hello naming this client.
/// Status goes online once the socket connects and offline when the server
/// closes it or a read fails.
#[derive(Clone)]
pub struct TcpTransport {
    inner: Arc<Inner>,
}

struct Inner {
    client_name: String,
    peers: Mutex<HashMap<String, Peer>>,
    inbound: broadcast::Sender<String>,
}

struct Peer {
    status: watch::Sender<bool>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Peer {
    fn offline() -> Self {
        let (status, _) = watch::channel(false);
        Self {
            status,
            outbound: None,
            tasks: Vec::new(),
        }
    }

    fn close(&mut self) {
        self.outbound = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        mark_offline(&self.status);
    }
}

impl TcpTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                client_name: client_name.into(),
                peers: Mutex::new(HashMap::new()),
                inbound,
            }),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.inner.client_name
    }

    /// Queue one frame for `peer`
    pub fn send_frame(&self, peer: &str, frame: impl Into<String>) -> Result<(), TransportError> {
        self.inner.send_frame(peer, frame.into())
    }

    /// Frames received from any peer from now on
    pub fn subscribe_frames(&self) -> broadcast::Receiver<String> {
        self.inner.inbound.subscribe()
    }

    /// Names of peers with an open session
    pub fn online_peers(&self) -> Vec<String> {
        self.inner.online_peers()
    }
}

impl Inner {
    fn peers(&self) -> std::sync::MutexGuard<'_, HashMap<String, Peer>> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_frame(&self, peer: &str, frame: String) -> Result<(), TransportError> {
        let peers = self.peers();
        let sender = peers
            .get(peer)
            .and_then(|p| p.outbound.as_ref())
            .ok_or_else(|| TransportError::NotConnected(peer.to_string()))?;
        sender
            .send(frame)
            .map_err(|_| TransportError::NotConnected(peer.to_string()))
    }

    /// Relay a browser frame to every open session
    fn broadcast_outbound(&self, frame: &str) {
        for (name, peer) in self.peers().iter() {
            if let Some(outbound) = &peer.outbound {
                if outbound.send(frame.to_string()).is_err() {
                    log::debug!("Dropping frame for closed session '{}'", name);
                }
            }
        }
    }

    fn online_peers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .peers()
            .iter()
            .filter(|(_, p)| *p.status.borrow())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn status_json(&self) -> serde_json::Value {
        let peers = self.peers();
        let status: serde_json::Map<String, serde_json::Value> = peers
            .iter()
            .map(|(name, p)| (name.clone(), json!({ "online": *p.status.borrow() })))
            .collect();
        json!({
            "client": self.client_name,
            "peers": status,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, peer: &str, host: &str, port: u16) -> Result<(), TransportError> {
        let addr = format!("{}:{}", host, port);
        log::info!("Connecting to peer '{}' at {}", peer, addr);
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                peer: peer.to_string(),
                addr: addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Could not set TCP_NODELAY for '{}': {}", peer, e);
        }

        let (reader, writer) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let hello = json!({ "type": "hello", "client": self.inner.client_name }).to_string();
        // The receiver is owned by the writer task spawned below
        let _ = outbound_tx.send(hello);

        let mut peers = self.inner.peers();
        let entry = peers.entry(peer.to_string()).or_insert_with(Peer::offline);
        if entry.outbound.is_some() {
            entry.close();
        }

        let writer_task = tokio::spawn(write_frames(peer.to_string(), writer, outbound_rx));
        let reader_task = tokio::spawn(read_frames(
            peer.to_string(),
            reader,
            entry.status.clone(),
            self.inner.inbound.clone(),
        ));
        entry.outbound = Some(outbound_tx);
        entry.tasks = vec![writer_task, reader_task];
        entry.status.send_replace(true);
        log::info!("Peer '{}' online", peer);
        Ok(())
    }

    fn subscribe_status(&self, peer: &str) -> StatusStream {
        let mut peers = self.inner.peers();
        let entry = peers.entry(peer.to_string()).or_insert_with(Peer::offline);
        Box::pin(WatchStream::from_changes(entry.status.subscribe()))
    }

    fn is_online(&self, peer: &str) -> bool {
        self.inner
            .peers()
            .get(peer)
            .map(|p| *p.status.borrow())
            .unwrap_or(false)
    }

    fn create_server(&self, name: &str, root: &Arc<ResourceNode>) -> Result<(), TransportError> {
        let inner = Arc::clone(&self.inner);
        root.put_child(name, leaf(JsonResource::new(move || inner.status_json())));
        log::debug!("Transport endpoint '{}' attached", name);
        Ok(())
    }

    async fn create_websocket_server(
        &self,
        name: &str,
        port: u16,
        options: &SiteOptions,
    ) -> Result<SiteHandle, TransportError> {
        let app = Router::new()
            .route("/", get(ws_upgrade))
            .with_state(Arc::clone(&self.inner));
        Ok(site::serve(name, app, port, options).await?)
    }

    async fn shutdown(&self) {
        let mut peers = self.inner.peers();
        for (name, peer) in peers.iter_mut() {
            peer.close();
            log::info!("Closed session to peer '{}'", name);
        }
        // Dropping the senders ends every status stream
        peers.clear();
    }
}

async fn write_frames(peer: String, mut writer: OwnedWriteHalf, mut outbound: mpsc::UnboundedReceiver<String>) {
    while let Some(frame) = outbound.recv().await {
        let mut line = frame.into_bytes();
        line.push(b'\n');
        if let Err(e) = writer.write_all(&line).await {
            log::warn!("Writing to peer '{}' failed: {}", peer, e);
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn read_frames(
    peer: String,
    reader: OwnedReadHalf,
    status: watch::Sender<bool>,
    inbound: broadcast::Sender<String>,
) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                // No WebSocket clients is fine
                let _ = inbound.send(line);
            }
            Ok(None) => {
                log::warn!("Peer '{}' closed the session", peer);
                break;
            }
            Err(e) => {
                log::warn!("Reading from peer '{}' failed: {}", peer, e);
                break;
            }
        }
    }
    mark_offline(&status);
}

/// Publish offline, notifying subscribers only on an actual transition
fn mark_offline(status: &watch::Sender<bool>) {
    status.send_if_modified(|online| std::mem::replace(online, false));
}

async fn ws_upgrade(State(inner): State<Arc<Inner>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| relay(socket, inner))
}

async fn relay(mut socket: WebSocket, inner: Arc<Inner>) {
    let mut from_server = inner.inbound.subscribe();
    log::debug!("WebSocket client attached");
    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => inner.broadcast_outbound(text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::debug!("WebSocket client error: {}", e);
                    break;
                }
            },
            frame = from_server.recv() => match frame {
                Ok(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("WebSocket client lagged, {} frames dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    log::debug!("WebSocket client detached");
}
