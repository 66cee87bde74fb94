use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_stream::StreamExt;

use crate::resource::{ResourceNode, ResourceRequest};
use crate::site::SiteOptions;
use crate::transport::{TcpTransport, Transport, TransportError};

const PEER: &str = "outpost-server";
const WAIT: Duration = Duration::from_secs(5);

async fn fake_server() -> (TcpListener, u16) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn test_connect_sends_hello_and_goes_online() {
    let (listener, port) = fake_server().await;
    let transport = TcpTransport::new("outpost-client");

    transport.connect(PEER, "127.0.0.1", port).await.unwrap();
    assert!(transport.is_online(PEER));
    assert_eq!(transport.online_peers(), vec![PEER]);

    let (socket, _) = listener.accept().await.unwrap();
    let mut lines = BufReader::new(socket).lines();
    let hello = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    let hello: serde_json::Value = serde_json::from_str(&hello).unwrap();
    assert_eq!(hello["type"], "hello");
    assert_eq!(hello["client"], "outpost-client");

    transport.shutdown().await;
    assert!(!transport.is_online(PEER));
}

#[tokio::test]
async fn test_connect_refused() {
    let (listener, port) = fake_server().await;
    drop(listener);

    let transport = TcpTransport::new("outpost-client");
    let err = transport.connect(PEER, "127.0.0.1", port).await.unwrap_err();
    assert!(matches!(err, TransportError::Connect { ref peer, .. } if peer == PEER));
    assert!(!transport.is_online(PEER));
}

#[tokio::test]
async fn test_server_close_publishes_offline() {
    let (listener, port) = fake_server().await;
    let transport = TcpTransport::new("outpost-client");
    transport.connect(PEER, "127.0.0.1", port).await.unwrap();

    let mut status = transport.subscribe_status(PEER);
    let (socket, _) = listener.accept().await.unwrap();
    drop(socket);

    let change = timeout(WAIT, status.next()).await.unwrap();
    assert_eq!(change, Some(false));
    assert!(!transport.is_online(PEER));
}

#[tokio::test]
async fn test_frames_in_both_directions() {
    let (listener, port) = fake_server().await;
    let transport = TcpTransport::new("outpost-client");
    let mut inbound = transport.subscribe_frames();
    transport.connect(PEER, "127.0.0.1", port).await.unwrap();

    let (socket, _) = listener.accept().await.unwrap();
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();
    // hello
    lines.next_line().await.unwrap();

    transport.send_frame(PEER, r#"{"type":"ping"}"#).unwrap();
    let frame = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    assert_eq!(frame, r#"{"type":"ping"}"#);

    write_half.write_all(b"{\"type\":\"pong\"}\n").await.unwrap();
    let received = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(received, r#"{"type":"pong"}"#);

    transport.shutdown().await;
}

#[tokio::test]
async fn test_send_without_session() {
    let transport = TcpTransport::new("outpost-client");
    assert!(matches!(
        transport.send_frame(PEER, "x"),
        Err(TransportError::NotConnected(_))
    ));
}

#[tokio::test]
async fn test_create_server_reports_status() {
    let (_listener, port) = fake_server().await;
    let transport = TcpTransport::new("outpost-client");
    transport.connect(PEER, "127.0.0.1", port).await.unwrap();

    let root = Arc::new(ResourceNode::new());
    transport.create_server("vortex", &root).unwrap();

    let response = root.render_path("/vortex", ResourceRequest::get());
    assert_eq!(response.status, 200);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["client"], "outpost-client");
    assert_eq!(body["peers"][PEER]["online"], true);

    transport.shutdown().await;
}

#[tokio::test]
async fn test_websocket_server_binds_and_closes() {
    let transport = TcpTransport::new("outpost-client");
    let options = SiteOptions {
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    let handle = transport.create_websocket_server("websocket", 0, &options).await.unwrap();
    assert_ne!(handle.local_addr().port(), 0);
    handle.close().await.unwrap();
}
