#![cfg(test)]

use std::net::Ipv4Addr;
use std::sync::Arc;

use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::common::{
    ConnectBehavior, CountingRestarter, FakeTransport, entries, eventually, http_get, journal, recording_catalog,
    test_config,
};
use crate::kernel::{LifecyclePhase, Orchestrator};
use crate::transport::{TcpTransport, Transport};

#[tokio::test]
async fn test_end_to_end_serving_and_teardown() {
    let tmp = tempdir().unwrap();
    let journal = journal();
    let catalog = recording_catalog(&["alpha", "beta"], &journal, &[]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let transport = FakeTransport::new(ConnectBehavior::Succeed);

    let mut orchestrator = Orchestrator::new(
        test_config(&tmp, &["alpha"], &["beta"]),
        catalog,
        transport.clone(),
        CountingRestarter::new(),
        shutdown_rx,
    )
    .unwrap();

    assert!(orchestrator.startup().await.is_serving());
    {
        let registry = orchestrator.registry().lock().await;
        assert!(registry.contains("alpha"));
        assert!(registry.contains("beta"));
    }

    let sites = orchestrator.site_addrs();
    let (_, mobile) = sites[0].clone();
    let (_, doc) = sites[2].clone();

    let (status, body) = http_get(mobile, "/alpha/index").await;
    assert_eq!(status, 200);
    assert_eq!(body, "<h1>alpha</h1>");
    assert_eq!(http_get(mobile, "/beta/index").await.0, 200);
    assert_eq!(http_get(mobile, "/vortex").await.0, 200);
    assert_eq!(http_get(mobile, "/gamma/index").await.0, 404);
    // Mobile content is not published on the doc root
    assert_eq!(http_get(doc, "/alpha/index").await.0, 404);

    let report = orchestrator.shutdown().await;
    assert!(report.is_clean());
    assert_eq!(orchestrator.phase(), LifecyclePhase::Unloaded);
    assert!(orchestrator.registry().lock().await.is_empty());
    assert!(orchestrator.resources().is_empty());

    let log = entries(&journal);
    let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
    assert!(position("stop:beta") < position("stop:alpha"));
    assert!(position("unload:beta") < position("unload:alpha"));
    assert!(position("stop:alpha") < position("unload:beta"));

    assert!(tokio::net::TcpStream::connect(mobile).await.is_err());
}

#[tokio::test]
async fn test_tcp_transport_loss_triggers_restart() {
    let tmp = tempdir().unwrap();
    let server = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();

    let mut config = test_config(&tmp, &["alpha"], &[]);
    config.server.host = "127.0.0.1".to_string();
    config.server.transport_port = server.local_addr().unwrap().port();

    let journal = journal();
    let catalog = recording_catalog(&["alpha"], &journal, &[]);
    let transport = Arc::new(TcpTransport::new(config.client_name.clone()));
    let restarter = CountingRestarter::new();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut orchestrator =
        Orchestrator::new(config, catalog, transport.clone(), restarter.clone(), shutdown_rx).unwrap();
    assert!(orchestrator.startup().await.is_serving());
    assert!(transport.is_online("outpost-server"));

    let (socket, _) = server.accept().await.unwrap();
    let mut lines = BufReader::new(socket).lines();
    let hello = lines.next_line().await.unwrap().unwrap();
    assert!(hello.contains("outpost-client"));

    // Server goes away
    drop(lines);
    assert!(eventually(|| restarter.restarts() == 1).await);
    assert!(orchestrator.monitor().restart_requested());

    orchestrator.shutdown().await;
    assert_eq!(restarter.restarts(), 1);
}
