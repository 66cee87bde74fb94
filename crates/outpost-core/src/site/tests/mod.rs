use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use crate::resource::{JsonResource, ResourceNode, StaticResource, leaf};
use crate::site::{SiteOptions, router, setup_site};

fn root_with_plugin() -> Arc<ResourceNode> {
    let root = Arc::new(ResourceNode::new());
    let alpha = Arc::new(ResourceNode::new());
    alpha.put_child("index", leaf(StaticResource::html("<h1>alpha</h1>")));
    alpha.put_child("status", leaf(JsonResource::new(|| serde_json::json!({ "alpha": "up" }))));
    root.put_child("alpha", alpha);
    root
}

fn loopback() -> SiteOptions {
    SiteOptions {
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}

#[tokio::test]
async fn test_router_dispatches_into_tree() {
    let app = router(root_with_plugin());
    let response = app
        .oneshot(Request::builder().uri("/alpha/index").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html; charset=utf-8"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>alpha</h1>");
}

#[tokio::test]
async fn test_router_json_leaf() {
    let app = router(root_with_plugin());
    let response = app
        .oneshot(Request::builder().uri("/alpha/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["alpha"], "up");
}

#[tokio::test]
async fn test_router_sees_unmount() {
    let root = root_with_plugin();
    let app = router(Arc::clone(&root));
    root.delete_child("alpha");

    let response = app
        .oneshot(Request::builder().uri("/alpha/index").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_router_method_not_allowed() {
    let app = router(root_with_plugin());
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/alpha/index")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_setup_site_serves_and_closes() {
    let handle = setup_site("mobile", root_with_plugin(), 0, &loopback()).await.unwrap();
    let addr = handle.local_addr();
    assert_ne!(addr.port(), 0);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /alpha/index HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);
    assert!(text.starts_with("HTTP/1.1 200"), "unexpected response: {text}");
    assert!(text.ends_with("<h1>alpha</h1>"));

    handle.close().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_setup_site_port_in_use() {
    let first = setup_site("desktop", root_with_plugin(), 0, &loopback()).await.unwrap();
    let port = first.local_addr().port();

    let second = setup_site("desktop-again", root_with_plugin(), port, &loopback()).await;
    assert!(second.is_err());
    first.close().await.unwrap();
}
