//! # Outpost HTTP Sites
//!
//! Serves a [`ResourceNode`] root over HTTP. Every request path is resolved
//! through the resource tree at request time, so subtrees mounted or removed
//! while the site runs are picked up without rebuilding the router.
pub mod error;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use error::SiteError;

use crate::resource::{ResourceNode, ResourceRequest, ResourceResponse};

/// Listener options shared by every site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteOptions {
    pub bind_address: IpAddr,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

/// A running front-end. Dropping the handle without calling [`close`]
/// leaves the server running until the runtime shuts down.
///
/// [`close`]: SiteHandle::close
#[derive(Debug)]
pub struct SiteHandle {
    name: String,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SiteHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound address; useful when the configured port was 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn close(mut self) -> Result<(), SiteError> {
        if let Some(shutdown) = self.shutdown.take() {
            // The server may already be gone
            let _ = shutdown.send(());
        }
        let name = self.name;
        self.task.await.map_err(|e| SiteError::Task {
            name: name.clone(),
            message: e.to_string(),
        })?;
        log::info!("Site '{}' closed", name);
        Ok(())
    }
}

/// Serve `root` on `port`.
pub async fn setup_site(
    name: &str,
    root: Arc<ResourceNode>,
    port: u16,
    options: &SiteOptions,
) -> Result<SiteHandle, SiteError> {
    serve(name, router(root), port, options).await
}

/// Router that hands every request to the resource tree under `root`.
pub fn router(root: Arc<ResourceNode>) -> Router {
    Router::new().fallback(dispatch).with_state(root)
}

/// Bind `port` and run `app` on a background task until the handle is closed.
pub(crate) async fn serve(name: &str, app: Router, port: u16, options: &SiteOptions) -> Result<SiteHandle, SiteError> {
    let addr = SocketAddr::new(options.bind_address, port);
    let listener = TcpListener::bind(addr).await.map_err(|source| SiteError::Bind {
        name: name.to_string(),
        addr,
        source,
    })?;
    let local_addr = listener.local_addr().map_err(|source| SiteError::LocalAddr {
        name: name.to_string(),
        source,
    })?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task_name = name.to_string();
    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            log::error!("Site '{}' stopped with error: {}", task_name, e);
        }
    });

    log::info!("Site '{}' listening on {}", name, local_addr);
    Ok(SiteHandle {
        name: name.to_string(),
        local_addr,
        shutdown: Some(shutdown_tx),
        task,
    })
}

async fn dispatch(State(root): State<Arc<ResourceNode>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let request = ResourceRequest {
        method: method.as_str().to_string(),
        remaining: Vec::new(),
        query: uri.query().map(str::to_string),
        body: body.to_vec(),
    };
    let rendered = root.render_path(uri.path(), request);
    log::debug!("{} {} -> {}", method, uri.path(), rendered.status);
    into_response(rendered)
}

fn into_response(rendered: ResourceResponse) -> Response {
    let status = StatusCode::from_u16(rendered.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, rendered.content_type)], rendered.body).into_response()
}

#[cfg(test)]
mod tests;
