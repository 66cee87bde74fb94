use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while bringing an HTTP front-end up or down.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Failed to bind site '{name}' on {addr}: {source}")]
    Bind {
        name: String,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read local address of site '{name}': {source}")]
    LocalAddr {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Site '{name}' task ended abnormally: {message}")]
    Task { name: String, message: String },
}
