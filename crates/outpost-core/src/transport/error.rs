use std::time::Duration;

use thiserror::Error;

use crate::site::SiteError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Could not connect to peer '{peer}' at {addr}: {source}")]
    Connect {
        peer: String,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connecting to peer '{peer}' timed out after {after:?}")]
    Timeout { peer: String, after: Duration },

    #[error("Peer '{0}' is not connected")]
    NotConnected(String),

    #[error("Transport endpoint error: {0}")]
    Site(#[from] SiteError),
}
