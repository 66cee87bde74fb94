/// Application name
pub const APP_NAME: &str = "Outpost";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// This node's default name on the transport
pub const DEFAULT_CLIENT_NAME: &str = "outpost-client";

/// Peer name of the central server on the transport
pub const SERVER_PEER_NAME: &str = "outpost-server";

/// Name the transport endpoint is attached under on the mobile and desktop roots
pub const TRANSPORT_RESOURCE_NAME: &str = "vortex";

/// Default server transport port
pub const DEFAULT_TRANSPORT_PORT: u16 = 8011;

/// Default mobile site port
pub const DEFAULT_MOBILE_PORT: u16 = 8000;

/// Default WebSocket port
pub const DEFAULT_WEBSOCKET_PORT: u16 = 8001;

/// Default desktop site port
pub const DEFAULT_DESKTOP_PORT: u16 = 8002;

/// Default documentation site port
pub const DEFAULT_DOC_PORT: u16 = 8004;

/// Seconds a single connect attempt may take
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default plugins directory
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";

/// Name of the scratch directory under the system temp dir
pub const TMP_DIR_NAME: &str = "outpost";

/// Permissions for directories the client creates
pub const DEFAULT_DIR_MODE: &str = "0700";
