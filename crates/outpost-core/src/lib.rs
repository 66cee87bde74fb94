pub mod config;
pub mod kernel;
pub mod plugin_system;
pub mod resource;
pub mod site;
pub mod transport;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and plugins
pub use config::{ClientConfig, ConfigError, ConfigFormat};
pub use kernel::error::Error as KernelError;
pub use kernel::{LifecyclePhase, Orchestrator, ReexecRestarter, StartupOutcome};
pub use plugin_system::{Partition, PlatformHook, Plugin, PluginCatalog, PluginError};
pub use resource::{FrontEnd, Resource, ResourceNode, ResourceRequest, ResourceResponse};
pub use transport::{TcpTransport, Transport};
