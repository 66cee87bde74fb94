//! # Outpost Client Configuration
//!
//! The client reads one configuration file at startup. JSON is always
//! available; YAML and TOML are behind the `yaml-config` and `toml-config`
//! features. Every key has a default, so an empty file is a valid
//! configuration that connects to a server on localhost and runs no plugins.
pub mod error;

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;

use crate::kernel::constants;
use crate::plugin_system::error::RegistryError;
use crate::plugin_system::platform::PlatformSettings;
use crate::plugin_system::registry::PluginSet;
use crate::site::SiteOptions;

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Where the central server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub transport_port: u16,
    /// Peer name the server uses on the transport
    pub peer_name: String,
    pub connect_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            transport_port: constants::DEFAULT_TRANSPORT_PORT,
            peer_name: constants::SERVER_PEER_NAME.to_string(),
            connect_timeout_secs: constants::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Ports of the front-ends this node serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesSection {
    pub mobile_port: u16,
    pub desktop_port: u16,
    pub doc_port: u16,
    pub websocket_port: u16,
    pub bind_address: IpAddr,
}

impl Default for SitesSection {
    fn default() -> Self {
        Self {
            mobile_port: constants::DEFAULT_MOBILE_PORT,
            desktop_port: constants::DEFAULT_DESKTOP_PORT,
            doc_port: constants::DEFAULT_DOC_PORT,
            websocket_port: constants::DEFAULT_WEBSOCKET_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// One of off/error/warn/info/debug/trace
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Scratch directory, created at startup
    pub tmp_path: PathBuf,
    /// Octal permissions for directories the client creates
    pub dir_mode: String,
    /// One sub-directory per plugin package
    pub plugin_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            tmp_path: std::env::temp_dir().join(constants::TMP_DIR_NAME),
            dir_mode: constants::DEFAULT_DIR_MODE.to_string(),
            plugin_dir: PathBuf::from(constants::DEFAULT_PLUGIN_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    pub core: Vec<String>,
    pub optional: Vec<String>,
}

/// Client node configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// This node's name on the transport
    pub client_name: String,
    /// Reported in the startup log line
    pub platform_version: String,
    pub server: ServerSection,
    pub sites: SitesSection,
    pub logging: LoggingSection,
    pub paths: PathsSection,
    pub plugins: PluginsSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: constants::DEFAULT_CLIENT_NAME.to_string(),
            platform_version: env!("CARGO_PKG_VERSION").to_string(),
            server: ServerSection::default(),
            sites: SitesSection::default(),
            logging: LoggingSection::default(),
            paths: PathsSection::default(),
            plugins: PluginsSection::default(),
        }
    }
}

impl ClientConfig {
    /// Read and validate the file at `path`; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse_str(&data, format)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate `data` in `format`.
    pub fn parse_str(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| parse_error(format, e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                // An empty YAML document is null rather than an empty map
                if data.trim().is_empty() {
                    Self::default()
                } else {
                    serde_yaml::from_str(data).map_err(|e| parse_error(format, e))?
                }
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| parse_error(format, e))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every value that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.plugin_set()?;
        self.dir_mode()?;
        self.log_level_filter()?;
        if self.server.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.connect_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The configured core and optional plugin lists
    pub fn plugin_set(&self) -> Result<PluginSet, ConfigError> {
        // The transport endpoint owns this child on the mobile and desktop roots
        let reserved = constants::TRANSPORT_RESOURCE_NAME;
        if self.plugins.core.iter().chain(&self.plugins.optional).any(|name| name == reserved) {
            return Err(RegistryError::ReservedName(reserved.to_string()).into());
        }
        Ok(PluginSet::new(
            self.plugins.core.clone(),
            self.plugins.optional.clone(),
        )?)
    }

    /// `paths.dir_mode` as permission bits
    pub fn dir_mode(&self) -> Result<u32, ConfigError> {
        let raw = self.paths.dir_mode.trim();
        let digits = raw.strip_prefix("0o").unwrap_or(raw);
        match u32::from_str_radix(digits, 8) {
            Ok(mode) if mode <= 0o7777 => Ok(mode),
            Ok(_) => Err(ConfigError::InvalidValue {
                key: "paths.dir_mode".to_string(),
                message: format!("'{}' is out of range", raw),
            }),
            Err(e) => Err(ConfigError::InvalidValue {
                key: "paths.dir_mode".to_string(),
                message: format!("'{}' is not an octal mode: {}", raw, e),
            }),
        }
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        log::LevelFilter::from_str(self.logging.level.trim()).map_err(|_| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            message: format!("'{}' is not a log level", self.logging.level),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_secs)
    }

    pub fn site_options(&self) -> SiteOptions {
        SiteOptions {
            bind_address: self.sites.bind_address,
        }
    }

    /// What every plugin's platform hook is built from
    pub fn platform_settings(&self) -> PlatformSettings {
        PlatformSettings {
            plugin_dir: self.paths.plugin_dir.clone(),
            server_peer_name: self.server.peer_name.clone(),
            tmp_dir: self.paths.tmp_path.clone(),
        }
    }
}

fn parse_error(format: ConfigFormat, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Parse {
        format: format.extension().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests;
