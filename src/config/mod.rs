//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub web: WebConfig,
}

/// Game server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the WebSocket listener to
    pub bind: String,

    /// Port for the WebSocket listener
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

/// Static asset server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Port for the static file server
    pub port: u16,

    /// Directory holding the client UI
    pub root: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8002,
            root: PathBuf::from("web"),
        }
    }
}

impl Config {
    /// Load config from the default file, or return defaults if not found.
    ///
    /// A `PORT` environment variable overrides the game server port either
    /// way (hosting platforms hand the port out this way).
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        Ok(config)
    }

    /// Load config from a specific file, or return defaults if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fourup")
            .join("config.toml")
    }

    /// Socket address the game server listens on
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.bind, self.server.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))
    }

    /// Socket address the static file server listens on
    pub fn web_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.bind, self.web.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))
    }
}
