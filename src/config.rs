//! Runtime configuration.
//!
//! Read from an optional YAML file named by `RELAY_CONFIG`, then overridden
//! by `LISTEN`, `LISTEN_PREFIX` and `TARGET_PREFIX`.

use anyhow::Context;
use serde::Deserialize;

use crate::proxy::mapping::{MappingError, ProxyMapping};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_TARGET_PREFIX: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub listen_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL clients use; `http://{listen_addr}` when unset
    pub listen_prefix: Option<String>,
    /// Upstream base URL substituted for the listen prefix
    pub target_prefix: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Loads from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Loads using `lookup` in place of the environment.
    pub fn from_env<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup("RELAY_CONFIG") {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path))?
            }
            None => Self::default(),
        };

        if let Some(addr) = lookup("LISTEN") {
            cfg.server.listen_addr = addr;
        }
        if let Some(prefix) = lookup("LISTEN_PREFIX") {
            cfg.proxy.listen_prefix = Some(prefix);
        }
        if let Some(prefix) = lookup("TARGET_PREFIX") {
            cfg.proxy.target_prefix = Some(prefix);
        }

        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn listen_prefix(&self) -> String {
        self.proxy
            .listen_prefix
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.server.listen_addr))
    }

    pub fn target_prefix(&self) -> String {
        self.proxy
            .target_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_TARGET_PREFIX.to_string())
    }

    /// Validated prefix pair for the proxy.
    pub fn mapping(&self) -> Result<ProxyMapping, MappingError> {
        ProxyMapping::new(self.listen_prefix(), self.target_prefix())
    }
}
