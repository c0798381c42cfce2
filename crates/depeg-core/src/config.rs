//! Configuration types for Depeg Swap

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::amount::DisplayPolicy;
use crate::errors::Error;
use crate::Network;

/// Fullnode connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Fullnode URL. Falls back to the network's public fullnode when unset.
    #[serde(default)]
    pub url: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Well-known on-chain objects of the vault program deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub registry_id: String,
    #[serde(default)]
    pub treasury_id: String,
}

/// How amounts are rendered in API responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub policy: DisplayPolicy,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network (devnet, testnet or mainnet)
    pub network: Network,

    /// Fullnode settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Vault program object IDs
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Amount display density
    #[serde(default)]
    pub display: DisplayConfig,

    /// Interface the API listens on
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    19055
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            rpc: RpcConfig::default(),
            deployment: DeploymentConfig::default(),
            display: DisplayConfig::default(),
            api_host: default_api_host(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Effective fullnode URL
    pub fn rpc_url(&self) -> String {
        self.rpc
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.network.default_rpc_url().to_string())
    }

    /// Socket address the API binds to
    pub fn api_addr(&self) -> Result<SocketAddr, Error> {
        let ip: IpAddr = self
            .api_host
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid api_host '{}'", self.api_host)))?;
        Ok(SocketAddr::new(ip, self.api_port))
    }

    /// Read a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Load from `DEPEG_CONFIG` (if set), then apply `DEPEG_*` overrides
    pub fn load() -> Result<Self, Error> {
        let base = match std::env::var("DEPEG_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_json_file(path)?,
            _ => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `DEPEG_*` overrides from a lookup function
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        if let Some(network) = lookup("DEPEG_NETWORK") {
            self.network = Network::parse(&network)
                .ok_or_else(|| Error::Config(format!("unknown network '{}'", network)))?;
        }
        if let Some(url) = lookup("DEPEG_RPC_URL") {
            self.rpc.url = Some(url);
        }
        if let Some(id) = lookup("DEPEG_PACKAGE_ID") {
            self.deployment.package_id = id;
        }
        if let Some(id) = lookup("DEPEG_REGISTRY_ID") {
            self.deployment.registry_id = id;
        }
        if let Some(id) = lookup("DEPEG_TREASURY_ID") {
            self.deployment.treasury_id = id;
        }
        if let Some(host) = lookup("DEPEG_API_HOST") {
            self.api_host = host;
        }
        if let Some(port) = lookup("DEPEG_API_PORT") {
            self.api_port = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid port '{}'", port)))?;
        }
        Ok(self)
    }
}
