//! Application state shared across API handlers

use std::sync::Arc;
use std::time::Instant;

use depeg_core::{AppConfig, Network, NodeError, ProtocolError};
use depeg_vault::Deployment;
use sui_rpc_client::{CachedChain, QueryCache, SuiClient};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::watcher::TxWatcherState;

/// Errors raised while updating shared state
#[derive(Debug, Error)]
pub enum StateError {
    /// Wallet address is not `0x` plus 64 hex digits
    #[error("Invalid wallet address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Unknown network '{0}'")]
    UnknownNetwork(String),
}

/// State representing a connected wallet
#[derive(Clone, Debug)]
pub struct WalletState {
    /// Normalized Sui account address
    pub address: String,
    pub connected_at: Instant,
}

impl WalletState {
    pub fn new(address: String) -> Self {
        Self {
            address,
            connected_at: Instant::now(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    client: RwLock<Option<SuiClient>>,
    cache: QueryCache,
    wallet: RwLock<Option<WalletState>>,
    watcher: TxWatcherState,
}

impl AppState {
    /// Create a new application state with default config
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create with a specific config
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                client: RwLock::new(None),
                cache: QueryCache::default(),
                wallet: RwLock::new(None),
                watcher: TxWatcherState::new(),
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    pub async fn network(&self) -> Network {
        self.inner.config.read().await.network
    }

    /// Vault program objects from the current config
    pub async fn deployment(&self) -> Result<Deployment, ProtocolError> {
        Deployment::from_config(&self.inner.config.read().await.deployment)
    }

    /// Switch network and/or fullnode URL. The cached client and all cached
    /// reads are dropped.
    pub async fn set_rpc_config(
        &self,
        network: Option<&str>,
        url: Option<String>,
    ) -> Result<(), StateError> {
        let network = network
            .map(|n| Network::parse(n).ok_or_else(|| StateError::UnknownNetwork(n.to_string())))
            .transpose()?;

        {
            let mut config = self.inner.config.write().await;
            if let Some(network) = network {
                config.network = network;
            }
            if url.is_some() {
                config.rpc.url = url.filter(|u| !u.trim().is_empty());
            }
            tracing::info!(network = %config.network, url = %config.rpc_url(), "RPC configuration updated");
        }

        *self.inner.client.write().await = None;
        self.inner.cache.clear().await;
        Ok(())
    }

    /// Get or create the fullnode client
    pub async fn client(&self) -> Result<SuiClient, NodeError> {
        {
            let client = self.inner.client.read().await;
            if let Some(ref c) = *client {
                return Ok(c.clone());
            }
        }

        let mut cached = self.inner.client.write().await;
        // Another handler may have created it meanwhile
        if let Some(ref c) = *cached {
            return Ok(c.clone());
        }

        let config = self.inner.config.read().await;
        tracing::info!("Creating fullnode client for URL: {}", config.rpc_url());
        let client = SuiClient::from_config(&config).map_err(|e| {
            tracing::warn!("Failed to create fullnode client for {}: {}", config.rpc_url(), e);
            e
        })?;
        *cached = Some(client.clone());
        Ok(client)
    }

    /// Fullnode client whose reads go through the shared cache
    pub async fn chain(&self) -> Result<CachedChain<SuiClient>, NodeError> {
        Ok(CachedChain::new(self.client().await?, self.inner.cache.clone()))
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn watcher(&self) -> &TxWatcherState {
        &self.inner.watcher
    }

    /// Get current wallet state
    pub async fn wallet(&self) -> Option<WalletState> {
        self.inner.wallet.read().await.clone()
    }

    /// Address of the connected wallet, if any
    pub async fn wallet_address(&self) -> Option<String> {
        self.inner.wallet.read().await.as_ref().map(|w| w.address.clone())
    }

    /// Set connected wallet with address validation
    pub async fn set_wallet(&self, address: &str) -> Result<String, StateError> {
        let address = address.trim().to_ascii_lowercase();
        sui_tx::validate_address(&address).map_err(|e| StateError::InvalidAddress {
            reason: e.to_string(),
        })?;

        let mut wallet = self.inner.wallet.write().await;
        *wallet = Some(WalletState::new(address.clone()));
        tracing::info!(address = %address, "Wallet connected");
        Ok(address)
    }

    /// Disconnect wallet and forget its cached reads
    pub async fn disconnect_wallet(&self) {
        let previous = self.inner.wallet.write().await.take();
        if let Some(wallet) = previous {
            self.inner.cache.invalidate_subject(&wallet.address).await;
            tracing::info!(address = %wallet.address, "Wallet disconnected");
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
