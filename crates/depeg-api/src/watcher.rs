//! Background transaction watcher
//!
//! Polls the fullnode for the effects of submitted transactions. A confirmed
//! success invalidates the cached reads the transaction made stale; every
//! resolution is kept as a notification for the frontend to pick up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use depeg_core::{Network, NodeError};
use depeg_vault::session::invalidate_confirmed;
use sui_rpc_client::{QueryKey, TxBlockResponse};

use crate::AppState;

/// How often the background task polls the fullnode (seconds)
const POLL_INTERVAL_SECS: u64 = 5;

/// Items older than this are timed out and removed (seconds)
const TIMEOUT_SECS: u64 = 10 * 60;

/// Resolved notifications kept for the frontend
const MAX_NOTIFICATIONS: usize = 100;

struct WatchItem {
    id: String,
    digest: String,
    operation: String,
    description: String,
    invalidations: Vec<QueryKey>,
    submitted_at: Instant,
}

/// How a watched transaction ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Confirmed,
    Failed(String),
    Timeout,
}

impl Resolution {
    fn kind(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed(_) => "failed",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TxNotification {
    pub id: String,
    /// "confirmed" | "failed" | "timeout"
    pub kind: String,
    pub operation: String,
    pub description: String,
    pub digest: String,
    /// On-chain abort text for failed transactions
    pub error: Option<String>,
    pub explorer_url: String,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WatchedItemInfo {
    pub id: String,
    pub digest: String,
    pub operation: String,
    pub description: String,
    pub elapsed_secs: u64,
}

struct TxWatcher {
    items: Vec<WatchItem>,
    notifications: Vec<TxNotification>,
}

impl TxWatcher {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            notifications: Vec::new(),
        }
    }

    fn add_tx(
        &mut self,
        digest: String,
        operation: String,
        description: String,
        invalidations: Vec<QueryKey>,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.items.push(WatchItem {
            id: id.clone(),
            digest,
            operation,
            description,
            invalidations,
            submitted_at: Instant::now(),
        });
        id
    }

    fn watched_items(&self) -> Vec<WatchedItemInfo> {
        self.items
            .iter()
            .map(|item| WatchedItemInfo {
                id: item.id.clone(),
                digest: item.digest.clone(),
                operation: item.operation.clone(),
                description: item.description.clone(),
                elapsed_secs: item.submitted_at.elapsed().as_secs(),
            })
            .collect()
    }

    fn record(&mut self, notification: TxNotification) {
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    /// Items to look up, with whether each has already timed out
    fn pending(&self) -> Vec<PendingLookup> {
        self.items
            .iter()
            .map(|item| PendingLookup {
                id: item.id.clone(),
                digest: item.digest.clone(),
                timed_out: item.submitted_at.elapsed() > Duration::from_secs(TIMEOUT_SECS),
            })
            .collect()
    }

    /// Remove resolved items and record their notifications. Returns the
    /// cache keys made stale by the confirmed ones.
    fn resolve(&mut self, resolved: Vec<(String, Resolution)>, network: Network) -> Vec<QueryKey> {
        let mut stale = Vec::new();
        for (id, resolution) in resolved {
            let Some(index) = self.items.iter().position(|item| item.id == id) else {
                continue;
            };
            let item = self.items.remove(index);
            tracing::info!(
                digest = %item.digest,
                operation = %item.operation,
                "Watched transaction {}",
                resolution.kind()
            );
            let notification = make_notification(&item, &resolution, network);
            self.record(notification);
            if resolution == Resolution::Confirmed {
                stale.extend(item.invalidations);
            }
        }
        stale
    }
}

struct PendingLookup {
    id: String,
    digest: String,
    timed_out: bool,
}

/// Resolution implied by one effects lookup, `None` while still pending
fn classify_lookup(
    digest: &str,
    lookup: Result<TxBlockResponse, NodeError>,
) -> Option<Resolution> {
    match lookup {
        Ok(TxBlockResponse {
            effects: Some(effects),
            ..
        }) => Some(match effects.failure_message() {
            Some(message) => Resolution::Failed(message),
            None => Resolution::Confirmed,
        }),
        Ok(_) => None,
        // Not yet indexed by this fullnode
        Err(NodeError::Rpc { .. }) => None,
        Err(e) => {
            tracing::warn!(digest, "Effects lookup failed: {}", e);
            None
        }
    }
}

fn make_notification(item: &WatchItem, resolution: &Resolution, network: Network) -> TxNotification {
    TxNotification {
        id: item.id.clone(),
        kind: resolution.kind().to_string(),
        operation: item.operation.clone(),
        description: item.description.clone(),
        digest: item.digest.clone(),
        error: match resolution {
            Resolution::Failed(message) => Some(message.clone()),
            _ => None,
        },
        explorer_url: network.explorer_tx_url(&item.digest),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    }
}

/// Watcher held by [`AppState`]
pub struct TxWatcherState {
    watcher: tokio::sync::Mutex<TxWatcher>,
    polling: Arc<AtomicBool>,
}

impl Default for TxWatcherState {
    fn default() -> Self {
        Self {
            watcher: tokio::sync::Mutex::new(TxWatcher::new()),
            polling: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl TxWatcherState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn watched_items(&self) -> Vec<WatchedItemInfo> {
        self.watcher.lock().await.watched_items()
    }

    /// Resolved transactions, oldest first
    pub async fn notifications(&self) -> Vec<TxNotification> {
        self.watcher.lock().await.notifications.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }
}

/// One pass over the watched items. Returns `false` once nothing is left to
/// watch, after clearing the polling flag under the watcher lock.
async fn poll_once(state: &AppState) -> bool {
    let watcher_state = state.watcher();
    let pending = {
        let watcher = watcher_state.watcher.lock().await;
        if watcher.items.is_empty() {
            watcher_state.polling.store(false, Ordering::SeqCst);
            return false;
        }
        watcher.pending()
    };

    let mut resolved = Vec::new();
    let mut lookups = Vec::new();
    for item in pending {
        if item.timed_out {
            resolved.push((item.id, Resolution::Timeout));
        } else {
            lookups.push(item);
        }
    }

    if !lookups.is_empty() {
        match state.client().await {
            Ok(client) => {
                for item in lookups {
                    let lookup = client.get_transaction_block(&item.digest).await;
                    if let Some(resolution) = classify_lookup(&item.digest, lookup) {
                        resolved.push((item.id, resolution));
                    }
                }
            }
            Err(e) => tracing::debug!("Watcher has no client: {}", e),
        }
    }

    if !resolved.is_empty() {
        let network = state.network().await;
        let stale = watcher_state.watcher.lock().await.resolve(resolved, network);
        invalidate_confirmed(state.cache(), &stale).await;
    }
    true
}

fn ensure_poll_loop(state: &AppState) {
    if state.watcher().polling.swap(true, Ordering::SeqCst) {
        return; // Already running
    }

    let state = state.clone();

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
            if !poll_once(&state).await {
                break;
            }
        }

        tracing::debug!("TxWatcher poll loop stopped (no items)");
    });
}

/// Start watching `digest`; `invalidations` are applied once it succeeds
pub async fn watch_tx(
    state: &AppState,
    digest: String,
    operation: String,
    description: String,
    invalidations: Vec<QueryKey>,
) -> String {
    let id = {
        let mut watcher = state.watcher().watcher.lock().await;
        watcher.add_tx(digest, operation, description, invalidations)
    };
    ensure_poll_loop(state);
    id
}
