//! sui-rpc-client: JSON-RPC client for a Sui fullnode
//!
//! This crate provides a high-level client for reading vault state, coin
//! balances and transaction effects, plus a keyed query cache and the
//! [`ChainQuery`] trait the vault logic is written against.

pub mod cache;
pub mod queries;
pub mod status;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use depeg_core::{AppConfig, NodeError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

pub use cache::{CachedChain, QueryCache, QueryKey, QueryKind, DEFAULT_CACHE_TTL};
pub use queries::{
    ChainQuery, CoinMetadata, CoinStruct, ExecutionStatus, ObjectRef, ObjectResponse,
    OwnedObjectRef, Page, SuiObject, TxBlockResponse, TxEffects,
};
pub use status::NodeStatus;

/// Default timeout for fullnode calls (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for a submitted transaction's effects
const DEFAULT_TX_WAIT: Duration = Duration::from_secs(60);

/// Interval between effects polls
const TX_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Items per page for paginated queries
const PAGE_LIMIT: u32 = 50;

/// Most IDs the fullnode accepts in one `sui_multiGetObjects` call
const MULTI_GET_LIMIT: usize = 50;

/// Upper bound on pages followed for one query
const MAX_PAGES: usize = 100;

/// Result type for fullnode client operations
pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

impl RpcEnvelope {
    fn into_result<T: DeserializeOwned>(self, method: &str) -> Result<T> {
        if let Some(err) = self.error {
            return Err(NodeError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = self.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| NodeError::ParseError(format!("{}: {}", method, e)))
    }
}

fn object_options() -> Value {
    json!({ "showType": true, "showOwner": true, "showContent": true })
}

/// `sui_multiGetObjects` params, one set per batch of at most [`MULTI_GET_LIMIT`] IDs
fn multi_get_params(object_ids: &[String]) -> Vec<(&[String], Value)> {
    object_ids
        .chunks(MULTI_GET_LIMIT)
        .map(|batch| (batch, json!([batch, object_options()])))
        .collect()
}

/// High-level Sui fullnode client
#[derive(Clone)]
pub struct SuiClient {
    http: reqwest::Client,
    url: String,
    request_timeout: Duration,
    tx_wait: Duration,
    next_id: Arc<AtomicU64>,
    status: Arc<RwLock<Option<NodeStatus>>>,
}

impl SuiClient {
    /// Create a client for `url` without contacting the node
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .user_agent("depeg-swap")
            .build()
            .map_err(|e| NodeError::Unreachable {
                url: format!("{}: {}", url, e),
            })?;

        Ok(Self {
            http,
            url,
            request_timeout,
            tx_wait: DEFAULT_TX_WAIT,
            next_id: Arc::new(AtomicU64::new(1)),
            status: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a client from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = match config.rpc.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        Self::new(config.rpc_url(), timeout)
    }

    /// Override how long [`ChainQuery::wait_for_transaction`] waits
    pub fn with_tx_wait(mut self, wait: Duration) -> Self {
        self.tx_wait = wait;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Re-probe the node and remember the result
    pub async fn refresh_status(&self) -> NodeStatus {
        let status = status::detect_status(self).await;
        let mut lock = self.status.write().await;
        *lock = Some(status.clone());
        status
    }

    /// Last probed status (may be stale)
    pub async fn status(&self) -> Option<NodeStatus> {
        self.status.read().await.clone()
    }

    pub async fn is_online(&self) -> bool {
        self.latest_checkpoint().await.is_ok()
    }

    /// Issue one JSON-RPC call
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "Fullnode request");

        let envelope: RpcEnvelope = timed_request(method, self.request_timeout, async {
            let response = self
                .http
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| NodeError::Unreachable {
                    url: format!("{}: {}", self.url, e),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(NodeError::ApiError {
                    message: format!("{} returned HTTP {}", method, status),
                });
            }

            response
                .json::<RpcEnvelope>()
                .await
                .map_err(|e| NodeError::ParseError(format!("{}: {}", method, e)))
        })
        .await?;

        envelope.into_result(method)
    }

    /// Follow `nextCursor` until the last page
    async fn paginate<T: DeserializeOwned>(
        &self,
        method: &str,
        params_for: impl Fn(&Value) -> Value,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor = Value::Null;

        for _ in 0..MAX_PAGES {
            let page: Page<T> = self.call(method, params_for(&cursor)).await?;
            items.extend(page.data);
            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = next,
                _ => return Ok(items),
            }
        }

        tracing::warn!(method, pages = MAX_PAGES, "Stopped paginating at page limit");
        Ok(items)
    }

    pub async fn get_object(&self, object_id: &str) -> Result<SuiObject> {
        let response: ObjectResponse = self
            .call("sui_getObject", json!([object_id, object_options()]))
            .await?;
        response.into_object(object_id)
    }

    /// Objects for `object_ids` in order, fetched in batches the node accepts
    pub async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<SuiObject>> {
        let mut objects = Vec::with_capacity(object_ids.len());
        for (batch, params) in multi_get_params(object_ids) {
            let responses: Vec<ObjectResponse> = self.call("sui_multiGetObjects", params).await?;
            if responses.len() != batch.len() {
                return Err(NodeError::ParseError(format!(
                    "sui_multiGetObjects returned {} objects for {} IDs",
                    responses.len(),
                    batch.len()
                )));
            }
            for (resp, id) in responses.into_iter().zip(batch) {
                objects.push(resp.into_object(id)?);
            }
        }
        Ok(objects)
    }

    pub async fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: Option<&str>,
    ) -> Result<Vec<SuiObject>> {
        let filter = match struct_type {
            Some(t) => json!({ "MatchAll": [{ "StructType": t }] }),
            None => Value::Null,
        };
        let query = json!({ "filter": filter, "options": object_options() });

        let responses: Vec<ObjectResponse> = self
            .paginate("suix_getOwnedObjects", |cursor| {
                json!([owner, query, cursor, PAGE_LIMIT])
            })
            .await?;

        Ok(responses.into_iter().filter_map(|r| r.data).collect())
    }

    pub async fn get_all_coins(&self, owner: &str) -> Result<Vec<CoinStruct>> {
        self.paginate("suix_getAllCoins", |cursor| json!([owner, cursor, PAGE_LIMIT]))
            .await
    }

    pub async fn get_coin_metadata(&self, coin_type: &str) -> Result<Option<CoinMetadata>> {
        self.call("suix_getCoinMetadata", json!([coin_type])).await
    }

    pub async fn get_transaction_block(&self, digest: &str) -> Result<TxBlockResponse> {
        self.call(
            "sui_getTransactionBlock",
            json!([digest, { "showEffects": true }]),
        )
        .await
    }

    /// Poll until the transaction's effects are available or `wait` elapses
    pub async fn wait_for_effects(&self, digest: &str, wait: Duration) -> Result<TxEffects> {
        let start = Instant::now();

        loop {
            match self.get_transaction_block(digest).await {
                Ok(TxBlockResponse {
                    effects: Some(effects),
                    ..
                }) => {
                    tracing::info!(
                        digest,
                        status = %effects.status.status,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Transaction effects available"
                    );
                    return Ok(effects);
                }
                Ok(_) => {}
                // Not yet indexed by this fullnode
                Err(NodeError::Rpc { message, .. }) => {
                    tracing::debug!(digest, "Effects not yet available: {}", message);
                }
                Err(e) => return Err(e),
            }

            if start.elapsed() >= wait {
                return Err(NodeError::Timeout {
                    what: format!("effects of {}", digest),
                    secs: wait.as_secs(),
                });
            }
            tokio::time::sleep(TX_POLL_INTERVAL).await;
        }
    }

    pub async fn chain_identifier(&self) -> Result<String> {
        self.call("sui_getChainIdentifier", json!([])).await
    }

    pub async fn latest_checkpoint(&self) -> Result<u64> {
        let seq: String = self
            .call("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await?;
        seq.parse()
            .map_err(|_| NodeError::ParseError(format!("invalid checkpoint number '{}'", seq)))
    }
}

impl ChainQuery for SuiClient {
    async fn get_object(&self, object_id: &str) -> Result<SuiObject> {
        SuiClient::get_object(self, object_id).await
    }

    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<SuiObject>> {
        SuiClient::multi_get_objects(self, object_ids).await
    }

    async fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: Option<&str>,
    ) -> Result<Vec<SuiObject>> {
        SuiClient::get_owned_objects(self, owner, struct_type).await
    }

    async fn get_all_coins(&self, owner: &str) -> Result<Vec<CoinStruct>> {
        SuiClient::get_all_coins(self, owner).await
    }

    async fn get_coin_metadata(&self, coin_type: &str) -> Result<Option<CoinMetadata>> {
        SuiClient::get_coin_metadata(self, coin_type).await
    }

    async fn wait_for_transaction(&self, digest: &str) -> Result<TxEffects> {
        self.wait_for_effects(digest, self.tx_wait).await
    }
}

/// Wrap a fullnode call with the request timeout
async fn timed_request<T>(
    what: &str,
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| NodeError::Timeout {
            what: what.to_string(),
            secs: timeout.as_secs(),
        })?
}
