//! Keyed query cache
//!
//! Results are stored as JSON values under a [`QueryKey`] and expire after a
//! TTL. Stale reads are acceptable until the owner of a confirmed transaction
//! invalidates the keys it touched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::queries::{ChainQuery, CoinMetadata, CoinStruct, SuiObject, TxEffects};
use crate::Result;

/// Default lifetime of a cached entry
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    AllCoins,
    OwnedObjects,
    Object,
    MultiObjects,
    CoinMetadata,
}

/// Cache key: what was asked, and about whom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub subject: String,
}

impl QueryKey {
    pub fn new(kind: QueryKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }

    pub fn all_coins(owner: &str) -> Self {
        Self::new(QueryKind::AllCoins, owner)
    }

    /// Owned objects of `owner`; a struct filter is appended after `|`.
    pub fn owned_objects(owner: &str, struct_type: Option<&str>) -> Self {
        match struct_type {
            Some(t) => Self::new(QueryKind::OwnedObjects, format!("{}|{}", owner, t)),
            None => Self::new(QueryKind::OwnedObjects, owner),
        }
    }

    pub fn object(object_id: &str) -> Self {
        Self::new(QueryKind::Object, object_id)
    }

    /// Order-insensitive key for a batch lookup
    pub fn multi_objects(object_ids: &[String]) -> Self {
        let mut ids = object_ids.to_vec();
        ids.sort();
        ids.dedup();
        Self::new(QueryKind::MultiObjects, ids.join(","))
    }

    pub fn coin_metadata(coin_type: &str) -> Self {
        Self::new(QueryKind::CoinMetadata, coin_type)
    }

    /// Whether this key holds data about `subject` (an owner or object ID)
    pub fn concerns(&self, subject: &str) -> bool {
        if self.subject == subject {
            return true;
        }
        match self.kind {
            QueryKind::OwnedObjects => self
                .subject
                .split_once('|')
                .is_some_and(|(owner, _)| owner == subject),
            QueryKind::MultiObjects => self.subject.split(',').any(|id| id == subject),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Shared TTL cache of query results
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Store `value` under `key`, dropping every expired entry first
    pub async fn insert(&self, key: QueryKey, value: Value) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached value, or run `fetch` and cache its result.
    /// Errors are never cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(&key).await {
            match serde_json::from_value(value) {
                Ok(hit) => {
                    tracing::debug!(kind = ?key.kind, subject = %key.subject, "Query cache hit");
                    return Ok(hit);
                }
                Err(e) => {
                    tracing::warn!(kind = ?key.kind, "Discarding undecodable cache entry: {}", e);
                }
            }
        }

        let fresh = fetch().await?;
        if let Ok(value) = serde_json::to_value(&fresh) {
            self.insert(key, value).await;
        }
        Ok(fresh)
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.entries.write().await.remove(key);
    }

    pub async fn invalidate_many(&self, keys: &[QueryKey]) {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
    }

    /// Drop every entry about an owner or object
    pub async fn invalidate_subject(&self, subject: &str) {
        self.entries
            .write()
            .await
            .retain(|k, _| !k.concerns(subject));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// [`ChainQuery`] wrapper that serves reads through a [`QueryCache`].
/// Transaction effects are never cached.
#[derive(Debug, Clone)]
pub struct CachedChain<C> {
    inner: C,
    cache: QueryCache,
}

impl<C: ChainQuery> CachedChain<C> {
    pub fn new(inner: C, cache: QueryCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

impl<C: ChainQuery> ChainQuery for CachedChain<C> {
    async fn get_object(&self, object_id: &str) -> Result<SuiObject> {
        self.cache
            .get_or_fetch(QueryKey::object(object_id), || {
                self.inner.get_object(object_id)
            })
            .await
    }

    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<SuiObject>> {
        self.cache
            .get_or_fetch(QueryKey::multi_objects(object_ids), || {
                self.inner.multi_get_objects(object_ids)
            })
            .await
    }

    async fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: Option<&str>,
    ) -> Result<Vec<SuiObject>> {
        self.cache
            .get_or_fetch(QueryKey::owned_objects(owner, struct_type), || {
                self.inner.get_owned_objects(owner, struct_type)
            })
            .await
    }

    async fn get_all_coins(&self, owner: &str) -> Result<Vec<CoinStruct>> {
        self.cache
            .get_or_fetch(QueryKey::all_coins(owner), || self.inner.get_all_coins(owner))
            .await
    }

    async fn get_coin_metadata(&self, coin_type: &str) -> Result<Option<CoinMetadata>> {
        self.cache
            .get_or_fetch(QueryKey::coin_metadata(coin_type), || {
                self.inner.get_coin_metadata(coin_type)
            })
            .await
    }

    async fn wait_for_transaction(&self, digest: &str) -> Result<TxEffects> {
        self.inner.wait_for_transaction(digest).await
    }
}
