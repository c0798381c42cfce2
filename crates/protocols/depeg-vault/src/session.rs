//! Wallet session and the submit → confirm → invalidate flow
//!
//! Signing happens in an external wallet. Once a digest exists, effects are
//! awaited through [`ChainQuery`] and only a confirmed success invalidates
//! cached reads.

use std::future::Future;

use serde::{Deserialize, Serialize};

use depeg_core::{Error, Network, TxDigest, TxError};
use sui_rpc_client::{ChainQuery, QueryCache, QueryKey, QueryKind};
use sui_tx::TransactionRequest;

use crate::constants;

/// Label used when the chain reports a failed execution
pub const FAILED_LABEL: &str = "Transaction failed";

/// Connected wallet able to sign and submit transaction requests
pub trait WalletSession: Send + Sync {
    fn address(&self) -> Option<String>;

    /// Sign and submit. A user or wallet refusal is `TxError::Rejected`
    /// carrying the wallet's own text.
    fn sign_and_submit(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = Result<TxDigest, TxError>> + Send;
}

/// A transaction whose successful effects have been observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    pub digest: TxDigest,
    /// IDs of objects the transaction created
    pub created: Vec<String>,
}

impl TxOutcome {
    pub fn explorer_url(&self, network: Network) -> String {
        network.explorer_tx_url(self.digest.as_str())
    }

    /// First created object, failing if the transaction created none
    pub fn require_created(&self, what: &str) -> Result<&str, TxError> {
        self.created
            .first()
            .map(String::as_str)
            .ok_or_else(|| TxError::Rejected {
                label: FAILED_LABEL.to_string(),
                message: format!("no {} created in transaction", what),
            })
    }
}

/// Cache keys stale after a transaction by `owner` touching `objects`
pub fn invalidations_for(owner: &str, package_id: &str, objects: &[&str]) -> Vec<QueryKey> {
    let mut keys = vec![
        QueryKey::all_coins(owner),
        QueryKey::owned_objects(owner, Some(&constants::underwriter_cap_type(package_id))),
        QueryKey::owned_objects(owner, None),
    ];
    keys.extend(objects.iter().map(|id| QueryKey::object(id)));
    keys
}

/// Drop `keys` and any batched lookup that includes a touched object
pub async fn invalidate_confirmed(cache: &QueryCache, keys: &[QueryKey]) {
    cache.invalidate_many(keys).await;
    for key in keys.iter().filter(|k| k.kind == QueryKind::Object) {
        cache.invalidate_subject(&key.subject).await;
    }
}

/// Await effects for an already-submitted digest, then invalidate on success
pub async fn confirm_digest<C: ChainQuery>(
    chain: &C,
    cache: &QueryCache,
    digest: TxDigest,
    invalidations: &[QueryKey],
) -> Result<TxOutcome, Error> {
    let effects = chain.wait_for_transaction(digest.as_str()).await?;

    if let Some(message) = effects.failure_message() {
        tracing::warn!(digest = %digest, "Transaction failed on-chain: {}", message);
        return Err(TxError::Rejected {
            label: FAILED_LABEL.to_string(),
            message,
        }
        .into());
    }

    invalidate_confirmed(cache, invalidations).await;
    tracing::info!(digest = %digest, invalidated = invalidations.len(), "Transaction confirmed");

    Ok(TxOutcome {
        created: effects.created_ids(),
        digest,
    })
}

/// Submit through the wallet and wait for confirmed effects
pub async fn submit_and_confirm<W: WalletSession, C: ChainQuery>(
    wallet: &W,
    chain: &C,
    cache: &QueryCache,
    tx: &TransactionRequest,
    invalidations: &[QueryKey],
) -> Result<TxOutcome, Error> {
    let digest = wallet.sign_and_submit(tx).await.map_err(|e| {
        tracing::info!("Wallet did not submit transaction: {}", e);
        e
    })?;
    tracing::info!(digest = %digest, "Transaction submitted");
    confirm_digest(chain, cache, digest, invalidations).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockChain, MockWallet, OWNER, PKG};
    use crate::tx_builder;
    use serde_json::Value;
    use sui_rpc_client::CachedChain;

    fn transfer_tx() -> TransactionRequest {
        tx_builder::build_transfer_ds_tx(OWNER, &testing::holdings(), testing::OTHER, 100).unwrap()
    }

    #[tokio::test]
    async fn test_success_invalidates_after_confirmation() {
        let mock = MockChain::standard();
        mock.set_effects("Dg1", testing::success_effects(&[]));
        let cache = QueryCache::default();
        let chain = CachedChain::new(mock, cache.clone());

        chain.get_all_coins(OWNER).await.unwrap();
        chain.get_all_coins(OWNER).await.unwrap();
        assert_eq!(chain.inner().coin_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        let wallet = MockWallet::accepting("Dg1");
        let keys = invalidations_for(OWNER, PKG, &[]);
        let outcome = submit_and_confirm(&wallet, &chain, &cache, &transfer_tx(), &keys)
            .await
            .unwrap();
        assert_eq!(outcome.digest.as_str(), "Dg1");
        assert_eq!(wallet.submitted.lock().unwrap().len(), 1);

        assert!(cache.get(&QueryKey::all_coins(OWNER)).await.is_none());
        chain.get_all_coins(OWNER).await.unwrap();
        assert_eq!(chain.inner().coin_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_cache_and_text() {
        let chain = MockChain::standard();
        chain.set_effects("Dg2", testing::failure_effects("MoveAbort(vault, 4)"));
        let cache = QueryCache::default();
        cache.insert(QueryKey::all_coins(OWNER), Value::Null).await;

        let wallet = MockWallet::accepting("Dg2");
        let keys = invalidations_for(OWNER, PKG, &[]);
        let err = submit_and_confirm(&wallet, &chain, &cache, &transfer_tx(), &keys)
            .await
            .unwrap_err();
        match err {
            Error::Transaction(TxError::Rejected { label, message }) => {
                assert_eq!(label, FAILED_LABEL);
                assert_eq!(message, "MoveAbort(vault, 4)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(cache.get(&QueryKey::all_coins(OWNER)).await.is_some());
    }

    #[tokio::test]
    async fn test_wallet_rejection_is_verbatim() {
        let chain = MockChain::standard();
        let cache = QueryCache::default();
        cache.insert(QueryKey::all_coins(OWNER), Value::Null).await;

        let wallet = MockWallet::rejecting("User rejected the request.");
        let err = submit_and_confirm(&wallet, &chain, &cache, &transfer_tx(), &[QueryKey::all_coins(OWNER)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("User rejected the request."));
        assert!(cache.get(&QueryKey::all_coins(OWNER)).await.is_some());
    }

    #[tokio::test]
    async fn test_confirm_timeout_leaves_cache() {
        let chain = MockChain::standard();
        let cache = QueryCache::default();
        cache.insert(QueryKey::object("0xv1"), Value::Null).await;
        let err = confirm_digest(&chain, &cache, TxDigest::new("Unknown"), &[QueryKey::object("0xv1")])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "timeout");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_object_invalidation_covers_batches() {
        let chain = MockChain::standard();
        chain.set_effects("Dg3", testing::success_effects(&["0xnewvault"]));
        let cache = QueryCache::default();
        cache
            .insert(QueryKey::multi_objects(&["0xv1".into(), "0xv2".into()]), Value::Null)
            .await;
        cache.insert(QueryKey::object("0xregistry"), Value::Null).await;

        let keys = invalidations_for(OWNER, PKG, &["0xv1", "0xregistry"]);
        let outcome = confirm_digest(&chain, &cache, TxDigest::new("Dg3"), &keys)
            .await
            .unwrap();
        assert_eq!(outcome.require_created("vault").unwrap(), "0xnewvault");
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_outcome_helpers() {
        let outcome = TxOutcome {
            digest: TxDigest::new("Abc"),
            created: vec![],
        };
        assert_eq!(
            outcome.explorer_url(Network::Testnet),
            "https://suiscan.xyz/testnet/tx/Abc"
        );
        assert!(matches!(
            outcome.require_created("vault"),
            Err(TxError::Rejected { .. })
        ));
    }
}
