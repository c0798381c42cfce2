//! Transaction confirmation endpoints
//!
//! The wallet submits and returns a digest. `confirm` blocks until effects
//! arrive; `watch` hands the digest to the background watcher instead.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use depeg_core::TxDigest;
use depeg_vault::{confirm_digest, invalidations_for, TxOutcome};
use sui_rpc_client::QueryKey;

use crate::dto::{TxConfirmRequest, TxConfirmResponse, WatchTxRequest, WatchTxResponse};
use crate::routes::{bad_request, chain, error_response, object_id, ApiResult};
use crate::watcher::{self, TxNotification, WatchedItemInfo};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/confirm", post(confirm))
        .route("/watch", post(watch))
        .route("/watched", get(watched))
        .route("/notifications", get(notifications))
}

/// Cache keys to drop once a transaction by the connected wallet succeeds
async fn stale_keys(state: &AppState, vault_id: Option<&str>) -> Vec<QueryKey> {
    let owner = state.wallet_address().await;
    let deployment = state.deployment().await.ok();

    let mut objects: Vec<&str> = vault_id.into_iter().collect();
    if let Some(ref d) = deployment {
        objects.push(&d.registry_id);
    }

    match (owner, deployment.as_ref()) {
        (Some(owner), Some(d)) => invalidations_for(&owner, &d.package_id, &objects),
        _ => objects.into_iter().map(QueryKey::object).collect(),
    }
}

/// ID of the vault a `create_vault` transaction made
fn created_vault(
    operation: Option<&str>,
    outcome: &TxOutcome,
) -> Result<Option<String>, depeg_core::TxError> {
    match operation {
        Some("create_vault") => outcome.require_created("vault").map(|id| Some(id.to_string())),
        _ => Ok(None),
    }
}

/// POST /tx/confirm - Wait for effects, then invalidate stale reads
pub async fn confirm(
    State(state): State<AppState>,
    Json(request): Json<TxConfirmRequest>,
) -> ApiResult<TxConfirmResponse> {
    if request.digest.trim().is_empty() {
        return Err(bad_request("digest is required"));
    }
    let vault_id = request.vault_id.as_deref().map(object_id).transpose()?;
    let chain = chain(&state).await?;
    let keys = stale_keys(&state, vault_id.as_deref()).await;

    let outcome = confirm_digest(&chain, state.cache(), TxDigest::new(request.digest.trim()), &keys)
        .await
        .map_err(error_response)?;

    let created_vault =
        created_vault(request.operation.as_deref(), &outcome).map_err(error_response)?;

    let network = state.network().await;
    Ok(Json(TxConfirmResponse {
        explorer_url: outcome.explorer_url(network),
        digest: outcome.digest.to_string(),
        vault_id: created_vault,
        created: outcome.created,
    }))
}

/// POST /tx/watch - Track a digest in the background
pub async fn watch(
    State(state): State<AppState>,
    Json(request): Json<WatchTxRequest>,
) -> ApiResult<WatchTxResponse> {
    if request.digest.trim().is_empty() {
        return Err(bad_request("digest is required"));
    }
    let vault_id = request.vault_id.as_deref().map(object_id).transpose()?;
    let keys = stale_keys(&state, vault_id.as_deref()).await;
    let id = watcher::watch_tx(
        &state,
        request.digest.trim().to_string(),
        request.operation,
        request.description,
        keys,
    )
    .await;
    Ok(Json(WatchTxResponse { id }))
}

/// GET /tx/watched - Transactions still awaiting effects
pub async fn watched(State(state): State<AppState>) -> ApiResult<Vec<WatchedItemInfo>> {
    Ok(Json(state.watcher().watched_items().await))
}

/// GET /tx/notifications - Resolved transactions, oldest first
pub async fn notifications(State(state): State<AppState>) -> ApiResult<Vec<TxNotification>> {
    Ok(Json(state.watcher().notifications().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(created: &[&str]) -> TxOutcome {
        TxOutcome {
            digest: TxDigest::new("Dg"),
            created: created.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_created_vault() {
        assert_eq!(
            created_vault(Some("create_vault"), &outcome(&["0xnew"])).unwrap(),
            Some("0xnew".to_string())
        );
        assert!(created_vault(Some("create_vault"), &outcome(&[])).is_err());
        assert_eq!(created_vault(Some("hedger_redeem"), &outcome(&[])).unwrap(), None);
        assert_eq!(created_vault(None, &outcome(&["0xcap"])).unwrap(), None);
    }
}
