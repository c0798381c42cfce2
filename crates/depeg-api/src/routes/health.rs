//! Liveness endpoint

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Process is up; reports the network and watcher load.
/// Never touches the fullnode.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let network = state.network().await;
    let watching = state.watcher().watched_items().await.len();
    Json(HealthResponse::new(network, state.wallet_address().await.is_some(), watching))
}
