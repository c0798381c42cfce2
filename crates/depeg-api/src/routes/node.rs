//! Fullnode status and configuration endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::dto::{NodeConfigRequest, NodeStatusResponse};
use crate::routes::{bad_request, error_response, ApiResult};
use crate::AppState;

/// Create node routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/configure", post(configure))
}

/// GET /node/status - Probe the configured fullnode
pub async fn get_status(State(state): State<AppState>) -> ApiResult<NodeStatusResponse> {
    let config = state.config().await;
    let client = state.client().await.map_err(error_response)?;
    let status = client.refresh_status().await;

    Ok(Json(NodeStatusResponse {
        connected: status.is_online,
        url: status.url,
        network: config.network.as_str().to_string(),
        chain_identifier: status.chain_identifier,
        latest_checkpoint: status.latest_checkpoint,
    }))
}

/// POST /node/configure - Switch network or fullnode URL
pub async fn configure(
    State(state): State<AppState>,
    Json(request): Json<NodeConfigRequest>,
) -> ApiResult<NodeStatusResponse> {
    state
        .set_rpc_config(request.network.as_deref(), request.url)
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    get_status(State(state)).await
}
