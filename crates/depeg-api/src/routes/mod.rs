//! API route handlers

pub mod amount;
pub mod ds;
pub mod health;
pub mod node;
pub mod tx;
pub mod vaults;
pub mod wallet;

use axum::{http::StatusCode, routing::get, Json, Router};

use depeg_vault::validate;
use sui_rpc_client::{CachedChain, SuiClient};

use crate::dto::ApiError;
use crate::AppState;

/// Handler result carrying an error body on failure
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/node", node::router())
        .nest("/wallet", wallet::router())
        .nest("/vaults", vaults::router())
        .nest("/amount", amount::router())
        .nest("/ds", ds::router())
        .nest("/tx", tx::router())
        .with_state(state)
}

/// Map any domain error onto its HTTP status and `{ code, message }` body
pub fn error_response(error: impl Into<depeg_core::Error>) -> (StatusCode, Json<ApiError>) {
    let error = error.into();
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(code = error.error_code(), "Request failed: {}", error);
    }
    (status, Json(ApiError::new(error.error_code(), error.to_string())))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
}

/// Address of the connected wallet, or 401
async fn connected_address(state: &AppState) -> Result<String, (StatusCode, Json<ApiError>)> {
    let address = state.wallet_address().await;
    validate::require_connected(address.as_deref())
        .map(str::to_string)
        .map_err(error_response)
}

/// Full-length form of an object ID from a request, so it matches the IDs the
/// registry and cache hold
fn object_id(raw: &str) -> Result<String, (StatusCode, Json<ApiError>)> {
    sui_tx::normalize_object_id(raw.trim()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "invalid_object_id",
                format!("Invalid object ID '{}': {}", raw, e),
            )),
        )
    })
}

async fn chain(state: &AppState) -> Result<CachedChain<SuiClient>, (StatusCode, Json<ApiError>)> {
    state.chain().await.map_err(error_response)
}
