//! Wallet connection endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use depeg_vault::fetch_wallet_holdings;

use crate::dto::{
    AmountDto, ApiError, CoinBalanceDto, HoldingsResponse, WalletConnectRequest,
    WalletStatusResponse,
};
use crate::routes::{chain, connected_address, error_response, ApiResult};
use crate::{AppState, StateError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/status", get(status))
        .route("/holdings", get(holdings))
}

/// POST /wallet/connect - Remember the wallet's account address
pub async fn connect(
    State(state): State<AppState>,
    Json(request): Json<WalletConnectRequest>,
) -> ApiResult<WalletStatusResponse> {
    state.set_wallet(&request.address).await.map_err(|e| match e {
        StateError::InvalidAddress { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("invalid_address", e.to_string())),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal(other.to_string())),
        ),
    })?;
    status(State(state)).await
}

/// POST /wallet/disconnect
pub async fn disconnect(State(state): State<AppState>) -> ApiResult<WalletStatusResponse> {
    state.disconnect_wallet().await;
    status(State(state)).await
}

/// GET /wallet/status
pub async fn status(State(state): State<AppState>) -> ApiResult<WalletStatusResponse> {
    let wallet = state.wallet().await;
    Ok(Json(WalletStatusResponse {
        connected: wallet.is_some(),
        connected_secs: wallet.as_ref().map(|w| w.connected_at.elapsed().as_secs()),
        address: wallet.map(|w| w.address),
    }))
}

/// GET /wallet/holdings - Pegged, underlying and DS coins plus capabilities
pub async fn holdings(State(state): State<AppState>) -> ApiResult<HoldingsResponse> {
    let owner = connected_address(&state).await?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;
    let policy = state.config().await.display.policy;

    let holdings = fetch_wallet_holdings(&chain, &deployment, &owner)
        .await
        .map_err(error_response)?;

    let dtos = |coins: &[depeg_vault::CoinHolding]| -> Vec<CoinBalanceDto> {
        coins
            .iter()
            .map(|c| CoinBalanceDto::from_holding(c, policy))
            .collect()
    };

    Ok(Json(HoldingsResponse {
        ds_total: AmountDto::new(holdings.ds_balance(), holdings.ds_decimals(), policy),
        pegged: dtos(&holdings.pegged),
        underlying: dtos(&holdings.underlying),
        ds: dtos(&holdings.ds),
        caps: holdings.caps,
        owner,
    }))
}
