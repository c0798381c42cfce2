//! Vault listing, creation and redemption endpoints
//!
//! Build endpoints return an unsigned transaction request. Every local check
//! runs before the request is assembled.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use depeg_core::{format_display_balance, DisplayPolicy};
use depeg_vault::constants::DEFAULT_DECIMALS;
use depeg_vault::fetch::resolve_decimals;
use depeg_vault::{
    build_create_vault_tx, build_hedger_redeem_tx, build_underwriter_redeem_tx, discover_vaults,
    ds_coin_type, expiry_from_now, fetch_vault, fetch_wallet_holdings, now_ms,
    preview_create_vault, preview_hedger_redeem, validate, verify_deployment, CreateVaultRequest,
    VaultSnapshot, DS_PER_COLLATERAL,
};
use sui_rpc_client::{CachedChain, SuiClient};

use crate::dto::{
    AmountDto, BuildResponse, CreateVaultBody, CreateVaultPreviewResponse, RedeemBody,
    TxSummaryDto, VaultDecimals, VaultDto, VaultListResponse,
};
use crate::routes::{chain, connected_address, error_response, object_id, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vaults))
        .route("/create/preview", post(preview_create))
        .route("/create/build", post(build_create))
        .route("/:id", get(get_vault))
        .route("/:id/redeem/build", post(build_redeem))
        .route("/:id/underwrite/build", post(build_underwrite))
}

async fn vault_decimals(
    chain: &CachedChain<SuiClient>,
    package_id: &str,
    vault: &VaultSnapshot,
) -> VaultDecimals {
    let ds_type = ds_coin_type(package_id);
    let decimals = resolve_decimals(
        chain,
        [
            vault.pegged_coin_type.as_str(),
            vault.underlying_coin_type.as_str(),
            ds_type.as_str(),
        ],
    )
    .await;
    let of = |t: &str| decimals.get(t).copied().unwrap_or(DEFAULT_DECIMALS);
    VaultDecimals {
        pegged: of(&vault.pegged_coin_type),
        underlying: of(&vault.underlying_coin_type),
        ds: of(&ds_type),
    }
}

/// GET /vaults - All vaults in the registry, latest expiry first
pub async fn list_vaults(State(state): State<AppState>) -> ApiResult<VaultListResponse> {
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;
    let policy = state.config().await.display.policy;

    let listing = discover_vaults(&chain, &deployment)
        .await
        .map_err(error_response)?;

    let now = now_ms();
    let mut vaults = Vec::with_capacity(listing.vaults.len());
    for vault in &listing.vaults {
        let decimals = vault_decimals(&chain, &deployment.package_id, vault).await;
        vaults.push(VaultDto::from_snapshot(vault, decimals, policy, now));
    }
    Ok(Json(VaultListResponse {
        vaults,
        skipped: listing.skipped,
    }))
}

/// GET /vaults/:id
pub async fn get_vault(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<VaultDto> {
    let id = object_id(&id)?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;
    let policy = state.config().await.display.policy;

    let vault = fetch_vault(&chain, &id).await.map_err(error_response)?;
    let decimals = vault_decimals(&chain, &deployment.package_id, &vault).await;
    Ok(Json(VaultDto::from_snapshot(&vault, decimals, policy, now_ms())))
}

fn preview_response(
    req: &CreateVaultRequest,
    pegged_decimals: u32,
    underlying_decimals: u32,
    policy: DisplayPolicy,
) -> Result<CreateVaultPreviewResponse, depeg_core::ProtocolError> {
    let preview = preview_create_vault(req)?;
    Ok(CreateVaultPreviewResponse {
        pegged_amount: AmountDto::new(preview.pegged_amount, pegged_decimals, policy),
        underlying_amount: AmountDto::new(preview.underlying_amount, underlying_decimals, policy),
        // DS share the pegged coin's precision
        ds_minted: AmountDto::new(preview.ds_minted, pegged_decimals, policy),
        expiry_ms: preview.expiry_ms,
        ds_per_collateral: DS_PER_COLLATERAL,
    })
}

/// POST /vaults/create/preview - DS minted and expiry for a deposit
pub async fn preview_create(
    State(state): State<AppState>,
    Json(body): Json<CreateVaultBody>,
) -> ApiResult<CreateVaultPreviewResponse> {
    let decimals = body.decimals.unwrap_or(DEFAULT_DECIMALS);
    let policy = state.config().await.display.policy;

    let req = CreateVaultRequest {
        pegged_amount: validate::parse_positive_amount(&body.pegged_amount, decimals)
            .map_err(error_response)?,
        underlying_amount: validate::parse_positive_amount(&body.underlying_amount, decimals)
            .map_err(error_response)?,
        expiry_ms: expiry_from_now(now_ms(), body.expiry_hours).map_err(error_response)?,
        pegged_coin_type: body.pegged_coin_type,
        underlying_coin_type: body.underlying_coin_type,
    };

    preview_response(&req, decimals, decimals, policy)
        .map(Json)
        .map_err(error_response)
}

/// POST /vaults/create/build - Deposit both coins into a new vault
pub async fn build_create(
    State(state): State<AppState>,
    Json(body): Json<CreateVaultBody>,
) -> ApiResult<BuildResponse> {
    let sender = connected_address(&state).await?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;

    verify_deployment(&chain, &deployment)
        .await
        .map_err(error_response)?;
    let holdings = fetch_wallet_holdings(&chain, &deployment, &sender)
        .await
        .map_err(error_response)?;

    let pegged_decimals = holdings.decimals_of(&body.pegged_coin_type);
    let underlying_decimals = holdings.decimals_of(&body.underlying_coin_type);
    let now = now_ms();
    let req = CreateVaultRequest {
        pegged_amount: validate::parse_positive_amount(&body.pegged_amount, pegged_decimals)
            .map_err(error_response)?,
        underlying_amount: validate::parse_positive_amount(&body.underlying_amount, underlying_decimals)
            .map_err(error_response)?,
        expiry_ms: expiry_from_now(now, body.expiry_hours).map_err(error_response)?,
        pegged_coin_type: body.pegged_coin_type,
        underlying_coin_type: body.underlying_coin_type,
    };

    let tx = build_create_vault_tx(&deployment, &sender, &holdings, &req, now)
        .map_err(error_response)?;

    tracing::info!(sender = %sender, pegged = req.pegged_amount, "Built create-vault transaction");
    Ok(Json(BuildResponse {
        transaction: tx,
        summary: TxSummaryDto {
            action: "create_vault".to_string(),
            description: format!(
                "Deposit {} pegged and {} underlying for {} hours",
                format_display_balance(&req.pegged_amount.into(), pegged_decimals),
                format_display_balance(&req.underlying_amount.into(), underlying_decimals),
                body.expiry_hours
            ),
            vault_id: None,
        },
    }))
}

/// POST /vaults/:id/redeem/build - Hedger hands back DS and pegged coins
pub async fn build_redeem(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RedeemBody>,
) -> ApiResult<BuildResponse> {
    let sender = connected_address(&state).await?;
    let id = object_id(&id)?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;

    let vault = fetch_vault(&chain, &id).await.map_err(error_response)?;
    let holdings = fetch_wallet_holdings(&chain, &deployment, &sender)
        .await
        .map_err(error_response)?;

    let ds_decimals = holdings.ds_decimals();
    let ds_amount = validate::parse_positive_amount(&body.amount, ds_decimals).map_err(error_response)?;
    let preview = preview_hedger_redeem(ds_amount).map_err(error_response)?;

    let tx = build_hedger_redeem_tx(&deployment, &sender, &holdings, &vault, ds_amount, now_ms())
        .map_err(error_response)?;

    tracing::info!(sender = %sender, vault_id = %id, ds_amount, "Built hedger redemption");
    Ok(Json(BuildResponse {
        transaction: tx,
        summary: TxSummaryDto {
            action: "hedger_redeem".to_string(),
            description: format!(
                "Redeem {} DS with {} pegged for underlying",
                format_display_balance(&ds_amount.into(), ds_decimals),
                format_display_balance(
                    &preview.pegged_required.into(),
                    holdings.decimals_of(&vault.pegged_coin_type)
                ),
            ),
            vault_id: Some(id),
        },
    }))
}

/// POST /vaults/:id/underwrite/build - Underwriter withdraws after expiry
pub async fn build_underwrite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BuildResponse> {
    let sender = connected_address(&state).await?;
    let id = object_id(&id)?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;

    let vault = fetch_vault(&chain, &id).await.map_err(error_response)?;
    let holdings = fetch_wallet_holdings(&chain, &deployment, &sender)
        .await
        .map_err(error_response)?;

    let tx = build_underwriter_redeem_tx(&deployment, &sender, &holdings, &vault, now_ms())
        .map_err(error_response)?;

    tracing::info!(sender = %sender, vault_id = %id, "Built underwriter redemption");
    Ok(Json(BuildResponse {
        transaction: tx,
        summary: TxSummaryDto {
            action: "underwriter_redeem".to_string(),
            description: "Withdraw remaining vault collateral".to_string(),
            vault_id: Some(id),
        },
    }))
}
