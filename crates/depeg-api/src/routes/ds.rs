//! DS token transfer endpoint

use axum::{extract::State, routing::post, Json, Router};

use depeg_core::format_display_balance;
use depeg_vault::{build_transfer_ds_tx, fetch_wallet_holdings, validate};

use crate::dto::{BuildResponse, TransferBody, TxSummaryDto};
use crate::routes::{chain, connected_address, error_response, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/transfer/build", post(build_transfer))
}

/// POST /ds/transfer/build - Send DS tokens to another account
pub async fn build_transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> ApiResult<BuildResponse> {
    // Recipient is checked before anything else, whatever the amount
    validate::validate_recipient(&body.recipient).map_err(error_response)?;

    let sender = connected_address(&state).await?;
    let deployment = state.deployment().await.map_err(error_response)?;
    let chain = chain(&state).await?;

    let holdings = fetch_wallet_holdings(&chain, &deployment, &sender)
        .await
        .map_err(error_response)?;
    let decimals = holdings.ds_decimals();
    let amount = validate::parse_positive_amount(&body.amount, decimals).map_err(error_response)?;

    let recipient = body.recipient.trim().to_string();
    let tx = build_transfer_ds_tx(&sender, &holdings, &recipient, amount).map_err(error_response)?;

    tracing::info!(sender = %sender, recipient = %recipient, amount, "Built DS transfer");
    Ok(Json(BuildResponse {
        transaction: tx,
        summary: TxSummaryDto {
            action: "transfer_ds".to_string(),
            description: format!(
                "Send {} DS to {}",
                format_display_balance(&amount.into(), decimals),
                recipient
            ),
            vault_id: None,
        },
    }))
}
