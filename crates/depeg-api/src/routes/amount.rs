//! Amount codec endpoints

use axum::{extract::State, routing::post, Json, Router};

use depeg_core::{check_decimals, format_balance, parse_input_amount, parse_raw_amount};

use crate::dto::{AmountFormatRequest, AmountFormatResponse, AmountParseRequest, AmountParseResponse};
use crate::routes::{error_response, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/parse", post(parse_amount))
        .route("/format", post(format_amount))
}

/// POST /amount/parse - Decimal text to raw base units
pub async fn parse_amount(Json(request): Json<AmountParseRequest>) -> ApiResult<AmountParseResponse> {
    let raw = parse_input_amount(&request.amount, request.decimals).map_err(error_response)?;
    Ok(Json(AmountParseResponse {
        exact: format_balance(&raw, request.decimals),
        raw: raw.to_string(),
    }))
}

/// POST /amount/format - Raw base units to display text
pub async fn format_amount(
    State(state): State<AppState>,
    Json(request): Json<AmountFormatRequest>,
) -> ApiResult<AmountFormatResponse> {
    let decimals = check_decimals(request.decimals).map_err(error_response)?;
    let raw = parse_raw_amount(&request.raw).map_err(error_response)?;
    let policy = match request.policy {
        Some(policy) => policy,
        None => state.config().await.display.policy,
    };
    Ok(Json(AmountFormatResponse {
        exact: format_balance(&raw, decimals),
        display: policy.format(&raw, decimals),
    }))
}
