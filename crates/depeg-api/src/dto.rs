//! Data Transfer Objects for API requests and responses

use serde::{Deserialize, Serialize};

use depeg_core::{format_balance, DisplayPolicy, Network, TimestampMs};
use depeg_vault::{CoinHolding, SkippedVault, UnderwriterCap, VaultPhase, VaultSnapshot};
use sui_tx::TransactionRequest;

/// Liveness report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
    pub wallet_connected: bool,
    /// Transactions the watcher is still polling for
    pub watching: usize,
}

impl HealthResponse {
    pub fn new(network: Network, wallet_connected: bool, watching: usize) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            network: network.to_string(),
            wallet_connected,
            watching,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// A raw on-chain amount with its decimal renderings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountDto {
    /// Integer base units as a string
    pub raw: String,
    /// Every fraction digit
    pub exact: String,
    /// Rendered under the configured display policy
    pub display: String,
}

impl AmountDto {
    pub fn new(raw: u64, decimals: u32, policy: DisplayPolicy) -> Self {
        let big = raw.into();
        Self {
            raw: raw.to_string(),
            exact: format_balance(&big, decimals),
            display: policy.format(&big, decimals),
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// Node status response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusResponse {
    pub connected: bool,
    pub url: String,
    pub network: String,
    pub chain_identifier: Option<String>,
    pub latest_checkpoint: Option<u64>,
}

/// Node configuration request. Omitted fields keep their current value; an
/// empty `url` returns to the network's public fullnode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigRequest {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

// ─── Wallet ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConnectRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub address: Option<String>,
    /// Seconds since the wallet connected
    pub connected_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalanceDto {
    pub id: String,
    pub coin_type: String,
    pub symbol: String,
    pub decimals: u32,
    pub amount: AmountDto,
}

impl CoinBalanceDto {
    pub fn from_holding(coin: &CoinHolding, policy: DisplayPolicy) -> Self {
        Self {
            id: coin.id.clone(),
            coin_type: coin.coin_type.clone(),
            symbol: coin.symbol.clone(),
            decimals: coin.decimals,
            amount: AmountDto::new(coin.balance, coin.decimals, policy),
        }
    }
}

/// Wallet holdings relevant to the vault program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsResponse {
    pub owner: String,
    pub pegged: Vec<CoinBalanceDto>,
    pub underlying: Vec<CoinBalanceDto>,
    pub ds: Vec<CoinBalanceDto>,
    /// Sum of all DS coin objects
    pub ds_total: AmountDto,
    pub caps: Vec<UnderwriterCap>,
}

// ─── Vaults ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDto {
    pub id: String,
    pub pegged_coin_type: String,
    pub underlying_coin_type: String,
    pub pegged_balance: AmountDto,
    pub underlying_balance: AmountDto,
    pub total_ds_supply: AmountDto,
    pub expiry_ms: TimestampMs,
    pub phase: VaultPhase,
    /// Milliseconds until expiry, `None` once expired
    pub time_remaining_ms: Option<u64>,
}

/// Registry listing; entries that could not be read are named in `skipped`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultListResponse {
    pub vaults: Vec<VaultDto>,
    pub skipped: Vec<SkippedVault>,
}

/// Decimals of the three coin types a vault involves
#[derive(Debug, Clone, Copy)]
pub struct VaultDecimals {
    pub pegged: u32,
    pub underlying: u32,
    pub ds: u32,
}

impl VaultDto {
    pub fn from_snapshot(
        vault: &VaultSnapshot,
        decimals: VaultDecimals,
        policy: DisplayPolicy,
        now_ms: TimestampMs,
    ) -> Self {
        Self {
            id: vault.id.clone(),
            pegged_coin_type: vault.pegged_coin_type.clone(),
            underlying_coin_type: vault.underlying_coin_type.clone(),
            pegged_balance: AmountDto::new(vault.pegged_balance, decimals.pegged, policy),
            underlying_balance: AmountDto::new(vault.underlying_balance, decimals.underlying, policy),
            total_ds_supply: AmountDto::new(vault.total_ds_supply, decimals.ds, policy),
            expiry_ms: vault.expiry_ms,
            phase: vault.phase(now_ms),
            time_remaining_ms: depeg_vault::time_remaining(vault.expiry_ms, now_ms),
        }
    }
}

/// Vault creation input, amounts as user-entered decimals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultBody {
    pub pegged_coin_type: String,
    pub underlying_coin_type: String,
    pub pegged_amount: String,
    pub underlying_amount: String,
    /// Hours from now until the vault expires
    pub expiry_hours: u64,
    /// Decimals used for both amounts when previewing without a wallet
    #[serde(default)]
    pub decimals: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultPreviewResponse {
    pub pegged_amount: AmountDto,
    pub underlying_amount: AmountDto,
    pub ds_minted: AmountDto,
    pub expiry_ms: TimestampMs,
    pub ds_per_collateral: u64,
}

/// Hedger redemption input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemBody {
    /// DS tokens to hand back, as a decimal
    pub amount: String,
}

/// DS transfer input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBody {
    pub recipient: String,
    /// DS tokens to send, as a decimal
    pub amount: String,
}

/// Transaction summary for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummaryDto {
    pub action: String,
    pub description: String,
    pub vault_id: Option<String>,
}

/// Unsigned transaction request for the wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub transaction: TransactionRequest,
    pub summary: TxSummaryDto,
}

// ─── Amount codec ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountParseRequest {
    pub amount: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountParseResponse {
    /// Integer base units as a string
    pub raw: String,
    /// The raw value rendered back with every fraction digit
    pub exact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountFormatRequest {
    pub raw: String,
    pub decimals: u32,
    /// Falls back to the configured policy
    #[serde(default)]
    pub policy: Option<DisplayPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountFormatResponse {
    pub exact: String,
    pub display: String,
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// A digest returned by the wallet, plus the vault it touched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxConfirmRequest {
    pub digest: String,
    #[serde(default)]
    pub vault_id: Option<String>,
    /// `create_vault` also reports the new vault's ID
    #[serde(default)]
    pub operation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxConfirmResponse {
    pub digest: String,
    pub created: Vec<String>,
    /// Vault created by a `create_vault` transaction
    pub vault_id: Option<String>,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTxRequest {
    pub digest: String,
    pub operation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vault_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchTxResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_dto_renderings() {
        let amount = AmountDto::new(1_234_500_000, 9, DisplayPolicy::Exact);
        assert_eq!(amount.raw, "1234500000");
        assert_eq!(amount.exact, "1.234500000");
        assert_eq!(amount.display, "1.234500000");

        let truncated = AmountDto::new(1_234_500_000, 9, DisplayPolicy::Truncated(2));
        assert_eq!(truncated.exact, "1.234500000");
        assert_eq!(truncated.display, "1.23");
    }

    #[test]
    fn test_vault_dto_phase() {
        let vault = VaultSnapshot {
            id: "0xv".into(),
            pegged_coin_type: "P".into(),
            underlying_coin_type: "U".into(),
            pegged_balance: 5,
            underlying_balance: 5,
            total_ds_supply: 500,
            expiry_ms: 2_000,
        };
        let decimals = VaultDecimals {
            pegged: 0,
            underlying: 0,
            ds: 0,
        };
        let active = VaultDto::from_snapshot(&vault, decimals, DisplayPolicy::Exact, 1_000);
        assert_eq!(active.phase, VaultPhase::Active);
        assert_eq!(active.time_remaining_ms, Some(1_000));
        assert_eq!(active.total_ds_supply.exact, "500");

        let expired = VaultDto::from_snapshot(&vault, decimals, DisplayPolicy::Exact, 3_000);
        assert_eq!(expired.phase, VaultPhase::Expired);
        assert_eq!(expired.time_remaining_ms, None);
    }

    #[test]
    fn test_vault_list_names_skipped_entries() {
        let listing = VaultListResponse {
            vaults: Vec::new(),
            skipped: vec![SkippedVault {
                id: "0xgone".into(),
                reason: "Object not found: 0xgone".into(),
            }],
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["vaults"], serde_json::json!([]));
        assert_eq!(json["skipped"][0]["id"], "0xgone");
    }

    #[test]
    fn test_node_config_request_defaults() {
        let req: NodeConfigRequest = serde_json::from_str("{}").unwrap();
        assert!(req.network.is_none() && req.url.is_none());
    }
}
