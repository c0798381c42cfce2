//! Depeg Swap State Types
//!
//! View models for vaults, wallet holdings and transaction previews.

use serde::{Deserialize, Serialize};

use depeg_core::{DeploymentConfig, ProtocolError, TimestampMs};

use crate::constants::DEFAULT_DECIMALS;

/// A single owned coin object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinHolding {
    pub id: String,
    /// Raw integer balance
    pub balance: u64,
    pub coin_type: String,
    pub decimals: u32,
    pub symbol: String,
}

impl CoinHolding {
    /// Last path segment of the coin type, e.g. `PEGGED_COIN`
    pub fn symbol_from_type(coin_type: &str) -> String {
        coin_type
            .rsplit("::")
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("UNKNOWN")
            .to_string()
    }
}

/// Parsed state of a vault object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub id: String,
    pub pegged_coin_type: String,
    pub underlying_coin_type: String,
    pub pegged_balance: u64,
    pub underlying_balance: u64,
    pub total_ds_supply: u64,
    pub expiry_ms: TimestampMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultPhase {
    /// Before expiry: hedgers may redeem
    Active,
    /// At or after expiry: underwriters may redeem
    Expired,
}

impl VaultSnapshot {
    pub fn phase(&self, now_ms: TimestampMs) -> VaultPhase {
        if self.expiry_ms > now_ms {
            VaultPhase::Active
        } else {
            VaultPhase::Expired
        }
    }

    pub fn is_active(&self, now_ms: TimestampMs) -> bool {
        self.phase(now_ms) == VaultPhase::Active
    }
}

/// A registry entry left out of a listing, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedVault {
    pub id: String,
    pub reason: String,
}

/// Vaults listed by the registry, latest expiry first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultListing {
    pub vaults: Vec<VaultSnapshot>,
    pub skipped: Vec<SkippedVault>,
}

/// Owned underwriter capability object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderwriterCap {
    pub id: String,
    pub owner: String,
}

/// Everything the connected wallet holds that the vault program cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHoldings {
    pub owner: String,
    pub pegged: Vec<CoinHolding>,
    pub underlying: Vec<CoinHolding>,
    pub ds: Vec<CoinHolding>,
    pub caps: Vec<UnderwriterCap>,
}

impl WalletHoldings {
    /// All coin objects of one exact type, from any category
    pub fn coins_of_type(&self, coin_type: &str) -> Vec<&CoinHolding> {
        self.pegged
            .iter()
            .chain(&self.underlying)
            .chain(&self.ds)
            .filter(|c| c.coin_type == coin_type)
            .collect()
    }

    pub fn ds_balance(&self) -> u64 {
        self.ds
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.balance))
    }

    /// Decimals of a coin type as reported with the holdings
    pub fn decimals_of(&self, coin_type: &str) -> u32 {
        self.coins_of_type(coin_type)
            .first()
            .map(|c| c.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    pub fn ds_decimals(&self) -> u32 {
        self.ds.first().map(|c| c.decimals).unwrap_or(DEFAULT_DECIMALS)
    }
}

/// Validated vault program deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub package_id: String,
    pub registry_id: String,
    pub treasury_id: String,
}

impl Deployment {
    pub fn from_config(config: &DeploymentConfig) -> Result<Self, ProtocolError> {
        let require = |value: &str, what: &str| {
            if value.trim().is_empty() {
                Err(ProtocolError::MissingConfiguration {
                    what: what.to_string(),
                })
            } else {
                Ok(value.trim().to_string())
            }
        };

        Ok(Self {
            package_id: require(&config.package_id, "package_id")?,
            registry_id: require(&config.registry_id, "registry_id")?,
            treasury_id: require(&config.treasury_id, "treasury_id")?,
        })
    }
}

/// Vault creation parameters, amounts already in raw units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultRequest {
    pub pegged_coin_type: String,
    pub underlying_coin_type: String,
    pub pegged_amount: u64,
    pub underlying_amount: u64,
    pub expiry_ms: TimestampMs,
}

/// Preview of a vault creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultPreview {
    pub pegged_amount: u64,
    pub underlying_amount: u64,
    /// DS tokens the depositor receives
    pub ds_minted: u64,
    pub expiry_ms: TimestampMs,
}

/// Preview of a hedger redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HedgerRedeemPreview {
    pub ds_amount: u64,
    /// Pegged tokens paired with the DS tokens
    pub pegged_required: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, coin_type: &str, balance: u64) -> CoinHolding {
        CoinHolding {
            id: id.into(),
            balance,
            coin_type: coin_type.into(),
            decimals: 6,
            symbol: CoinHolding::symbol_from_type(coin_type),
        }
    }

    #[test]
    fn test_vault_phase_boundary() {
        let vault = VaultSnapshot {
            id: "0xv".into(),
            pegged_coin_type: "P".into(),
            underlying_coin_type: "U".into(),
            pegged_balance: 0,
            underlying_balance: 0,
            total_ds_supply: 0,
            expiry_ms: 1_000,
        };
        assert_eq!(vault.phase(999), VaultPhase::Active);
        assert_eq!(vault.phase(1_000), VaultPhase::Expired);
        assert!(!vault.is_active(5_000));
    }

    #[test]
    fn test_holdings_balances() {
        let holdings = WalletHoldings {
            owner: "0xa".into(),
            pegged: vec![coin("0x1", "0xp::pegged_coin::PEGGED_COIN", 40), coin("0x2", "0xp::pegged_coin::PEGGED_COIN", 60)],
            underlying: vec![coin("0x3", "0xp::underlying_coin::UNDERLYING_COIN", 7)],
            ds: vec![],
            caps: vec![],
        };
        assert_eq!(holdings.coins_of_type("0xp::pegged_coin::PEGGED_COIN").len(), 2);
        assert!(holdings.coins_of_type("0xp::other::X").is_empty());
        assert_eq!(holdings.decimals_of("0xp::underlying_coin::UNDERLYING_COIN"), 6);
        assert_eq!(holdings.ds_decimals(), DEFAULT_DECIMALS);
        assert_eq!(holdings.ds_balance(), 0);
    }

    #[test]
    fn test_symbol_from_type() {
        assert_eq!(CoinHolding::symbol_from_type("0x2::sui::SUI"), "SUI");
        assert_eq!(CoinHolding::symbol_from_type(""), "UNKNOWN");
    }

    #[test]
    fn test_deployment_requires_ids() {
        let config = DeploymentConfig {
            package_id: "0xpkg".into(),
            registry_id: "  ".into(),
            treasury_id: "0xt".into(),
        };
        let err = Deployment::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingConfiguration { ref what } if what == "registry_id"
        ));
    }
}
