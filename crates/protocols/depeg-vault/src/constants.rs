//! Depeg Swap Constants
//!
//! Redemption ratio, Move entry points and type markers of the vault program.

/// Derivative (DS) tokens redeemed per one unit of pegged collateral
pub const DS_PER_COLLATERAL: u64 = 100;

/// Decimals assumed when a coin has no published metadata
pub const DEFAULT_DECIMALS: u32 = depeg_core::constants::DEFAULT_COIN_DECIMALS;

pub const MS_PER_HOUR: u64 = 3_600_000;

/// Shortest vault lifetime accepted at creation
pub const MIN_EXPIRY_HOURS: u64 = 1;

/// Move modules of the vault package
pub mod modules {
    pub const REGISTRY: &str = "registry";
    pub const VAULT: &str = "vault";
}

/// Entry points called by the client
pub mod functions {
    /// `registry::create_vault_collection<P, U>(registry, treasury, pegged, underlying, expiry_ms, clock)`
    pub const CREATE_VAULT_COLLECTION: &str = "create_vault_collection";
    /// `vault::redeem_depeg_swap<P, U>(vault, treasury, ds, pegged, clock) -> Coin<U>`
    pub const REDEEM_DEPEG_SWAP: &str = "redeem_depeg_swap";
    /// `vault::redeem_underlying<P, U>(vault, cap, clock) -> (Coin<U>, Coin<P>)`
    pub const REDEEM_UNDERLYING: &str = "redeem_underlying";
}

/// Substrings identifying object and coin types
pub mod type_markers {
    pub const PEGGED_COIN: &str = "::pegged_coin::";
    pub const UNDERLYING_COIN: &str = "::underlying_coin::";
    pub const VAULT_REGISTRY: &str = "::registry::VaultRegistry";
    pub const VAULT_TREASURY: &str = "::vault::VaultTreasury";
}

/// Coin type of the derivative (DS) token
pub fn ds_coin_type(package_id: &str) -> String {
    format!("{}::vault::VAULT", package_id)
}

/// Struct type of the underwriter capability
pub fn underwriter_cap_type(package_id: &str) -> String {
    format!("{}::vault::UnderwriterCap", package_id)
}

/// Fully-qualified move call target
pub fn target(package_id: &str, module: &str, function: &str) -> String {
    format!("{}::{}::{}", package_id, module, function)
}
