//! Depeg Swap Vault Protocol
//!
//! Vaults hold equal deposits of a pegged coin and its underlying coin. The
//! depositor (underwriter) receives DS tokens at 100 per unit of collateral
//! and an `UnderwriterCap`. Before expiry a hedger can hand back DS tokens
//! plus pegged coins for underlying coins; after expiry the underwriter
//! withdraws what is left.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod session;
pub mod state;
pub mod tx_builder;
pub mod validate;

#[cfg(test)]
mod testing;

// Re-exports
pub use calculator::{ds_minted, expiry_from_now, now_ms, required_collateral, time_remaining};
pub use constants::{ds_coin_type, underwriter_cap_type, DS_PER_COLLATERAL};
pub use fetch::{
    classify_coins, discover_vaults, extract_coin_type, fetch_vault, fetch_wallet_holdings,
    parse_registry, parse_vault, verify_deployment,
};
pub use session::{
    confirm_digest, invalidations_for, submit_and_confirm, TxOutcome, WalletSession,
};
pub use state::{
    CoinHolding, CreateVaultPreview, CreateVaultRequest, Deployment, HedgerRedeemPreview,
    SkippedVault, UnderwriterCap, VaultListing, VaultPhase, VaultSnapshot, WalletHoldings,
};
pub use tx_builder::{
    build_create_vault_tx, build_hedger_redeem_tx, build_transfer_ds_tx,
    build_underwriter_redeem_tx, preview_create_vault, preview_hedger_redeem,
};
