//! Depeg Swap Transaction Builder
//!
//! Builds unsigned programmable transaction requests. Every builder runs its
//! pre-checks first and constructs nothing when one fails.
//!
//! # Create vault
//!
//! [merge/split pegged, merge/split underlying]
//! registry::create_vault_collection<P, U>(registry, treasury, pegged, underlying, expiry_ms, clock)
//!
//! # Hedger redeem
//!
//! [merge/split DS, merge/split pegged (DS / 100)]
//! vault::redeem_depeg_swap<P, U>(vault, treasury, ds, pegged, clock) -> underlying
//! transfer [underlying, pegged, ds] -> sender
//!
//! # Underwriter redeem
//!
//! vault::redeem_underlying<P, U>(vault, cap, clock) -> (underlying, pegged)
//! transfer [underlying, pegged] -> sender

use depeg_core::constants::CLOCK_OBJECT_ID;
use depeg_core::{Error, ProtocolError, TimestampMs, TxError};
use sui_tx::{
    select_coins, validate_address, Argument, CoinRef, CoinSelectorError, SelectedCoins,
    TransactionBuilder, TransactionRequest,
};

use crate::calculator;
use crate::constants::{self, functions, modules};
use crate::state::{
    CoinHolding, CreateVaultPreview, CreateVaultRequest, Deployment, HedgerRedeemPreview,
    VaultSnapshot, WalletHoldings,
};
use crate::validate;

fn check_sender(sender: &str) -> Result<(), TxError> {
    validate_address(sender).map_err(|_| TxError::InvalidAddress {
        address: sender.to_string(),
    })
}

/// Check the summed balance, then pick the coin objects to spend
fn select_funding(
    label: &str,
    coins: &[&CoinHolding],
    required: u64,
    decimals: u32,
) -> Result<SelectedCoins, ProtocolError> {
    let available = coins
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(c.balance));
    validate::check_balance(label, required, available, decimals)?;

    let refs: Vec<CoinRef> = coins
        .iter()
        .map(|c| CoinRef::new(c.id.clone(), c.balance))
        .collect();
    select_coins(&refs, label, required).map_err(|e| match e {
        CoinSelectorError::Insufficient {
            required,
            available,
            ..
        } => ProtocolError::InsufficientBalance {
            token: label.to_string(),
            required: depeg_core::format_balance(&required.into(), decimals),
            available: depeg_core::format_balance(&available.into(), decimals),
        },
    })
}

/// Preview a vault creation without building it
pub fn preview_create_vault(req: &CreateVaultRequest) -> Result<CreateVaultPreview, ProtocolError> {
    validate::check_equal_deposit(req.pegged_amount, req.underlying_amount)?;
    let ds_minted = calculator::ds_minted(req.pegged_amount).ok_or_else(|| {
        ProtocolError::InvalidAmount {
            message: "deposit is too large".to_string(),
        }
    })?;
    Ok(CreateVaultPreview {
        pegged_amount: req.pegged_amount,
        underlying_amount: req.underlying_amount,
        ds_minted,
        expiry_ms: req.expiry_ms,
    })
}

/// Preview a hedger redemption without building it
pub fn preview_hedger_redeem(ds_amount: u64) -> Result<HedgerRedeemPreview, ProtocolError> {
    let pegged_required = validate::check_ratio(ds_amount)?;
    Ok(HedgerRedeemPreview {
        ds_amount,
        pegged_required,
    })
}

/// Deposit equal pegged and underlying amounts into a new vault
pub fn build_create_vault_tx(
    deployment: &Deployment,
    sender: &str,
    holdings: &WalletHoldings,
    req: &CreateVaultRequest,
    now_ms: TimestampMs,
) -> Result<TransactionRequest, Error> {
    check_sender(sender)?;
    preview_create_vault(req)?;
    if req.expiry_ms <= now_ms {
        return Err(ProtocolError::InvalidAmount {
            message: "expiry must be in the future".to_string(),
        }
        .into());
    }

    let pegged_coins = holdings.coins_of_type(&req.pegged_coin_type);
    let pegged = select_funding(
        "pegged coin",
        &pegged_coins,
        req.pegged_amount,
        holdings.decimals_of(&req.pegged_coin_type),
    )?;
    let underlying_coins = holdings.coins_of_type(&req.underlying_coin_type);
    let underlying = select_funding(
        "underlying coin",
        &underlying_coins,
        req.underlying_amount,
        holdings.decimals_of(&req.underlying_coin_type),
    )?;

    let mut tx = TransactionBuilder::new(sender);
    let pegged_arg = tx.coin_with_amount(&pegged, req.pegged_amount);
    let underlying_arg = tx.coin_with_amount(&underlying, req.underlying_amount);
    let registry = tx.object(&deployment.registry_id);
    let treasury = tx.object(&deployment.treasury_id);
    let expiry = tx.pure_u64(req.expiry_ms);
    let clock = tx.object(CLOCK_OBJECT_ID);

    tx.move_call(
        &constants::target(
            &deployment.package_id,
            modules::REGISTRY,
            functions::CREATE_VAULT_COLLECTION,
        ),
        vec![req.pegged_coin_type.clone(), req.underlying_coin_type.clone()],
        vec![registry, treasury, pegged_arg, underlying_arg, expiry, clock],
    )?;

    tracing::info!(
        sender,
        amount = req.pegged_amount,
        expiry_ms = req.expiry_ms,
        merged_pegged = pegged.merge.len(),
        merged_underlying = underlying.merge.len(),
        "Built create-vault transaction"
    );
    Ok(tx.build()?)
}

/// Hedger: return DS tokens plus pegged collateral for underlying coins.
/// Allowed only before expiry.
pub fn build_hedger_redeem_tx(
    deployment: &Deployment,
    sender: &str,
    holdings: &WalletHoldings,
    vault: &VaultSnapshot,
    ds_amount: u64,
    now_ms: TimestampMs,
) -> Result<TransactionRequest, Error> {
    check_sender(sender)?;
    let pegged_required = validate::check_ratio(ds_amount)?;
    validate::check_hedger_expiry(vault, now_ms)?;

    let ds_coins: Vec<&CoinHolding> = holdings.ds.iter().collect();
    let ds = select_funding("DS token", &ds_coins, ds_amount, holdings.ds_decimals())?;
    let pegged_coins = holdings.coins_of_type(&vault.pegged_coin_type);
    let pegged = select_funding(
        "pegged token",
        &pegged_coins,
        pegged_required,
        holdings.decimals_of(&vault.pegged_coin_type),
    )?;

    let mut tx = TransactionBuilder::new(sender);
    let ds_arg = tx.coin_with_amount(&ds, ds_amount);
    let pegged_arg = tx.coin_with_amount(&pegged, pegged_required);
    let vault_arg = tx.object(&vault.id);
    let treasury = tx.object(&deployment.treasury_id);
    let clock = tx.object(CLOCK_OBJECT_ID);

    let underlying = tx.move_call(
        &constants::target(&deployment.package_id, modules::VAULT, functions::REDEEM_DEPEG_SWAP),
        vec![vault.pegged_coin_type.clone(), vault.underlying_coin_type.clone()],
        vec![vault_arg, treasury, ds_arg, pegged_arg, clock],
    )?;
    tx.transfer_objects(vec![underlying, pegged_arg, ds_arg], sender);

    tracing::info!(
        sender,
        vault_id = %vault.id,
        ds_amount,
        pegged_required,
        "Built hedger redeem transaction"
    );
    Ok(tx.build()?)
}

/// Underwriter: withdraw both compartments with the capability.
/// Allowed only at or after expiry.
pub fn build_underwriter_redeem_tx(
    deployment: &Deployment,
    sender: &str,
    holdings: &WalletHoldings,
    vault: &VaultSnapshot,
    now_ms: TimestampMs,
) -> Result<TransactionRequest, Error> {
    check_sender(sender)?;
    let cap = validate::require_capability(&holdings.caps)?;
    validate::check_underwriter_expiry(vault, now_ms)?;

    let mut tx = TransactionBuilder::new(sender);
    let vault_arg = tx.object(&vault.id);
    let cap_arg = tx.object(&cap.id);
    let clock = tx.object(CLOCK_OBJECT_ID);

    let result = tx.move_call(
        &constants::target(&deployment.package_id, modules::VAULT, functions::REDEEM_UNDERLYING),
        vec![vault.pegged_coin_type.clone(), vault.underlying_coin_type.clone()],
        vec![vault_arg, cap_arg, clock],
    )?;
    let returned: Vec<Argument> = (0..2).filter_map(|i| result.nested(i)).collect();
    tx.transfer_objects(returned, sender);

    tracing::info!(sender, vault_id = %vault.id, cap_id = %cap.id, "Built underwriter redeem transaction");
    Ok(tx.build()?)
}

/// Send DS tokens to another account
pub fn build_transfer_ds_tx(
    sender: &str,
    holdings: &WalletHoldings,
    recipient: &str,
    ds_amount: u64,
) -> Result<TransactionRequest, Error> {
    validate::validate_recipient(recipient)?;
    check_sender(sender)?;
    if ds_amount == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: "DS amount must be greater than zero".to_string(),
        }
        .into());
    }

    let ds_coins: Vec<&CoinHolding> = holdings.ds.iter().collect();
    let ds = select_funding("DS token", &ds_coins, ds_amount, holdings.ds_decimals())?;

    let mut tx = TransactionBuilder::new(sender);
    let ds_arg = tx.coin_with_amount(&ds, ds_amount);
    tx.transfer_objects(vec![ds_arg], recipient.trim());

    tracing::info!(sender, recipient, ds_amount, "Built DS transfer transaction");
    Ok(tx.build()?)
}
