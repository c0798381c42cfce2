//! Vault Discovery and Fetching
//!
//! Parses registry, vault and capability objects and classifies the wallet's
//! coins. Reads go through [`ChainQuery`], so callers decide whether they are
//! cached.

use std::collections::HashMap;

use serde_json::Value;

use depeg_core::{Error, NodeError, ProtocolError};
use sui_rpc_client::{ChainQuery, CoinStruct, SuiObject};

use crate::constants::{self, type_markers, DEFAULT_DECIMALS};
use crate::state::{
    CoinHolding, Deployment, SkippedVault, UnderwriterCap, VaultListing, VaultSnapshot,
    WalletHoldings,
};
use crate::validate;

fn shape_error(object_id: &str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidObjectShape {
        object_id: object_id.to_string(),
        reason: reason.into(),
    }
}

/// Integer field encoded as a JSON string or number
fn read_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Inner type of a `...::Coin<T>` or `...::Balance<T>` wrapper
pub fn extract_coin_type(wrapper_type: &str) -> Option<String> {
    let start = wrapper_type
        .find("Coin<")
        .map(|i| i + "Coin<".len())
        .or_else(|| wrapper_type.find("Balance<").map(|i| i + "Balance<".len()))?;
    let end = wrapper_type.rfind('>')?;
    let inner = wrapper_type.get(start..end)?.trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Parse one coin compartment (`pegged_vault` / `underlying_vault`)
fn parse_compartment(object_id: &str, fields: &Value, name: &str) -> Result<(String, u64), ProtocolError> {
    let compartment = fields
        .get(name)
        .ok_or_else(|| shape_error(object_id, format!("missing field '{}'", name)))?;

    let wrapper = compartment["type"]
        .as_str()
        .ok_or_else(|| shape_error(object_id, format!("'{}' has no type", name)))?;
    let coin_type = extract_coin_type(wrapper).ok_or_else(|| {
        shape_error(
            object_id,
            format!("cannot extract coin type from '{}'", wrapper),
        )
    })?;

    // An empty compartment may omit its balance
    let inner = &compartment["fields"];
    let balance = match inner.get("balance").or_else(|| inner.get("value")) {
        Some(v) => read_u64(v)
            .ok_or_else(|| shape_error(object_id, format!("'{}' balance is not an integer", name)))?,
        None => 0,
    };

    Ok((coin_type, balance))
}

/// Parse a vault object into a [`VaultSnapshot`]
pub fn parse_vault(object: &SuiObject) -> Result<VaultSnapshot, ProtocolError> {
    let id = object.object_id.as_str();
    let fields = object
        .fields()
        .ok_or_else(|| shape_error(id, "object has no move content"))?;

    let (pegged_coin_type, pegged_balance) = parse_compartment(id, fields, "pegged_vault")?;
    let (underlying_coin_type, underlying_balance) =
        parse_compartment(id, fields, "underlying_vault")?;

    let expiry_ms = fields
        .get("expiry")
        .and_then(read_u64)
        .ok_or_else(|| shape_error(id, "missing or invalid 'expiry'"))?;
    let total_ds_supply = fields
        .get("total_ds")
        .and_then(read_u64)
        .ok_or_else(|| shape_error(id, "missing or invalid 'total_ds'"))?;

    Ok(VaultSnapshot {
        id: id.to_string(),
        pegged_coin_type,
        underlying_coin_type,
        pegged_balance,
        underlying_balance,
        total_ds_supply,
        expiry_ms,
    })
}

/// Vault IDs listed by the registry
pub fn parse_registry(object: &SuiObject) -> Result<Vec<String>, ProtocolError> {
    let id = object.object_id.as_str();
    let vaults = object
        .fields()
        .and_then(|f| f.get("vaults"))
        .and_then(Value::as_array)
        .ok_or_else(|| shape_error(id, "registry has no 'vaults' list"))?;

    vaults
        .iter()
        .map(|entry| match entry {
            Value::String(s) => Ok(s.clone()),
            // Some serializations wrap IDs as { id: "0x..." }
            Value::Object(map) => map
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| shape_error(id, "registry entry without id")),
            _ => Err(shape_error(id, "registry entry is not an object ID")),
        })
        .collect()
}

pub fn parse_underwriter_cap(object: &SuiObject, owner: &str) -> UnderwriterCap {
    UnderwriterCap {
        id: object.object_id.clone(),
        owner: object.owner_address().unwrap_or(owner).to_string(),
    }
}

/// Sort owned coins into pegged / underlying / DS lists
pub fn classify_coins(
    owner: &str,
    package_id: &str,
    coins: &[CoinStruct],
    decimals: &HashMap<String, u32>,
) -> Result<WalletHoldings, ProtocolError> {
    let ds_type = constants::ds_coin_type(package_id);
    let mut holdings = WalletHoldings {
        owner: owner.to_string(),
        ..Default::default()
    };

    for coin in coins {
        let holding = CoinHolding {
            id: coin.coin_object_id.clone(),
            balance: coin.balance_u64()?,
            coin_type: coin.coin_type.clone(),
            decimals: decimals
                .get(&coin.coin_type)
                .copied()
                .unwrap_or(DEFAULT_DECIMALS),
            symbol: CoinHolding::symbol_from_type(&coin.coin_type),
        };

        if coin.coin_type == ds_type {
            holdings.ds.push(holding);
        } else if coin.coin_type.contains(type_markers::PEGGED_COIN) {
            holdings.pegged.push(holding);
        } else if coin.coin_type.contains(type_markers::UNDERLYING_COIN) {
            holdings.underlying.push(holding);
        }
    }

    Ok(holdings)
}

/// Decimals for each coin type, falling back to the default when metadata
/// is missing or unreadable
pub async fn resolve_decimals<C: ChainQuery>(
    chain: &C,
    coin_types: impl IntoIterator<Item = &str>,
) -> HashMap<String, u32> {
    let mut out = HashMap::new();
    for coin_type in coin_types {
        if out.contains_key(coin_type) {
            continue;
        }
        let decimals = match chain.get_coin_metadata(coin_type).await {
            Ok(Some(meta)) => meta.decimals as u32,
            Ok(None) => DEFAULT_DECIMALS,
            Err(e) => {
                tracing::debug!(coin_type, "Coin metadata unavailable: {}", e);
                DEFAULT_DECIMALS
            }
        };
        out.insert(coin_type.to_string(), decimals);
    }
    out
}

/// Coins and capabilities of `owner` relevant to the vault program
pub async fn fetch_wallet_holdings<C: ChainQuery>(
    chain: &C,
    deployment: &Deployment,
    owner: &str,
) -> Result<WalletHoldings, Error> {
    let coins = chain.get_all_coins(owner).await?;

    let ds_type = constants::ds_coin_type(&deployment.package_id);
    let relevant = coins.iter().map(|c| c.coin_type.as_str()).filter(|t| {
        *t == ds_type
            || t.contains(type_markers::PEGGED_COIN)
            || t.contains(type_markers::UNDERLYING_COIN)
    })
    .collect::<Vec<&str>>();
    let decimals = resolve_decimals(chain, relevant).await;

    let mut holdings = classify_coins(owner, &deployment.package_id, &coins, &decimals)?;

    let cap_type = constants::underwriter_cap_type(&deployment.package_id);
    let caps = chain.get_owned_objects(owner, Some(&cap_type)).await?;
    holdings.caps = caps
        .iter()
        .map(|obj| parse_underwriter_cap(obj, owner))
        .collect();

    tracing::debug!(
        owner,
        pegged = holdings.pegged.len(),
        underlying = holdings.underlying.len(),
        ds = holdings.ds.len(),
        caps = holdings.caps.len(),
        "Fetched wallet holdings"
    );
    Ok(holdings)
}

/// Fetch and parse one vault
pub async fn fetch_vault<C: ChainQuery>(chain: &C, vault_id: &str) -> Result<VaultSnapshot, Error> {
    let object = chain.get_object(vault_id).await?;
    Ok(parse_vault(&object)?)
}

/// A configured object ID the node does not know is a deployment problem,
/// not a missing resource
fn configured_object(what: &str, err: NodeError) -> Error {
    match err {
        NodeError::ObjectNotFound { object_id } => ProtocolError::MissingConfiguration {
            what: format!("{} ({} does not exist on this network)", what, object_id),
        }
        .into(),
        other => other.into(),
    }
}

/// Objects for `ids` in order. One batched read when every ID resolves;
/// otherwise each ID is read on its own so missing ones can be named.
async fn vault_objects<C: ChainQuery>(
    chain: &C,
    ids: &[String],
) -> Result<Vec<(String, Result<SuiObject, NodeError>)>, Error> {
    match chain.multi_get_objects(ids).await {
        Ok(objects) => Ok(ids.iter().cloned().zip(objects.into_iter().map(Ok)).collect()),
        Err(NodeError::ObjectNotFound { .. }) => {
            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                match chain.get_object(id).await {
                    Err(e) if !matches!(e, NodeError::ObjectNotFound { .. }) => {
                        return Err(e.into())
                    }
                    result => out.push((id.clone(), result)),
                }
            }
            Ok(out)
        }
        Err(e) => Err(e.into()),
    }
}

/// Discover all vaults listed by the registry. Entries that are gone or fail
/// to parse are reported in `skipped` instead of failing the listing.
pub async fn discover_vaults<C: ChainQuery>(
    chain: &C,
    deployment: &Deployment,
) -> Result<VaultListing, Error> {
    let registry = chain
        .get_object(&deployment.registry_id)
        .await
        .map_err(|e| configured_object("registry_id", e))?;
    let vault_ids = parse_registry(&registry)?;
    if vault_ids.is_empty() {
        return Ok(VaultListing::default());
    }

    let mut listing = VaultListing::default();
    for (id, object) in vault_objects(chain, &vault_ids).await? {
        let parsed = object
            .map_err(|e| e.to_string())
            .and_then(|object| parse_vault(&object).map_err(|e| e.to_string()));
        match parsed {
            Ok(vault) => listing.vaults.push(vault),
            Err(reason) => {
                tracing::warn!(vault_id = %id, "Skipping registry entry: {}", reason);
                listing.skipped.push(SkippedVault { id, reason });
            }
        }
    }

    // Latest expiry first
    listing.vaults.sort_by(|a, b| b.expiry_ms.cmp(&a.expiry_ms));

    tracing::info!(
        skipped = listing.skipped.len(),
        "Discovered {} vaults",
        listing.vaults.len()
    );
    Ok(listing)
}

/// Check that the configured registry and treasury exist and look right
pub async fn verify_deployment<C: ChainQuery>(chain: &C, deployment: &Deployment) -> Result<(), Error> {
    let registry = chain
        .get_object(&deployment.registry_id)
        .await
        .map_err(|e| configured_object("registry_id", e))?;
    let treasury = chain
        .get_object(&deployment.treasury_id)
        .await
        .map_err(|e| configured_object("treasury_id", e))?;
    validate::check_shared_object(&registry, type_markers::VAULT_REGISTRY)?;
    validate::check_shared_object(&treasury, type_markers::VAULT_TREASURY)?;
    Ok(())
}
