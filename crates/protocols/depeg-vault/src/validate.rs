//! Local pre-checks
//!
//! Each check mirrors a rule the vault program enforces on-chain, so a request
//! that would abort is refused before any transaction is built.

use depeg_core::{format_balance, parse_input_amount, to_u64_amount, Error, ProtocolError, TimestampMs};
use sui_rpc_client::SuiObject;
use sui_tx::validate_address;

use crate::calculator;
use crate::constants::DS_PER_COLLATERAL;
use crate::state::{UnderwriterCap, VaultSnapshot};

/// The connected account, or `NotConnected`
pub fn require_connected(address: Option<&str>) -> Result<&str, ProtocolError> {
    address
        .filter(|a| !a.is_empty())
        .ok_or(ProtocolError::NotConnected)
}

/// Recipient must be `0x` followed by 64 hex digits
pub fn validate_recipient(address: &str) -> Result<(), ProtocolError> {
    validate_address(address.trim()).map_err(|e| ProtocolError::MalformedRecipient {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a user-entered decimal amount into a non-zero raw `u64`
pub fn parse_positive_amount(input: &str, decimals: u32) -> Result<u64, Error> {
    let raw = to_u64_amount(&parse_input_amount(input, decimals)?)?;
    if raw == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: "amount must be greater than zero".to_string(),
        }
        .into());
    }
    Ok(raw)
}

/// DS redemption amount must be a non-zero multiple of the ratio.
/// Returns the pegged collateral it pairs with.
pub fn check_ratio(ds_amount: u64) -> Result<u64, ProtocolError> {
    if ds_amount == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: "DS amount must be greater than zero".to_string(),
        });
    }
    if ds_amount % DS_PER_COLLATERAL != 0 {
        return Err(ProtocolError::RatioViolation {
            amount: ds_amount.to_string(),
            ratio: DS_PER_COLLATERAL,
        });
    }
    Ok(calculator::required_collateral(ds_amount))
}

/// Hedgers redeem only before expiry
pub fn check_hedger_expiry(vault: &VaultSnapshot, now_ms: TimestampMs) -> Result<(), ProtocolError> {
    if !vault.is_active(now_ms) {
        return Err(ProtocolError::ExpiryViolation {
            vault_id: vault.id.clone(),
            reason: "vault has expired".to_string(),
        });
    }
    Ok(())
}

/// Underwriters redeem only at or after expiry
pub fn check_underwriter_expiry(
    vault: &VaultSnapshot,
    now_ms: TimestampMs,
) -> Result<(), ProtocolError> {
    if vault.is_active(now_ms) {
        return Err(ProtocolError::ExpiryViolation {
            vault_id: vault.id.clone(),
            reason: "vault has not expired yet".to_string(),
        });
    }
    Ok(())
}

/// `available` must cover `required`; the error quotes both as exact decimals
pub fn check_balance(
    token: &str,
    required: u64,
    available: u64,
    decimals: u32,
) -> Result<(), ProtocolError> {
    if available < required {
        return Err(ProtocolError::InsufficientBalance {
            token: token.to_string(),
            required: format_balance(&required.into(), decimals),
            available: format_balance(&available.into(), decimals),
        });
    }
    Ok(())
}

/// Vault deposits must be equal and non-zero
pub fn check_equal_deposit(pegged: u64, underlying: u64) -> Result<(), ProtocolError> {
    if pegged == 0 || underlying == 0 {
        return Err(ProtocolError::InvalidAmount {
            message: "deposit amounts must be greater than zero".to_string(),
        });
    }
    if pegged != underlying {
        return Err(ProtocolError::UnequalDeposit {
            pegged: pegged.to_string(),
            underlying: underlying.to_string(),
        });
    }
    Ok(())
}

/// Object must be shared and its type must contain `type_marker`
pub fn check_shared_object(object: &SuiObject, type_marker: &str) -> Result<(), ProtocolError> {
    if !object.is_shared() {
        return Err(ProtocolError::InvalidObjectShape {
            object_id: object.object_id.clone(),
            reason: "not a shared object".to_string(),
        });
    }
    match object.move_type() {
        Some(t) if t.contains(type_marker) => Ok(()),
        other => Err(ProtocolError::InvalidObjectShape {
            object_id: object.object_id.clone(),
            reason: format!(
                "expected type containing '{}', found '{}'",
                type_marker,
                other.unwrap_or("<none>")
            ),
        }),
    }
}

/// First owned underwriter capability
pub fn require_capability(caps: &[UnderwriterCap]) -> Result<&UnderwriterCap, ProtocolError> {
    caps.first().ok_or_else(|| ProtocolError::MissingCapability {
        capability: "UnderwriterCap".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0x7d20dcdb2bca4f508ea9613994683eb4e76e9c4ed371169677c1be02aaf0b58e";

    fn vault(expiry_ms: u64) -> VaultSnapshot {
        VaultSnapshot {
            id: "0xvault".into(),
            pegged_coin_type: "P".into(),
            underlying_coin_type: "U".into(),
            pegged_balance: 0,
            underlying_balance: 0,
            total_ds_supply: 0,
            expiry_ms,
        }
    }

    #[test]
    fn test_ratio() {
        assert!(matches!(
            check_ratio(250),
            Err(ProtocolError::RatioViolation { ratio: 100, .. })
        ));
        assert_eq!(check_ratio(300).unwrap(), 3);
        assert!(matches!(
            check_ratio(0),
            Err(ProtocolError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_expiry_gates() {
        let now = 10_000;
        assert!(check_hedger_expiry(&vault(now + 1), now).is_ok());
        assert!(matches!(
            check_hedger_expiry(&vault(now - 1), now),
            Err(ProtocolError::ExpiryViolation { .. })
        ));
        assert!(check_hedger_expiry(&vault(now), now).is_err());

        assert!(check_underwriter_expiry(&vault(now), now).is_ok());
        assert!(check_underwriter_expiry(&vault(now - 1), now).is_ok());
        assert!(matches!(
            check_underwriter_expiry(&vault(now + 1), now),
            Err(ProtocolError::ExpiryViolation { .. })
        ));
    }

    #[test]
    fn test_balance_message_uses_exact_decimals() {
        let err = check_balance("pegged tokens", 1_500_000_000, 1_250_000_000, 9).unwrap_err();
        match err {
            ProtocolError::InsufficientBalance {
                token,
                required,
                available,
            } => {
                assert_eq!(token, "pegged tokens");
                assert_eq!(required, "1.500000000");
                assert_eq!(available, "1.250000000");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(check_balance("x", 5, 5, 9).is_ok());
    }

    #[test]
    fn test_recipient() {
        assert!(validate_recipient(ADDR).is_ok());
        assert!(matches!(
            validate_recipient("0x1234"),
            Err(ProtocolError::MalformedRecipient { .. })
        ));
        assert!(validate_recipient(&ADDR[2..]).is_err());
    }

    #[test]
    fn test_require_connected() {
        assert_eq!(require_connected(Some(ADDR)).unwrap(), ADDR);
        assert!(matches!(
            require_connected(None),
            Err(ProtocolError::NotConnected)
        ));
        assert!(require_connected(Some("")).is_err());
    }

    #[test]
    fn test_parse_positive_amount() {
        assert_eq!(parse_positive_amount("1.5", 9).unwrap(), 1_500_000_000);
        assert!(matches!(
            parse_positive_amount("0", 9),
            Err(Error::Protocol(ProtocolError::InvalidAmount { .. }))
        ));
        assert!(matches!(
            parse_positive_amount("1e5", 9),
            Err(Error::Amount(_))
        ));
        assert!(matches!(
            parse_positive_amount("100000000000", 9),
            Err(Error::Amount(_))
        ));
    }

    #[test]
    fn test_equal_deposit() {
        assert!(check_equal_deposit(10, 10).is_ok());
        assert!(matches!(
            check_equal_deposit(10, 11),
            Err(ProtocolError::UnequalDeposit { .. })
        ));
        assert!(check_equal_deposit(0, 0).is_err());
    }

    #[test]
    fn test_shared_object_checks() {
        let registry: SuiObject = serde_json::from_value(json!({
            "objectId": "0xreg",
            "type": "0xpkg::registry::VaultRegistry",
            "owner": { "Shared": { "initial_shared_version": 1 } }
        }))
        .unwrap();
        assert!(check_shared_object(&registry, "::registry::VaultRegistry").is_ok());
        assert!(check_shared_object(&registry, "::vault::VaultTreasury").is_err());

        let owned: SuiObject = serde_json::from_value(json!({
            "objectId": "0xreg",
            "type": "0xpkg::registry::VaultRegistry",
            "owner": { "AddressOwner": ADDR }
        }))
        .unwrap();
        assert!(matches!(
            check_shared_object(&owned, "::registry::VaultRegistry"),
            Err(ProtocolError::InvalidObjectShape { .. })
        ));
    }

    #[test]
    fn test_require_capability() {
        assert!(require_capability(&[]).is_err());
        let caps = vec![UnderwriterCap {
            id: "0xcap".into(),
            owner: ADDR.into(),
        }];
        assert_eq!(require_capability(&caps).unwrap().id, "0xcap");
    }
}
