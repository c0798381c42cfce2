//! Sui address and object ID utilities

use depeg_core::constants::ADDRESS_HEX_LEN;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("must start with 0x")]
    MissingPrefix,
    #[error("must be 0x followed by {expected} hex characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("contains non-hex characters")]
    NotHex,
}

/// Check that `address` is a full-length `0x` + 64 hex account address.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    let hex_part = address
        .strip_prefix("0x")
        .ok_or(AddressError::MissingPrefix)?;
    if hex_part.len() != ADDRESS_HEX_LEN {
        return Err(AddressError::WrongLength {
            expected: ADDRESS_HEX_LEN,
            actual: hex_part.len(),
        });
    }
    hex::decode(hex_part).map_err(|_| AddressError::NotHex)?;
    Ok(())
}

/// Expand a short object ID such as `0x6` to its 64-hex-character form.
pub fn normalize_object_id(id: &str) -> Result<String, AddressError> {
    let hex_part = id.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
    if hex_part.is_empty() || hex_part.len() > ADDRESS_HEX_LEN {
        return Err(AddressError::WrongLength {
            expected: ADDRESS_HEX_LEN,
            actual: hex_part.len(),
        });
    }
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::NotHex);
    }
    Ok(format!(
        "0x{:0>width$}",
        hex_part.to_ascii_lowercase(),
        width = ADDRESS_HEX_LEN
    ))
}
