//! Depeg Swap Calculator
//!
//! Pure integer math for redemption ratios and expiry. No async, no node.
//!
//!   pegged_required = ds_amount / 100   (ds_amount must divide evenly)
//!   ds_minted       = deposit * 100
//!   expiry_ms       = now_ms + hours * 3_600_000

use std::time::{SystemTime, UNIX_EPOCH};

use depeg_core::{ProtocolError, TimestampMs};

use crate::constants::{DS_PER_COLLATERAL, MIN_EXPIRY_HOURS, MS_PER_HOUR};

/// Pegged collateral paired with `ds_amount` DS tokens (exact when the
/// ratio check passed).
pub fn required_collateral(ds_amount: u64) -> u64 {
    ds_amount / DS_PER_COLLATERAL
}

/// DS tokens minted for a `deposit` of pegged tokens. `None` on overflow.
pub fn ds_minted(deposit: u64) -> Option<u64> {
    deposit.checked_mul(DS_PER_COLLATERAL)
}

/// Expiry timestamp for a vault created now and living `hours` hours
pub fn expiry_from_now(now_ms: TimestampMs, hours: u64) -> Result<TimestampMs, ProtocolError> {
    if hours < MIN_EXPIRY_HOURS {
        return Err(ProtocolError::InvalidAmount {
            message: format!("expiry must be at least {} hour(s)", MIN_EXPIRY_HOURS),
        });
    }
    hours
        .checked_mul(MS_PER_HOUR)
        .and_then(|span| now_ms.checked_add(span))
        .ok_or_else(|| ProtocolError::InvalidAmount {
            message: format!("expiry of {} hours is out of range", hours),
        })
}

/// Milliseconds left before expiry, `None` once expired
pub fn time_remaining(expiry_ms: TimestampMs, now_ms: TimestampMs) -> Option<u64> {
    expiry_ms.checked_sub(now_ms).filter(|ms| *ms > 0)
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_collateral() {
        assert_eq!(required_collateral(300), 3);
        assert_eq!(required_collateral(100_000_000_000), 1_000_000_000);
    }

    #[test]
    fn test_ds_minted() {
        assert_eq!(ds_minted(5), Some(500));
        assert_eq!(ds_minted(u64::MAX), None);
    }

    #[test]
    fn test_expiry_from_now() {
        assert_eq!(expiry_from_now(1_000, 24).unwrap(), 1_000 + 24 * 3_600_000);
        assert!(expiry_from_now(1_000, 0).is_err());
        assert!(expiry_from_now(u64::MAX - 1, 1).is_err());
    }

    #[test]
    fn test_time_remaining() {
        assert_eq!(time_remaining(5_000, 4_000), Some(1_000));
        assert_eq!(time_remaining(5_000, 5_000), None);
        assert_eq!(time_remaining(5_000, 9_000), None);
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
