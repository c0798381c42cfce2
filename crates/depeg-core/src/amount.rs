//! Fixed-point token amount codec
//!
//! Converts between user-entered decimal strings and on-chain integer amounts
//! (smallest unit, scaled by 10^decimals), and renders on-chain integers back
//! into display strings.
//!
//! Everything that can end up in a transaction works on `BigUint`. The only
//! floating-point step is inside [`format_display_balance`], where it picks how
//! many fraction digits to show.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount parsing and formatting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Cannot format '{input}': not a non-negative integer")]
    Format { input: String },

    #[error("Amount {amount} does not fit in a u64")]
    Overflow { amount: String },

    #[error("Unsupported decimals {decimals}: at most {}", MAX_DECIMALS)]
    Decimals { decimals: u32 },
}

impl AmountError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::Format { .. } => "format_error",
            Self::Overflow { .. } => "amount_overflow",
            Self::Decimals { .. } => "unsupported_decimals",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Largest scale accepted from callers; coin metadata stores decimals as a `u8`
pub const MAX_DECIMALS: u32 = u8::MAX as u32;

/// Reject a scale no coin can have before any work is sized by it
pub fn check_decimals(decimals: u32) -> Result<u32, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::Decimals { decimals });
    }
    Ok(decimals)
}

fn invalid(input: &str, reason: impl Into<String>) -> AmountError {
    AmountError::InvalidAmount {
        input: input.to_string(),
        reason: reason.into(),
    }
}

fn pow10(decimals: u32) -> BigUint {
    BigUint::from(10u32).pow(decimals)
}

/// Parse a human-entered amount into the token's smallest unit.
///
/// Commas are thousands separators and are dropped. Fraction digits beyond
/// `decimals` are truncated, never rounded: `("1.239", 2)` is `123`.
/// An empty string (or a lone `.`) is zero.
pub fn parse_input_amount(amount: &str, decimals: u32) -> Result<BigUint, AmountError> {
    check_decimals(decimals)?;
    let cleaned: String = amount.trim().chars().filter(|&c| c != ',').collect();

    if let Some(c) = cleaned.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(invalid(amount, format!("unexpected character '{}'", c)));
    }

    let (int_part, frac_part) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    if frac_part.contains('.') {
        return Err(invalid(amount, "more than one decimal point"));
    }

    let width = decimals as usize;
    let mut digits = String::with_capacity(int_part.len() + width);
    digits.push_str(int_part);
    if frac_part.len() >= width {
        // ASCII only at this point, so byte slicing is safe
        digits.push_str(&frac_part[..width]);
    } else {
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat('0').take(width - frac_part.len()));
    }

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(BigUint::zero());
    }

    BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| invalid(amount, "not a number"))
}

/// Narrow a parsed amount to the u64 the chain's coin balances use.
pub fn to_u64_amount(amount: &BigUint) -> Result<u64, AmountError> {
    amount.to_u64().ok_or_else(|| AmountError::Overflow {
        amount: amount.to_string(),
    })
}

/// Parse a raw on-chain integer string (e.g. a coin balance from RPC).
pub fn parse_raw_amount(raw: &str) -> Result<BigUint, AmountError> {
    let raw_trimmed = raw.trim();
    if raw_trimmed.is_empty() || !raw_trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Format {
            input: raw.to_string(),
        });
    }
    BigUint::parse_bytes(raw_trimmed.as_bytes(), 10).ok_or_else(|| AmountError::Format {
        input: raw.to_string(),
    })
}

/// Exact fixed-width rendering: `"{integer}.{fraction}"` with the fraction
/// left-padded to `decimals` digits. With `decimals == 0` only the integer is
/// written.
///
/// `decimals` is trusted here; request input goes through [`check_decimals`]
/// or one of the `_str` variants first.
pub fn format_balance(raw: &BigUint, decimals: u32) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let divisor = pow10(decimals);
    let integer = raw / &divisor;
    let fraction = raw % &divisor;
    format!(
        "{}.{:0>width$}",
        integer,
        fraction.to_string(),
        width = decimals as usize
    )
}

/// [`format_balance`] with the fraction cut to `digits`. Display only.
pub fn format_balance_truncated(raw: &BigUint, decimals: u32, digits: u32) -> String {
    let full = format_balance(raw, decimals);
    match full.split_once('.') {
        Some((integer, _)) if digits == 0 => integer.to_string(),
        Some((integer, fraction)) => {
            let keep = (digits as usize).min(fraction.len());
            format!("{}.{}", integer, &fraction[..keep])
        }
        None => full,
    }
}

/// [`format_balance`] over a raw integer string.
pub fn format_balance_str(raw: &str, decimals: u32) -> Result<String, AmountError> {
    check_decimals(decimals)?;
    parse_raw_amount(raw).map(|value| format_balance(&value, decimals))
}

/// Adaptive-precision rendering for headline amounts.
///
/// | value            | fraction digits (trailing zeros trimmed) |
/// |------------------|------------------------------------------|
/// | 0                | `"0"`                                    |
/// | (0, 0.001)       | up to 6                                  |
/// | [0.001, 1)       | up to 4                                  |
/// | [1, 1000)        | up to 3                                  |
/// | >= 1000          | up to 2, with `,` thousands grouping     |
///
/// Lossy. Never feed the result back into a transaction amount.
pub fn format_display_balance(raw: &BigUint, decimals: u32) -> String {
    if raw.is_zero() {
        return "0".to_string();
    }

    let value = approximate(raw, decimals);

    if value < 0.001 {
        let shown = trim_fraction(format!("{:.6}", value));
        if shown == "0" {
            "< 0.000001".to_string()
        } else {
            shown
        }
    } else if value < 1.0 {
        trim_fraction(format!("{:.4}", value))
    } else if value < 1000.0 {
        trim_fraction(format!("{:.3}", value))
    } else {
        group_thousands(&trim_fraction(format!("{:.2}", value)))
    }
}

/// [`format_display_balance`] over a raw integer string.
pub fn format_display_balance_str(raw: &str, decimals: u32) -> Result<String, AmountError> {
    check_decimals(decimals)?;
    parse_raw_amount(raw).map(|value| format_display_balance(&value, decimals))
}

/// Float approximation of `raw / 10^decimals`, used only for picking display precision.
fn approximate(raw: &BigUint, decimals: u32) -> f64 {
    let divisor = pow10(decimals);
    let integer = (raw / &divisor).to_f64().unwrap_or(f64::MAX);
    let fraction = (raw % &divisor).to_f64().unwrap_or(0.0);
    let scale = divisor.to_f64().unwrap_or(f64::MAX);
    integer + fraction / scale
}

fn trim_fraction(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(s: &str) -> String {
    let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3 + fraction.len() + 1);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if !fraction.is_empty() {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Display density for amounts shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "digits")]
pub enum DisplayPolicy {
    /// Every fraction digit, exact
    Exact,
    /// Exact, fraction cut to N digits
    Truncated(u32),
    /// Precision picked by magnitude
    Adaptive,
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self::Adaptive
    }
}

impl DisplayPolicy {
    pub fn format(&self, raw: &BigUint, decimals: u32) -> String {
        match *self {
            Self::Exact => format_balance(raw, decimals),
            Self::Truncated(digits) => format_balance_truncated(raw, decimals, digits),
            Self::Adaptive => format_display_balance(raw, decimals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u128) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_parse_truncates_excess_fraction() {
        assert_eq!(parse_input_amount("1.239", 2).unwrap(), big(123));
        assert_eq!(parse_input_amount("0.999999999999", 9).unwrap(), big(999_999_999));
    }

    #[test]
    fn test_parse_pads_fraction() {
        assert_eq!(parse_input_amount("5", 3).unwrap(), big(5000));
        assert_eq!(parse_input_amount("0.1", 3).unwrap(), big(100));
        assert_eq!(parse_input_amount("1.5", 9).unwrap(), big(1_500_000_000));
    }

    #[test]
    fn test_parse_zero_collapse() {
        assert_eq!(parse_input_amount("0000.0", 2).unwrap(), big(0));
        assert_eq!(parse_input_amount("", 2).unwrap(), big(0));
        assert_eq!(parse_input_amount(".", 4).unwrap(), big(0));
        assert_eq!(parse_input_amount("007", 0).unwrap(), big(7));
    }

    #[test]
    fn test_parse_strips_commas() {
        assert_eq!(parse_input_amount("1,234.5", 2).unwrap(), big(123450));
        assert_eq!(parse_input_amount("1,000,000", 0).unwrap(), big(1_000_000));
    }

    #[test]
    fn test_parse_leading_dot() {
        assert_eq!(parse_input_amount(".25", 2).unwrap(), big(25));
    }

    #[test]
    fn test_parse_beyond_u64() {
        let parsed = parse_input_amount("123456789012345678901234567890", 18).unwrap();
        assert_eq!(
            parsed.to_string(),
            "123456789012345678901234567890000000000000000000"
        );
        assert!(matches!(
            to_u64_amount(&parsed),
            Err(AmountError::Overflow { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["abc", "1.2.3", "-5", "1e5", "12 34", "0x10", "1_000"] {
            let err = parse_input_amount(input, 9).unwrap_err();
            assert_eq!(err.error_code(), "invalid_amount", "input {:?}", input);
        }
    }

    #[test]
    fn test_scale_limit() {
        assert_eq!(parse_input_amount("1", MAX_DECIMALS).unwrap(), pow10(MAX_DECIMALS));
        for decimals in [MAX_DECIMALS + 1, 50_000_000, u32::MAX] {
            let err = parse_input_amount("1", decimals).unwrap_err();
            assert_eq!(err, AmountError::Decimals { decimals });
            assert_eq!(err.error_code(), "unsupported_decimals");
            assert!(matches!(
                format_balance_str("1", decimals),
                Err(AmountError::Decimals { .. })
            ));
            assert!(matches!(
                format_display_balance_str("1", decimals),
                Err(AmountError::Decimals { .. })
            ));
        }
        assert_eq!(check_decimals(9), Ok(9));
    }

    #[test]
    fn test_format_balance_exact() {
        assert_eq!(format_balance(&big(1_234_500_000), 9), "1.234500000");
        assert_eq!(format_balance(&big(5), 9), "0.000000005");
        assert_eq!(format_balance(&big(42), 0), "42");
    }

    #[test]
    fn test_format_balance_truncated() {
        assert_eq!(format_balance_truncated(&big(1_234_567_890), 9, 4), "1.2345");
        assert_eq!(format_balance_truncated(&big(1_234_567_890), 9, 0), "1");
        assert_eq!(format_balance_truncated(&big(150), 2, 6), "1.50");
    }

    #[test]
    fn test_round_trip_exact_mode() {
        let samples = [
            0u128,
            1,
            7,
            99,
            100,
            1_000_000_007,
            u64::MAX as u128,
            123_456_789_012_345_678_901_234_567_890,
        ];
        for decimals in 0..=18u32 {
            for &value in &samples {
                let raw = big(value);
                let text = format_balance(&raw, decimals);
                assert_eq!(
                    parse_input_amount(&text, decimals).unwrap(),
                    raw,
                    "decimals {} value {}",
                    decimals,
                    value
                );
            }
        }
    }

    #[test]
    fn test_format_str_rejects_non_numeric() {
        assert!(matches!(
            format_balance_str("12a", 9),
            Err(AmountError::Format { .. })
        ));
        assert!(matches!(
            format_display_balance_str("", 9),
            Err(AmountError::Format { .. })
        ));
        assert_eq!(format_balance_str("1500000000", 9).unwrap(), "1.500000000");
    }

    #[test]
    fn test_display_precision_tiers() {
        assert_eq!(format_display_balance(&big(0), 9), "0");
        assert_eq!(format_display_balance(&big(500_000), 9), "0.0005");
        assert_eq!(format_display_balance(&big(1_234), 9), "0.000001");
        assert_eq!(format_display_balance(&big(500_000_000), 9), "0.5");
        assert_eq!(format_display_balance(&big(123_456_789), 9), "0.1235");
        assert_eq!(format_display_balance(&big(500_000_000_000), 9), "500");
        assert_eq!(format_display_balance(&big(1_234_567_000), 9), "1.235");
        assert_eq!(format_display_balance(&big(50_000_000_000_000), 9), "50,000");
        assert_eq!(
            format_display_balance(&big(1_234_567_890_000_000), 9),
            "1,234,567.89"
        );
    }

    #[test]
    fn test_display_below_six_digits() {
        assert_eq!(format_display_balance(&big(1), 9), "< 0.000001");
    }

    #[test]
    fn test_display_policy() {
        let raw = big(1_234_567_890);
        assert_eq!(DisplayPolicy::Exact.format(&raw, 9), "1.234567890");
        assert_eq!(DisplayPolicy::Truncated(2).format(&raw, 9), "1.23");
        assert_eq!(DisplayPolicy::Adaptive.format(&raw, 9), "1.235");
    }

    #[test]
    fn test_display_policy_serde() {
        let json = serde_json::to_value(DisplayPolicy::Truncated(4)).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "truncated", "digits": 4}));
        let parsed: DisplayPolicy = serde_json::from_str(r#"{"mode":"adaptive"}"#).unwrap();
        assert_eq!(parsed, DisplayPolicy::Adaptive);
    }
}
