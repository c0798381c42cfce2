//! depeg-core: Shared types, errors, configuration and the amount codec
//!
//! This crate provides the foundational types used across the Depeg Swap workspace.

pub mod amount;
pub mod config;
pub mod errors;
pub mod types;

pub use amount::{
    check_decimals, format_balance, format_balance_str, format_balance_truncated, format_display_balance,
    format_display_balance_str, parse_input_amount, parse_raw_amount, to_u64_amount, AmountError,
    DisplayPolicy, MAX_DECIMALS,
};
pub use config::*;
pub use errors::*;
pub use types::*;
