//! sui-tx: Transaction building utilities for Sui
//!
//! Provides the programmable transaction request model, coin selection and
//! address checks.

pub mod address;
pub mod coin_select;
pub mod transaction;

pub use address::{normalize_object_id, validate_address, AddressError};
pub use coin_select::{select_coins, CoinRef, CoinSelectorError, SelectedCoins};
pub use transaction::*;
