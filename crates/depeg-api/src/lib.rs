//! depeg-api: HTTP API layer for Depeg Swap
//!
//! Serves vault listings, previews and unsigned transaction requests to the
//! frontend, which hands them to the user's wallet for signing.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;
pub mod watcher;

pub use server::*;
pub use state::{AppState, StateError, WalletState};
