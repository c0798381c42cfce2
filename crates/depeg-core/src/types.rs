//! Core type definitions for Depeg Swap

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object ID (32 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account address (32 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction digest (base58)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxDigest(pub String);

impl TxDigest {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Public fullnode JSON-RPC endpoint for this network
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
        }
    }

    /// Block explorer link for a transaction
    pub fn explorer_tx_url(&self, digest: &str) -> String {
        format!("https://suiscan.xyz/{}/tx/{}", self.as_str(), digest)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Some(Self::Devnet),
            "testnet" => Some(Self::Testnet),
            "mainnet" => Some(Self::Mainnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Milliseconds since the Unix epoch, as used by the on-chain clock
pub type TimestampMs = u64;

/// Constants
pub mod constants {
    /// Shared system clock object
    pub const CLOCK_OBJECT_ID: &str = "0x6";

    /// Native SUI coin type
    pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

    /// Decimals of SUI and of coins without published metadata
    pub const DEFAULT_COIN_DECIMALS: u32 = 9;

    /// Hex characters in a full-length address or object ID (after `0x`)
    pub const ADDRESS_HEX_LEN: usize = 64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse_and_display() {
        assert_eq!(Network::parse("Testnet"), Some(Network::Testnet));
        assert_eq!(Network::parse("localnet"), None);
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
    }

    #[test]
    fn test_network_urls() {
        assert_eq!(
            Network::Testnet.default_rpc_url(),
            "https://fullnode.testnet.sui.io:443"
        );
        assert_eq!(
            Network::Testnet.explorer_tx_url("Abc"),
            "https://suiscan.xyz/testnet/tx/Abc"
        );
    }

    #[test]
    fn test_network_serde() {
        let json = serde_json::to_string(&Network::Devnet).unwrap();
        assert_eq!(json, "\"devnet\"");
    }
}
