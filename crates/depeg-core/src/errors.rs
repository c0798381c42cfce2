//! Error types for Depeg Swap

use thiserror::Error;

use crate::amount::AmountError;

/// Core errors that can occur in Depeg Swap
#[derive(Debug, Error)]
pub enum Error {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Fullnode connection and query errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Fullnode unreachable at {url}")]
    Unreachable { url: String },

    #[error("Fullnode returned error: {message}")]
    ApiError { message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Object not found: {object_id}")]
    ObjectNotFound { object_id: String },

    #[error("Timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },
}

/// Vault protocol errors. Every local pre-check maps to exactly one variant.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Missing configuration: {what}")]
    MissingConfiguration { what: String },

    #[error("Unexpected object shape for {object_id}: {reason}")]
    InvalidObjectShape { object_id: String, reason: String },

    #[error("Insufficient {token}: need {required}, have {available}")]
    InsufficientBalance {
        token: String,
        required: String,
        available: String,
    },

    #[error("Amount {amount} must be divisible by {ratio}")]
    RatioViolation { amount: String, ratio: u64 },

    #[error("Vault {vault_id}: {reason}")]
    ExpiryViolation { vault_id: String, reason: String },

    #[error("Invalid recipient {address}: {reason}")]
    MalformedRecipient { address: String, reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Pegged and underlying amounts must be equal (pegged {pegged}, underlying {underlying})")]
    UnequalDeposit { pegged: String, underlying: String },

    #[error("Missing capability: {capability}")]
    MissingCapability { capability: String },
}

/// Transaction building and submission errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Failed to build transaction: {message}")]
    BuildFailed { message: String },

    #[error("Failed to serialize transaction: {message}")]
    SerializationFailed { message: String },

    #[error("{label}: {message}")]
    Rejected { label: String, message: String },
}

/// Result type alias for Depeg Swap operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::MissingConfiguration { .. } => "missing_configuration",
            Self::InvalidObjectShape { .. } => "invalid_object_shape",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::RatioViolation { .. } => "ratio_violation",
            Self::ExpiryViolation { .. } => "expiry_violation",
            Self::MalformedRecipient { .. } => "malformed_recipient",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::UnequalDeposit { .. } => "unequal_deposit",
            Self::MissingCapability { .. } => "missing_capability",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotConnected => 401,
            Self::InvalidAmount { .. } | Self::MalformedRecipient { .. } => 400,
            Self::InsufficientBalance { .. } | Self::RatioViolation { .. } => 422,
            Self::ExpiryViolation { .. } | Self::UnequalDeposit { .. } => 422,
            Self::MissingCapability { .. } => 403,
            Self::MissingConfiguration { .. } | Self::InvalidObjectShape { .. } => 503,
        }
    }
}

impl Error {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Node(NodeError::ObjectNotFound { .. }) => "object_not_found",
            Self::Node(NodeError::Timeout { .. }) => "timeout",
            Self::Node(_) => "node_error",
            Self::Protocol(e) => e.error_code(),
            Self::Transaction(TxError::Rejected { .. }) => "transaction_rejected",
            Self::Transaction(TxError::InvalidAddress { .. }) => "invalid_address",
            Self::Transaction(_) => "transaction_error",
            Self::Amount(e) => e.error_code(),
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Node(NodeError::ObjectNotFound { .. }) => 404,
            Self::Node(NodeError::Timeout { .. }) => 504,
            Self::Node(_) => 502,
            Self::Protocol(e) => e.status_code(),
            Self::Transaction(TxError::Rejected { .. }) => 422,
            Self::Transaction(TxError::InvalidAddress { .. }) => 400,
            Self::Transaction(_) => 500,
            Self::Amount(e) => e.status_code(),
            Self::Config(_) | Self::Serialization(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        let err = ProtocolError::RatioViolation {
            amount: "250".into(),
            ratio: 100,
        };
        assert_eq!(err.error_code(), "ratio_violation");
        assert_eq!(err.status_code(), 422);

        let err = ProtocolError::NotConnected;
        assert_eq!(err.error_code(), "not_connected");
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = ProtocolError::InsufficientBalance {
            token: "DS token".into(),
            required: "5.000000000".into(),
            available: "1.250000000".into(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient DS token: need 5.000000000, have 1.250000000"
        );
    }

    #[test]
    fn test_rejected_keeps_collaborator_text() {
        let err: Error = TxError::Rejected {
            label: "Transaction failed".into(),
            message: "MoveAbort(vault, 3)".into(),
        }
        .into();
        assert_eq!(err.error_code(), "transaction_rejected");
        assert!(err.to_string().contains("MoveAbort(vault, 3)"));
    }

    #[test]
    fn test_amount_error_passthrough() {
        let err: Error = AmountError::Format {
            input: "x".into(),
        }
        .into();
        assert_eq!(err.error_code(), "format_error");
        assert_eq!(err.status_code(), 400);
    }
}
