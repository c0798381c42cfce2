//! Fullnode status probing

use serde::{Deserialize, Serialize};

use crate::SuiClient;

/// Snapshot of fullnode reachability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Node is reachable and responding
    pub is_online: bool,

    pub url: String,

    /// Genesis checkpoint digest prefix identifying the chain
    pub chain_identifier: Option<String>,

    pub latest_checkpoint: Option<u64>,
}

/// Probe the node. Never fails; an unreachable node yields `is_online: false`.
pub async fn detect_status(client: &SuiClient) -> NodeStatus {
    let chain_identifier = match client.chain_identifier().await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(url = %client.url(), "Chain identifier probe failed: {}", e);
            None
        }
    };

    let latest_checkpoint = match client.latest_checkpoint().await {
        Ok(seq) => Some(seq),
        Err(e) => {
            tracing::debug!("Checkpoint probe failed: {}", e);
            None
        }
    };

    NodeStatus {
        is_online: chain_identifier.is_some() || latest_checkpoint.is_some(),
        url: client.url().to_string(),
        chain_identifier,
        latest_checkpoint,
    }
}
