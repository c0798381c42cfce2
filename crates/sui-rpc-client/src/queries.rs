//! Typed fullnode responses and the `ChainQuery` seam
//!
//! Vault logic reads the chain only through [`ChainQuery`], so it can run
//! against the live client, the cached wrapper, or an in-memory mock.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use depeg_core::{NodeError, ProtocolError};

use crate::Result;

/// Object data as returned with `showType`, `showOwner` and `showContent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiObject {
    pub object_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub digest: String,
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub owner: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl SuiObject {
    /// Move type, from the object or its content
    pub fn move_type(&self) -> Option<&str> {
        self.object_type
            .as_deref()
            .or_else(|| self.content.as_ref()?.get("type")?.as_str())
    }

    /// Move struct fields (`content.fields`)
    pub fn fields(&self) -> Option<&Value> {
        self.content.as_ref()?.get("fields")
    }

    pub fn is_shared(&self) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|o| o.get("Shared").is_some())
    }

    /// Owning address, for address-owned objects
    pub fn owner_address(&self) -> Option<&str> {
        self.owner.as_ref()?.get("AddressOwner")?.as_str()
    }
}

/// `{ data }` or `{ error }` wrapper around a single object
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<SuiObject>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl ObjectResponse {
    pub fn into_object(self, requested_id: &str) -> Result<SuiObject> {
        if let Some(data) = self.data {
            return Ok(data);
        }
        match self.error {
            Some(err) if err["code"] == "notExists" || err["code"] == "deleted" => {
                Err(NodeError::ObjectNotFound {
                    object_id: requested_id.to_string(),
                })
            }
            Some(err) => Err(NodeError::ApiError {
                message: format!("object {}: {}", requested_id, err),
            }),
            None => Err(NodeError::ObjectNotFound {
                object_id: requested_id.to_string(),
            }),
        }
    }
}

/// One owned coin object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinStruct {
    pub coin_type: String,
    pub coin_object_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub digest: String,
    /// Raw integer balance as a decimal string
    pub balance: String,
}

impl CoinStruct {
    /// Balance as a `u64`; anything else means the node sent a bad coin
    pub fn balance_u64(&self) -> std::result::Result<u64, ProtocolError> {
        self.balance
            .parse()
            .map_err(|_| ProtocolError::InvalidObjectShape {
                object_id: self.coin_object_id.clone(),
                reason: format!("coin balance '{}' is not a u64", self.balance),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinMetadata {
    pub decimals: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Paginated result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<Value>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: String,
    #[serde(default)]
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedObjectRef {
    #[serde(default)]
    pub owner: Value,
    pub reference: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Transaction effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxEffects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub transaction_digest: String,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
    #[serde(default)]
    pub mutated: Vec<OwnedObjectRef>,
}

impl TxEffects {
    pub fn is_success(&self) -> bool {
        self.status.status == "success"
    }

    /// Failure text reported by the chain, if the transaction aborted
    pub fn failure_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        Some(
            self.status
                .error
                .clone()
                .unwrap_or_else(|| self.status.status.clone()),
        )
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.created
            .iter()
            .map(|c| c.reference.object_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxBlockResponse {
    pub digest: String,
    #[serde(default)]
    pub effects: Option<TxEffects>,
    #[serde(default)]
    pub timestamp_ms: Option<String>,
    #[serde(default)]
    pub checkpoint: Option<String>,
}

/// Read access to chain state
pub trait ChainQuery: Send + Sync {
    fn get_object(&self, object_id: &str) -> impl Future<Output = Result<SuiObject>> + Send;

    fn multi_get_objects(
        &self,
        object_ids: &[String],
    ) -> impl Future<Output = Result<Vec<SuiObject>>> + Send;

    /// Objects owned by `owner`, optionally restricted to one struct type
    fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: Option<&str>,
    ) -> impl Future<Output = Result<Vec<SuiObject>>> + Send;

    /// Every coin object owned by `owner`, across all coin types
    fn get_all_coins(&self, owner: &str) -> impl Future<Output = Result<Vec<CoinStruct>>> + Send;

    fn get_coin_metadata(
        &self,
        coin_type: &str,
    ) -> impl Future<Output = Result<Option<CoinMetadata>>> + Send;

    /// Block until effects for `digest` are available
    fn wait_for_transaction(&self, digest: &str) -> impl Future<Output = Result<TxEffects>> + Send;
}
