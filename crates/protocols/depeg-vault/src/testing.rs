//! In-memory chain and wallet doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use depeg_core::{NodeError, TxDigest, TxError};
use sui_rpc_client::{ChainQuery, CoinMetadata, CoinStruct, SuiObject, TxEffects};
use sui_tx::TransactionRequest;

use crate::fetch;
use crate::session::WalletSession;
use crate::state::{Deployment, UnderwriterCap, WalletHoldings};

pub const OWNER: &str = "0x7d20dcdb2bca4f508ea9613994683eb4e76e9c4ed371169677c1be02aaf0b58e";
pub const OTHER: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
pub const PKG: &str = "0xpkg";
pub const NOW_MS: u64 = 1_750_000_000_000;
pub const DAY_MS: u64 = 86_400_000;

pub fn pegged_type() -> String {
    format!("{}::pegged_coin::PEGGED_COIN", PKG)
}

pub fn underlying_type() -> String {
    format!("{}::underlying_coin::UNDERLYING_COIN", PKG)
}

pub fn deployment() -> Deployment {
    Deployment {
        package_id: PKG.into(),
        registry_id: "0xregistry".into(),
        treasury_id: "0xtreasury".into(),
    }
}

pub fn vault_object(id: &str, expiry_ms: u64) -> SuiObject {
    let vault_type = format!("{}::vault::Vault<{}, {}>", PKG, pegged_type(), underlying_type());
    serde_json::from_value(json!({
        "objectId": id,
        "version": "10",
        "digest": "VaultDigest",
        "type": vault_type,
        "owner": { "Shared": { "initial_shared_version": 5 } },
        "content": {
            "dataType": "moveObject",
            "type": vault_type,
            "fields": {
                "pegged_vault": {
                    "type": format!("0x2::coin::Coin<{}>", pegged_type()),
                    "fields": { "balance": "5000000000", "id": { "id": "0xpv" } }
                },
                "underlying_vault": {
                    "type": format!("0x2::coin::Coin<{}>", underlying_type()),
                    "fields": { "balance": "5000000000", "id": { "id": "0xuv" } }
                },
                "expiry": expiry_ms.to_string(),
                "total_ds": "500000000000"
            }
        }
    }))
    .unwrap()
}

pub fn registry_object(vault_ids: &[&str]) -> SuiObject {
    serde_json::from_value(json!({
        "objectId": "0xregistry",
        "type": format!("{}::registry::VaultRegistry", PKG),
        "owner": { "Shared": { "initial_shared_version": 2 } },
        "content": {
            "dataType": "moveObject",
            "fields": { "vaults": vault_ids }
        }
    }))
    .unwrap()
}

pub fn treasury_object() -> SuiObject {
    serde_json::from_value(json!({
        "objectId": "0xtreasury",
        "type": format!("{}::vault::VaultTreasury", PKG),
        "owner": { "Shared": { "initial_shared_version": 2 } },
        "content": { "dataType": "moveObject", "fields": {} }
    }))
    .unwrap()
}

pub fn cap_object() -> SuiObject {
    serde_json::from_value(json!({
        "objectId": "0xcap",
        "type": format!("{}::vault::UnderwriterCap", PKG),
        "owner": { "AddressOwner": OWNER }
    }))
    .unwrap()
}

fn coin(id: &str, coin_type: &str, balance: u64) -> CoinStruct {
    CoinStruct {
        coin_type: coin_type.to_string(),
        coin_object_id: id.to_string(),
        version: "1".into(),
        digest: "CoinDigest".into(),
        balance: balance.to_string(),
    }
}

pub fn wallet_coins() -> Vec<CoinStruct> {
    vec![
        coin("0xp1", &pegged_type(), 2_000_000_000),
        coin("0xp2", &pegged_type(), 1_000_000_000),
        coin("0xu1", &underlying_type(), 4_000_000_000),
        coin("0xds1", &format!("{}::vault::VAULT", PKG), 1_000_000_000_000),
        coin("0xgas", "0x2::sui::SUI", 10_000_000_000),
    ]
}

/// Holdings matching [`wallet_coins`] plus one underwriter cap
pub fn holdings() -> WalletHoldings {
    let mut holdings = fetch::classify_coins(OWNER, PKG, &wallet_coins(), &HashMap::new()).unwrap();
    holdings.caps = vec![UnderwriterCap {
        id: "0xcap".into(),
        owner: OWNER.into(),
    }];
    holdings
}

pub fn success_effects(created: &[&str]) -> TxEffects {
    let created: Vec<_> = created
        .iter()
        .map(|id| json!({ "owner": { "Shared": {} }, "reference": { "objectId": id, "digest": "C" } }))
        .collect();
    serde_json::from_value(json!({
        "status": { "status": "success" },
        "created": created
    }))
    .unwrap()
}

pub fn failure_effects(error: &str) -> TxEffects {
    serde_json::from_value(json!({
        "status": { "status": "failure", "error": error }
    }))
    .unwrap()
}

/// In-memory [`ChainQuery`]
#[derive(Default)]
pub struct MockChain {
    objects: Mutex<HashMap<String, SuiObject>>,
    coins: Mutex<HashMap<String, Vec<CoinStruct>>>,
    owned: Mutex<Vec<(String, SuiObject)>>,
    metadata: Mutex<HashMap<String, CoinMetadata>>,
    effects: Mutex<HashMap<String, TxEffects>>,
    pub coin_calls: AtomicUsize,
}

impl MockChain {
    /// Registry with two active vaults, one expired vault, a treasury and a
    /// funded wallet owning one cap
    pub fn standard() -> Self {
        let chain = Self::default();
        chain.put_object(registry_object(&["0xv1", "0xv2"]));
        chain.put_object(treasury_object());
        chain.put_object(vault_object("0xv1", NOW_MS + DAY_MS));
        chain.put_object(vault_object("0xv2", NOW_MS + 2 * DAY_MS));
        chain.put_object(vault_object("0xv0", NOW_MS - DAY_MS));
        chain.coins.lock().unwrap().insert(OWNER.into(), wallet_coins());
        chain.owned.lock().unwrap().push((OWNER.into(), cap_object()));
        chain
    }

    pub fn put_object(&self, object: SuiObject) {
        self.objects
            .lock()
            .unwrap()
            .insert(object.object_id.clone(), object);
    }

    pub fn set_coins(&self, owner: &str, coins: Vec<CoinStruct>) {
        self.coins.lock().unwrap().insert(owner.to_string(), coins);
    }

    pub fn set_effects(&self, digest: &str, effects: TxEffects) {
        self.effects
            .lock()
            .unwrap()
            .insert(digest.to_string(), effects);
    }
}

impl ChainQuery for MockChain {
    async fn get_object(&self, object_id: &str) -> Result<SuiObject, NodeError> {
        self.objects
            .lock()
            .unwrap()
            .get(object_id)
            .cloned()
            .ok_or_else(|| NodeError::ObjectNotFound {
                object_id: object_id.to_string(),
            })
    }

    async fn multi_get_objects(&self, object_ids: &[String]) -> Result<Vec<SuiObject>, NodeError> {
        let objects = self.objects.lock().unwrap();
        object_ids
            .iter()
            .map(|id| {
                objects.get(id).cloned().ok_or_else(|| NodeError::ObjectNotFound {
                    object_id: id.clone(),
                })
            })
            .collect()
    }

    async fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: Option<&str>,
    ) -> Result<Vec<SuiObject>, NodeError> {
        Ok(self
            .owned
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, obj)| {
                o == owner && struct_type.map_or(true, |t| obj.move_type() == Some(t))
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn get_all_coins(&self, owner: &str) -> Result<Vec<CoinStruct>, NodeError> {
        self.coin_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .coins
            .lock()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_coin_metadata(&self, coin_type: &str) -> Result<Option<CoinMetadata>, NodeError> {
        Ok(self.metadata.lock().unwrap().get(coin_type).cloned())
    }

    async fn wait_for_transaction(&self, digest: &str) -> Result<TxEffects, NodeError> {
        self.effects
            .lock()
            .unwrap()
            .get(digest)
            .cloned()
            .ok_or_else(|| NodeError::Timeout {
                what: format!("effects of {}", digest),
                secs: 0,
            })
    }
}

/// Wallet double that records submissions
pub struct MockWallet {
    pub address: Option<String>,
    /// `Ok(digest)` to accept, `Err(message)` to reject
    pub response: Result<String, String>,
    pub submitted: Mutex<Vec<TransactionRequest>>,
}

impl MockWallet {
    pub fn accepting(digest: &str) -> Self {
        Self {
            address: Some(OWNER.into()),
            response: Ok(digest.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            address: Some(OWNER.into()),
            response: Err(message.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl WalletSession for MockWallet {
    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn sign_and_submit(&self, tx: &TransactionRequest) -> Result<TxDigest, TxError> {
        self.submitted.lock().unwrap().push(tx.clone());
        match &self.response {
            Ok(digest) => Ok(TxDigest::new(digest.clone())),
            Err(message) => Err(TxError::Rejected {
                label: "Wallet rejected".into(),
                message: message.clone(),
            }),
        }
    }
}
