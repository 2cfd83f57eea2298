//! Key-value store contract and the per-client namespaces built on it

use std::collections::BTreeMap;

use ibc_light_client_utils::serde::base64;
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::{
    error::ClientError,
    height::Height,
    path::{
        consensus_state_key, parse_consensus_state_key, parse_processed_time_key,
        processed_time_key, CLIENT_STATE_KEY,
    },
    Any,
};

/// A byte-valued key-value store with ordered prefix iteration.
pub trait Store {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// Removes the value stored under `key`.
    fn delete(&mut self, key: &str);

    /// Returns all entries whose key starts with `prefix`, ordered by key.
    fn iterate(&self, prefix: &str) -> Vec<(String, Vec<u8>)>;
}

/// An in-memory [`Store`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn iterate(&self, prefix: &str) -> Vec<(String, Vec<u8>)> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// The namespace prefix owned by a client: `clients/{client_id}/`.
#[must_use]
pub fn client_prefix(client_id: &str) -> String {
    format!("clients/{client_id}/")
}

/// A view of a parent store restricted to one client's namespace.
///
/// Keys handed to the view are relative to `clients/{client_id}/`.
pub struct ClientStore<'a> {
    parent: &'a mut dyn Store,
    prefix: String,
}

impl<'a> ClientStore<'a> {
    /// Scopes `parent` to the namespace of `client_id`.
    pub fn new(parent: &'a mut dyn Store, client_id: &str) -> Self {
        Self {
            parent,
            prefix: client_prefix(client_id),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl Store for ClientStore<'_> {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.parent.get(&self.full_key(key))
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        let key = self.full_key(key);
        self.parent.set(&key, value);
    }

    fn delete(&mut self, key: &str) {
        let key = self.full_key(key);
        self.parent.delete(&key);
    }

    fn iterate(&self, prefix: &str) -> Vec<(String, Vec<u8>)> {
        self.parent
            .iterate(&self.full_key(prefix))
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&self.prefix)
                    .map(|key| (key.to_string(), value))
            })
            .collect()
    }
}

/// Copies a client's namespace out of `parent` into a standalone store with relative keys.
#[must_use]
pub fn snapshot_client_store(parent: &dyn Store, client_id: &str) -> MemoryStore {
    let prefix = client_prefix(client_id);
    let mut snapshot = MemoryStore::new();
    for (key, value) in parent.iterate(&prefix) {
        if let Some(key) = key.strip_prefix(&prefix) {
            snapshot.set(key, value);
        }
    }
    snapshot
}

fn decode_stored_any(key: &str, bytes: &[u8]) -> Result<Any, ClientError> {
    Any::decode(bytes).map_err(|e| ClientError::Decode {
        reason: format!("stored value under {key:?} is not a packed any: {e}"),
    })
}

/// Returns the packed client state of the namespace.
///
/// # Errors
/// Returns [`ClientError::Decode`] if the stored bytes are corrupt.
pub fn get_client_state(store: &dyn Store) -> Result<Option<Any>, ClientError> {
    store
        .get(CLIENT_STATE_KEY)
        .map(|bytes| decode_stored_any(CLIENT_STATE_KEY, &bytes))
        .transpose()
}

/// Stores the packed client state of the namespace.
pub fn set_client_state(store: &mut dyn Store, client_state: &Any) {
    store.set(CLIENT_STATE_KEY, client_state.encode_to_vec());
}

/// Returns the packed consensus state stored at `height`.
///
/// # Errors
/// Returns [`ClientError::Decode`] if the stored bytes are corrupt.
pub fn get_consensus_state(store: &dyn Store, height: Height) -> Result<Option<Any>, ClientError> {
    let key = consensus_state_key(height);
    store
        .get(&key)
        .map(|bytes| decode_stored_any(&key, &bytes))
        .transpose()
}

/// Stores the packed consensus state at `height`.
pub fn set_consensus_state(store: &mut dyn Store, height: Height, consensus_state: &Any) {
    store.set(&consensus_state_key(height), consensus_state.encode_to_vec());
}

/// Returns the time in nanoseconds at which the consensus state at `height` was stored.
#[must_use]
pub fn get_processed_time(store: &dyn Store, height: Height) -> Option<u64> {
    let bytes = store.get(&processed_time_key(height))?;
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Records the time in nanoseconds at which the consensus state at `height` was stored.
pub fn set_processed_time(store: &mut dyn Store, height: Height, processed_time_ns: u64) {
    store.set(
        &processed_time_key(height),
        processed_time_ns.to_be_bytes().to_vec(),
    );
}

/// Returns the heights of all stored consensus states in ascending order.
#[must_use]
pub fn consensus_heights(store: &dyn Store) -> Vec<Height> {
    let mut heights: Vec<Height> = store
        .iterate("consensusStates/")
        .into_iter()
        .filter_map(|(key, _)| parse_consensus_state_key(&key))
        .collect();
    heights.sort_unstable();
    heights
}

/// A raw key-value pair of client metadata carried through genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisMetadata {
    /// Key relative to the client namespace
    #[serde(with = "base64")]
    pub key: Vec<u8>,
    /// Stored value
    #[serde(with = "base64")]
    pub value: Vec<u8>,
}

impl GenesisMetadata {
    /// Validates that key and value are non-empty.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidGenesis`] if either is empty.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.key.is_empty() {
            return Err(ClientError::InvalidGenesis {
                reason: "metadata key cannot be empty".to_string(),
            });
        }
        if self.value.is_empty() {
            return Err(ClientError::InvalidGenesis {
                reason: "metadata value cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Exports every `consensusStates/{height}/processedTime` entry of the namespace.
#[must_use]
pub fn export_metadata(store: &dyn Store) -> Vec<GenesisMetadata> {
    store
        .iterate("consensusStates/")
        .into_iter()
        .filter(|(key, _)| parse_processed_time_key(key).is_some())
        .map(|(key, value)| GenesisMetadata {
            key: key.into_bytes(),
            value,
        })
        .collect()
}

/// Writes exported metadata back under the same keys.
///
/// # Errors
/// Returns [`ClientError::InvalidGenesis`] if a key is not valid utf-8.
pub fn import_metadata(
    store: &mut dyn Store,
    metadata: &[GenesisMetadata],
) -> Result<(), ClientError> {
    for entry in metadata {
        let key = std::str::from_utf8(&entry.key).map_err(|e| ClientError::InvalidGenesis {
            reason: format!("metadata key is not valid utf-8: {e}"),
        })?;
        store.set(key, entry.value.clone());
    }
    Ok(())
}
