//! The localhost client: a client of the host chain itself, verifying values against the
//! host store directly

use ibc_light_client_core::{
    client::CommitmentTarget,
    identifier::parse_chain_id,
    proto::{decode_any, RawHeight},
    store::Store,
    Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use tendermint_light_client::verify::committed_value;

/// Client type of the localhost client.
pub const LOCALHOST_CLIENT_TYPE: &str = "09-localhost";
/// The identifier the localhost client is stored under.
pub const LOCALHOST_CLIENT_ID: &str = "09-localhost";
/// Type url of the localhost client state.
pub const CLIENT_STATE_TYPE_URL: &str = "/ibc.lightclients.localhost.v1.ClientState";

/// `ibc.lightclients.localhost.v1.ClientState`
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawClientState {
    /// Host chain id
    #[prost(string, tag = "1")]
    pub chain_id: String,
    /// Latest host height
    #[prost(message, optional, tag = "2")]
    pub height: Option<RawHeight>,
}

/// State of the localhost client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientState {
    /// Host chain id
    pub chain_id: String,
    /// Latest host height
    pub height: Height,
}

impl ClientState {
    /// A localhost client for `chain_id` at `block_height`.
    #[must_use]
    pub fn new(chain_id: &str, block_height: u64) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            height: Height::new(parse_chain_id(chain_id), block_height),
        }
    }

    /// Unpacks a client state.
    ///
    /// # Errors
    /// Returns an error if the type url is not the localhost client state or the value does
    /// not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        let raw = decode_any::<RawClientState>(any, CLIENT_STATE_TYPE_URL)?;
        Ok(Self {
            chain_id: raw.chain_id,
            height: raw.height.map(Into::into).unwrap_or_default(),
        })
    }

    /// Packs the client state.
    #[must_use]
    pub fn to_any(&self) -> Any {
        let raw = RawClientState {
            chain_id: self.chain_id.clone(),
            height: Some(self.height.into()),
        };
        Any {
            type_url: CLIENT_STATE_TYPE_URL.to_string(),
            value: raw.encode_to_vec(),
        }
    }

    /// Checks the chain id and height.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidChainId`] for a blank chain id and
    /// [`ClientError::InvalidHeight`] for a zero height.
    pub fn validate(&self) -> Result<(), ClientError> {
        ensure!(
            !self.chain_id.trim().is_empty(),
            ClientError::InvalidChainId {
                reason: "chain id cannot be blank".to_string(),
            }
        );
        ensure!(
            self.height.revision_height != 0,
            ClientError::InvalidHeight {
                reason: "local revision height cannot be zero".to_string(),
            }
        );
        Ok(())
    }

    /// Moves the client to the given host block height.
    pub fn advance(&mut self, block_height: u64) {
        self.height = Height::new(parse_chain_id(&self.chain_id), block_height);
    }

    /// Verifies `target` against the value the host stores under its path.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] if the stored value is missing or differs, or
    /// if a receipt expected to be absent is present.
    pub fn verify_commitment(
        &self,
        host_store: &dyn Store,
        target: &CommitmentTarget,
    ) -> Result<(), ClientError> {
        let path = target.path();
        let stored = host_store.get(&path);
        match (committed_value(target), stored) {
            (Some(expected), Some(stored)) if expected == stored => Ok(()),
            (Some(_), Some(_)) => Err(ClientError::InvalidProof {
                reason: format!("value stored under {path} does not match"),
            }),
            (Some(_), None) => Err(ClientError::InvalidProof {
                reason: format!("no value stored under {path}"),
            }),
            (None, None) => Ok(()),
            (None, Some(_)) => Err(ClientError::InvalidProof {
                reason: format!("value stored under {path}, expected none"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::store::MemoryStore;

    use super::*;

    #[test]
    fn height_follows_chain_revision() {
        let mut client_state = ClientState::new("host-3", 7);
        assert_eq!(client_state.height, Height::new(3, 7));
        client_state.validate().unwrap();

        client_state.advance(8);
        assert_eq!(client_state.height, Height::new(3, 8));
        assert_eq!(ClientState::from_any(&client_state.to_any()).unwrap(), client_state);
    }

    #[test]
    fn validate() {
        assert!(matches!(
            ClientState::new(" ", 1).validate(),
            Err(ClientError::InvalidChainId { .. })
        ));
        assert!(matches!(
            ClientState::new("host", 0).validate(),
            Err(ClientError::InvalidHeight { .. })
        ));
    }

    #[test]
    fn verifies_against_host_store() {
        let client_state = ClientState::new("host", 1);
        let connection = CommitmentTarget::Connection {
            connection_id: "connection-0".to_string(),
            connection_end: b"open".to_vec(),
        };
        let receipt = CommitmentTarget::PacketReceiptAbsence {
            port_id: "transfer".to_string(),
            channel_id: "channel-0".to_string(),
            sequence: 1,
        };
        let mut host_store = MemoryStore::new();

        assert!(client_state.verify_commitment(&host_store, &connection).is_err());
        client_state.verify_commitment(&host_store, &receipt).unwrap();

        host_store.set(&connection.path(), b"open".to_vec());
        host_store.set(&receipt.path(), vec![1]);
        client_state.verify_commitment(&host_store, &connection).unwrap();
        assert!(matches!(
            client_state.verify_commitment(&host_store, &receipt),
            Err(ClientError::InvalidProof { .. })
        ));

        host_store.set(&connection.path(), b"closed".to_vec());
        assert!(client_state.verify_commitment(&host_store, &connection).is_err());
    }
}
