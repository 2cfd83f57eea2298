//! Genesis state of the client keeper

use std::collections::BTreeMap;

use ibc_light_client_core::{
    identifier::{parse_client_identifier, validate_client_identifier},
    store::GenesisMetadata,
    Any, ClientError, Height,
};
use ibc_light_client_utils::{
    ensure,
    serde::{base64, number_as_string},
};
use serde::{Deserialize, Serialize};

use crate::{
    any_client::{AnyClientState, AnyConsensusState},
    localhost::{LOCALHOST_CLIENT_ID, LOCALHOST_CLIENT_TYPE},
    params::Params,
};

/// A packed any-value as it appears in JSON, with a base64 value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedAny {
    /// Type url of the packed message
    pub type_url: String,
    /// Encoded message
    #[serde(with = "base64")]
    pub value: Vec<u8>,
}

impl From<Any> for PackedAny {
    fn from(any: Any) -> Self {
        Self {
            type_url: any.type_url,
            value: any.value,
        }
    }
}

impl From<PackedAny> for Any {
    fn from(packed: PackedAny) -> Self {
        Self {
            type_url: packed.type_url,
            value: packed.value,
        }
    }
}

/// A client state with its identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedClientState {
    /// Client identifier
    pub client_id: String,
    /// Packed client state
    pub client_state: PackedAny,
}

/// A consensus state with the height it is stored at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStateWithHeight {
    /// Height of the consensus state
    pub height: Height,
    /// Packed consensus state
    pub consensus_state: PackedAny,
}

/// All consensus states of one client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConsensusStates {
    /// Client identifier
    pub client_id: String,
    /// Consensus states, ascending by height
    pub consensus_states: Vec<ConsensusStateWithHeight>,
}

/// Raw metadata of one client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedGenesisMetadata {
    /// Client identifier
    pub client_id: String,
    /// Key-value pairs relative to the client namespace
    pub metadata: Vec<GenesisMetadata>,
}

/// Genesis state of the client keeper.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    /// Client states by identifier
    #[serde(default)]
    pub clients: Vec<IdentifiedClientState>,
    /// Consensus states by client
    #[serde(default)]
    pub clients_consensus: Vec<ClientConsensusStates>,
    /// Metadata by client
    #[serde(default)]
    pub clients_metadata: Vec<IdentifiedGenesisMetadata>,
    /// Keeper parameters
    #[serde(default)]
    pub params: Params,
    /// Whether to create the localhost client
    #[serde(default)]
    pub create_localhost: bool,
    /// Next sequence used to generate client identifiers
    #[serde(default, with = "number_as_string")]
    pub next_client_sequence: u64,
}

fn invalid(reason: String) -> ClientError {
    ClientError::InvalidGenesis { reason }
}

impl GenesisState {
    /// Checks every client, consensus state and metadata entry against the parameters.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidParams`] for invalid parameters and
    /// [`ClientError::InvalidGenesis`] for any other violation.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.params.validate()?;
        ensure!(
            !self.create_localhost || self.params.is_allowed_client(LOCALHOST_CLIENT_TYPE),
            invalid(format!(
                "localhost client is enabled but {LOCALHOST_CLIENT_TYPE} is not an allowed client type"
            ))
        );

        let mut client_types = BTreeMap::new();
        let mut max_sequence = None;
        for (i, client) in self.clients.iter().enumerate() {
            validate_client_identifier(&client.client_id)
                .map_err(|e| invalid(format!("client {i}: {e}")))?;
            ensure!(
                client.client_id != LOCALHOST_CLIENT_ID,
                invalid(format!(
                    "client {i}: {LOCALHOST_CLIENT_ID} is created from create_localhost"
                ))
            );
            let client_state = AnyClientState::from_any(&client.client_state.clone().into())
                .map_err(|e| invalid(format!("client {}: {e}", client.client_id)))?;
            let client_type = client_state.client_type();
            ensure!(
                self.params.is_allowed_client(client_type),
                invalid(format!(
                    "client {}: client type {client_type} is not allowed",
                    client.client_id
                ))
            );
            client_state
                .validate()
                .map_err(|e| invalid(format!("client {}: {e}", client.client_id)))?;

            let (parsed_type, sequence) = parse_client_identifier(&client.client_id)
                .map_err(|e| invalid(format!("client {}: {e}", client.client_id)))?;
            ensure!(
                parsed_type == client_type,
                invalid(format!(
                    "client {}: identifier type {parsed_type} does not match client type {client_type}",
                    client.client_id
                ))
            );
            max_sequence = max_sequence.max(Some(sequence));

            ensure!(
                client_types
                    .insert(client.client_id.as_str(), client_type)
                    .is_none(),
                invalid(format!("duplicate client {}", client.client_id))
            );
        }

        for client_consensus in &self.clients_consensus {
            let client_id = &client_consensus.client_id;
            let client_type = client_types.get(client_id.as_str()).ok_or_else(|| {
                invalid(format!(
                    "consensus states reference client {client_id} which is not in genesis"
                ))
            })?;
            for entry in &client_consensus.consensus_states {
                ensure!(
                    !entry.height.is_zero(),
                    invalid(format!("client {client_id}: consensus state height cannot be zero"))
                );
                let consensus_state =
                    AnyConsensusState::from_any(&entry.consensus_state.clone().into()).map_err(
                        |e| invalid(format!("client {client_id} at {}: {e}", entry.height)),
                    )?;
                ensure!(
                    consensus_state.client_type() == *client_type,
                    invalid(format!(
                        "client {client_id} at {}: consensus state type {} does not match client type {client_type}",
                        entry.height,
                        consensus_state.client_type()
                    ))
                );
                consensus_state
                    .validate_basic()
                    .map_err(|e| invalid(format!("client {client_id} at {}: {e}", entry.height)))?;
            }
        }

        for client_metadata in &self.clients_metadata {
            let client_id = &client_metadata.client_id;
            ensure!(
                client_types.contains_key(client_id.as_str()),
                invalid(format!(
                    "metadata references client {client_id} which is not in genesis"
                ))
            );
            for metadata in &client_metadata.metadata {
                metadata
                    .validate()
                    .map_err(|e| invalid(format!("client {client_id}: {e}")))?;
            }
        }

        if let Some(max_sequence) = max_sequence {
            ensure!(
                self.next_client_sequence > max_sequence,
                invalid(format!(
                    "next client sequence {} must be greater than the largest client sequence {max_sequence}",
                    self.next_client_sequence
                ))
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::client::{ClientStateCommon, ConsensusStateCommon};
    use solomachine_light_client::test_utils::TestSoloMachine;
    use tendermint_light_client::test_utils::TestChain;

    use super::*;

    fn valid_genesis() -> GenesisState {
        let solo = TestSoloMachine::secp256k1(1);
        let chain = TestChain::default();
        GenesisState {
            clients: vec![
                IdentifiedClientState {
                    client_id: "06-solomachine-0".to_string(),
                    client_state: solo.client_state().to_any().into(),
                },
                IdentifiedClientState {
                    client_id: "07-tendermint-1".to_string(),
                    client_state: chain.client_state(10).to_any().into(),
                },
            ],
            clients_consensus: vec![ClientConsensusStates {
                client_id: "07-tendermint-1".to_string(),
                consensus_states: vec![ConsensusStateWithHeight {
                    height: chain.height(10),
                    consensus_state: chain.consensus_state_at(10).to_any().into(),
                }],
            }],
            clients_metadata: vec![IdentifiedGenesisMetadata {
                client_id: "07-tendermint-1".to_string(),
                metadata: vec![GenesisMetadata {
                    key: b"consensusStates/0-10/processedTime".to_vec(),
                    value: 5_u64.to_be_bytes().to_vec(),
                }],
            }],
            params: Params::default(),
            create_localhost: false,
            next_client_sequence: 2,
        }
    }

    #[test]
    fn valid() {
        valid_genesis().validate().unwrap();
        GenesisState::default().validate().unwrap();
    }

    #[test]
    fn json_round_trip() {
        let genesis = valid_genesis();
        let json = serde_json::to_string(&genesis).unwrap();
        assert!(json.contains(r#""next_client_sequence":"2""#));
        assert_eq!(serde_json::from_str::<GenesisState>(&json).unwrap(), genesis);
    }

    #[test]
    fn invalid_client_identifier() {
        let mut genesis = valid_genesis();
        genesis.clients[0].client_id = "/~@$*".to_string();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("identifier")
        ));
    }

    #[test]
    fn client_type_not_allowed() {
        let mut genesis = valid_genesis();
        genesis.params = Params::new(&["07-tendermint"]);
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("not allowed")
        ));
    }

    #[test]
    fn invalid_client_state() {
        let mut genesis = valid_genesis();
        let mut client_state = TestSoloMachine::secp256k1(1).client_state();
        client_state.sequence = 0;
        genesis.clients[0].client_state = client_state.to_any().into();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("sequence")
        ));
    }

    #[test]
    fn identifier_type_mismatch() {
        let mut genesis = valid_genesis();
        genesis.clients[0].client_id = "07-tendermint-0".to_string();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("does not match")
        ));
    }

    #[test]
    fn duplicate_client() {
        let mut genesis = valid_genesis();
        genesis.clients.push(genesis.clients[1].clone());
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("duplicate")
        ));
    }

    #[test]
    fn consensus_state_for_unknown_client() {
        let mut genesis = valid_genesis();
        genesis.clients_consensus[0].client_id = "07-tendermint-9".to_string();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("not in genesis")
        ));
    }

    #[test]
    fn consensus_state_at_zero_height() {
        let mut genesis = valid_genesis();
        genesis.clients_consensus[0].consensus_states[0].height = Height::zero();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("zero")
        ));
    }

    #[test]
    fn consensus_state_of_other_type() {
        let mut genesis = valid_genesis();
        genesis.clients_consensus[0].consensus_states[0].consensus_state =
            TestSoloMachine::secp256k1(1).consensus_state().to_any().into();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("does not match")
        ));
    }

    #[test]
    fn invalid_metadata() {
        let mut genesis = valid_genesis();
        genesis.clients_metadata[0].metadata[0].value = vec![];
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("value")
        ));

        let mut genesis = valid_genesis();
        genesis.clients_metadata[0].client_id = "07-tendermint-5".to_string();
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("not in genesis")
        ));
    }

    #[test]
    fn next_sequence_must_exceed_client_sequences() {
        let mut genesis = valid_genesis();
        genesis.next_client_sequence = 1;
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("next client sequence")
        ));
    }

    #[test]
    fn localhost_must_be_allowed() {
        let mut genesis = valid_genesis();
        genesis.create_localhost = true;
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidGenesis { reason }) if reason.contains("localhost")
        ));

        genesis
            .params
            .allowed_client_types
            .push(LOCALHOST_CLIENT_TYPE.to_string());
        genesis.validate().unwrap();
    }

    #[test]
    fn invalid_params() {
        let mut genesis = valid_genesis();
        genesis.params.allowed_client_types.push(String::new());
        assert!(matches!(
            genesis.validate(),
            Err(ClientError::InvalidParams { .. })
        ));
    }
}
