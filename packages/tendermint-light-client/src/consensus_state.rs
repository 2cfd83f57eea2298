//! Tendermint consensus state

use ibc_light_client_core::{
    client::ConsensusStateCommon, commitment::MerkleRoot, proto::decode_any, Any, ClientError,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use tendermint::{
    hash::{Algorithm, SHA256_HASH_SIZE},
    Hash, Time,
};

use crate::{
    header::Header,
    proto::{RawConsensusState, RawMerkleRoot, CONSENSUS_STATE_TYPE_URL},
    time, TENDERMINT_CLIENT_TYPE,
};

/// The state of the counterparty at one height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusState {
    /// Block time
    pub timestamp: Time,
    /// App hash of the block
    pub root: MerkleRoot,
    /// Hash of the validator set of the next block
    pub next_validators_hash: Hash,
}

impl ConsensusState {
    /// Unpacks a consensus state.
    ///
    /// # Errors
    /// Returns an error if the type url is not the tendermint consensus state or the value
    /// does not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawConsensusState>(any, CONSENSUS_STATE_TYPE_URL)?.try_into()
    }
}

impl From<&Header> for ConsensusState {
    fn from(header: &Header) -> Self {
        let block = header.signed_header.header();
        Self {
            timestamp: block.time,
            root: MerkleRoot::new(block.app_hash.as_bytes().to_vec()),
            next_validators_hash: block.next_validators_hash,
        }
    }
}

impl ConsensusStateCommon for ConsensusState {
    fn client_type(&self) -> &'static str {
        TENDERMINT_CLIENT_TYPE
    }

    fn root(&self) -> MerkleRoot {
        self.root.clone()
    }

    fn timestamp(&self) -> u64 {
        time::to_nanos(self.timestamp)
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            !self.root.is_empty(),
            ClientError::InvalidConsensus {
                reason: "root cannot be empty".to_string(),
            }
        );
        ensure!(
            self.next_validators_hash.as_bytes().len() == SHA256_HASH_SIZE,
            ClientError::InvalidConsensus {
                reason: "next validators hash is invalid".to_string(),
            }
        );
        ensure!(
            self.timestamp.unix_timestamp_nanos() > 0,
            ClientError::InvalidConsensus {
                reason: "timestamp must be a positive Unix time".to_string(),
            }
        );
        Ok(())
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: CONSENSUS_STATE_TYPE_URL.to_string(),
            value: RawConsensusState::from(self.clone()).encode_to_vec(),
        }
    }
}

impl TryFrom<RawConsensusState> for ConsensusState {
    type Error = ClientError;

    fn try_from(raw: RawConsensusState) -> Result<Self, Self::Error> {
        let timestamp = raw
            .timestamp
            .ok_or_else(|| ClientError::InvalidConsensus {
                reason: "timestamp cannot be empty".to_string(),
            })?
            .try_into()
            .map_err(|e| ClientError::InvalidConsensus {
                reason: format!("invalid timestamp: {e}"),
            })?;
        let next_validators_hash = Hash::from_bytes(Algorithm::Sha256, &raw.next_validators_hash)
            .map_err(|e| ClientError::InvalidConsensus {
                reason: format!("invalid next validators hash: {e}"),
            })?;
        Ok(Self {
            timestamp,
            root: MerkleRoot::new(raw.root.unwrap_or_default().hash),
            next_validators_hash,
        })
    }
}

impl From<ConsensusState> for RawConsensusState {
    fn from(consensus_state: ConsensusState) -> Self {
        Self {
            timestamp: Some(consensus_state.timestamp.into()),
            root: Some(RawMerkleRoot {
                hash: consensus_state.root.hash,
            }),
            next_validators_hash: consensus_state.next_validators_hash.as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{consensus_state, NANOS_PER_SECOND};

    #[test]
    fn validate_basic() {
        let consensus_state = consensus_state(100);
        consensus_state.validate_basic().unwrap();
        assert_eq!(consensus_state.timestamp(), 100 * NANOS_PER_SECOND);

        let mut invalid = consensus_state.clone();
        invalid.root = MerkleRoot::default();
        assert!(matches!(
            invalid.validate_basic(),
            Err(ClientError::InvalidConsensus { reason }) if reason.contains("root")
        ));

        let mut invalid = consensus_state;
        invalid.next_validators_hash = Hash::None;
        assert!(matches!(
            invalid.validate_basic(),
            Err(ClientError::InvalidConsensus { reason }) if reason.contains("validators")
        ));
    }

    #[test]
    fn unpacks_packed_state() {
        let consensus_state = consensus_state(100);
        assert_eq!(
            ConsensusState::from_any(&consensus_state.to_any()).unwrap(),
            consensus_state
        );
    }

    #[test]
    fn requires_timestamp() {
        let raw = RawConsensusState {
            timestamp: None,
            ..consensus_state(100).into()
        };
        assert!(matches!(
            ConsensusState::try_from(raw),
            Err(ClientError::InvalidConsensus { .. })
        ));
    }
}
