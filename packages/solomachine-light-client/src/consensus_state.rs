//! Solo machine consensus state

use ibc_light_client_core::{
    client::ConsensusStateCommon, commitment::MerkleRoot, crypto::PublicKey, proto::decode_any,
    Any, ClientError,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    proto::{RawConsensusState, CONSENSUS_STATE_TYPE_URL},
    SOLOMACHINE_CLIENT_TYPE,
};

/// The key, diversifier and time the solo machine currently signs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusState {
    /// Key that must sign the next message
    pub public_key: PublicKey,
    /// Domain separator mixed into every signature
    pub diversifier: String,
    /// Time of the last accepted message in nanoseconds
    pub timestamp: u64,
}

impl ConsensusState {
    /// Unpacks a consensus state.
    ///
    /// # Errors
    /// Returns an error if the type url is not the solo machine consensus state or the value
    /// does not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawConsensusState>(any, CONSENSUS_STATE_TYPE_URL)?.try_into()
    }
}

impl ConsensusStateCommon for ConsensusState {
    fn client_type(&self) -> &'static str {
        SOLOMACHINE_CLIENT_TYPE
    }

    fn root(&self) -> MerkleRoot {
        MerkleRoot::default()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            self.timestamp != 0,
            ClientError::InvalidConsensus {
                reason: "timestamp cannot be 0".to_string(),
            }
        );
        ensure!(
            self.diversifier.is_empty() || !self.diversifier.trim().is_empty(),
            ClientError::InvalidConsensus {
                reason: "diversifier cannot contain only spaces".to_string(),
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
        let public_key = raw
            .public_key
            .as_ref()
            .ok_or_else(|| ClientError::InvalidConsensus {
                reason: "public key cannot be empty".to_string(),
            })
            .and_then(PublicKey::from_any)?;
        Ok(Self {
            public_key,
            diversifier: raw.diversifier,
            timestamp: raw.timestamp,
        })
    }
}

impl From<ConsensusState> for RawConsensusState {
    fn from(consensus_state: ConsensusState) -> Self {
        Self {
            public_key: Some(consensus_state.public_key.to_any()),
            diversifier: consensus_state.diversifier,
            timestamp: consensus_state.timestamp,
        }
    }
}
