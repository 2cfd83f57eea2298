//! Closed sets of the client variants the keeper can route to

use ibc_light_client_core::{
    client::{
        ClientStateCommon, ConsensusStateCommon, HeaderCommon, MisbehaviourCommon, Status,
    },
    store::Store,
    Any, ClientError, Height,
};
use solomachine_light_client as solomachine;
use tendermint_light_client as tendermint;

use crate::localhost;

/// A client state of any supported client type.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyClientState {
    /// Solo machine client
    SoloMachine(solomachine::ClientState),
    /// Tendermint client
    Tendermint(tendermint::ClientState),
    /// Localhost client
    Localhost(localhost::ClientState),
}

impl AnyClientState {
    /// Unpacks a client state by its type url.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownTypeUrl`] for unsupported types and a decode error if
    /// the value is malformed.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        match any.type_url.as_str() {
            solomachine::proto::CLIENT_STATE_TYPE_URL => {
                solomachine::ClientState::from_any(any).map(Self::SoloMachine)
            }
            tendermint::proto::CLIENT_STATE_TYPE_URL => {
                tendermint::ClientState::from_any(any).map(Self::Tendermint)
            }
            localhost::CLIENT_STATE_TYPE_URL => {
                localhost::ClientState::from_any(any).map(Self::Localhost)
            }
            type_url => Err(ClientError::UnknownTypeUrl {
                type_url: type_url.to_string(),
            }),
        }
    }

    /// Packs the client state.
    #[must_use]
    pub fn to_any(&self) -> Any {
        match self {
            Self::SoloMachine(client_state) => client_state.to_any(),
            Self::Tendermint(client_state) => client_state.to_any(),
            Self::Localhost(client_state) => client_state.to_any(),
        }
    }

    /// Short type tag.
    #[must_use]
    pub const fn client_type(&self) -> &'static str {
        match self {
            Self::SoloMachine(_) => solomachine::SOLOMACHINE_CLIENT_TYPE,
            Self::Tendermint(_) => tendermint::TENDERMINT_CLIENT_TYPE,
            Self::Localhost(_) => localhost::LOCALHOST_CLIENT_TYPE,
        }
    }

    /// Latest height the client can verify at.
    #[must_use]
    pub fn latest_height(&self) -> Height {
        match self {
            Self::SoloMachine(client_state) => client_state.latest_height(),
            Self::Tendermint(client_state) => client_state.latest_height(),
            Self::Localhost(client_state) => client_state.height,
        }
    }

    /// Height the client was frozen at, zero when it is not frozen.
    #[must_use]
    pub fn frozen_height(&self) -> Height {
        match self {
            Self::SoloMachine(client_state) => client_state.frozen_height(),
            Self::Tendermint(client_state) => client_state.frozen_height(),
            Self::Localhost(_) => Height::zero(),
        }
    }

    /// Returns true if misbehaviour froze the client.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.frozen_height().is_zero()
    }

    /// Checks the structural validity of the client state.
    ///
    /// # Errors
    /// Returns the validation error of the underlying client.
    pub fn validate(&self) -> Result<(), ClientError> {
        match self {
            Self::SoloMachine(client_state) => client_state.validate(),
            Self::Tendermint(client_state) => client_state.validate(),
            Self::Localhost(client_state) => client_state.validate(),
        }
    }

    /// Status of the client at `now_ns`, given its namespace.
    ///
    /// # Errors
    /// Returns an error if a stored consensus state is corrupt.
    pub fn status(&self, client_store: &dyn Store, now_ns: u64) -> Result<Status, ClientError> {
        match self {
            Self::SoloMachine(client_state) => Ok(client_state.status()),
            Self::Tendermint(client_state) => client_state.status(client_store, now_ns),
            Self::Localhost(_) => Ok(Status::Active),
        }
    }
}

/// A consensus state of any client type that stores consensus states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyConsensusState {
    /// Solo machine consensus state
    SoloMachine(solomachine::ConsensusState),
    /// Tendermint consensus state
    Tendermint(tendermint::ConsensusState),
}

impl AnyConsensusState {
    /// Unpacks a consensus state by its type url.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownTypeUrl`] for unsupported types and a decode error if
    /// the value is malformed.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        match any.type_url.as_str() {
            solomachine::proto::CONSENSUS_STATE_TYPE_URL => {
                solomachine::ConsensusState::from_any(any).map(Self::SoloMachine)
            }
            tendermint::proto::CONSENSUS_STATE_TYPE_URL => {
                tendermint::ConsensusState::from_any(any).map(Self::Tendermint)
            }
            type_url => Err(ClientError::UnknownTypeUrl {
                type_url: type_url.to_string(),
            }),
        }
    }

    /// Packs the consensus state.
    #[must_use]
    pub fn to_any(&self) -> Any {
        match self {
            Self::SoloMachine(consensus_state) => consensus_state.to_any(),
            Self::Tendermint(consensus_state) => consensus_state.to_any(),
        }
    }

    /// Short type tag.
    #[must_use]
    pub fn client_type(&self) -> &'static str {
        match self {
            Self::SoloMachine(consensus_state) => consensus_state.client_type(),
            Self::Tendermint(consensus_state) => consensus_state.client_type(),
        }
    }

    /// Time of the consensus state in nanoseconds.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::SoloMachine(consensus_state) => consensus_state.timestamp(),
            Self::Tendermint(consensus_state) => consensus_state.timestamp(),
        }
    }

    /// Checks the structural validity of the consensus state.
    ///
    /// # Errors
    /// Returns the validation error of the underlying client.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        match self {
            Self::SoloMachine(consensus_state) => consensus_state.validate_basic(),
            Self::Tendermint(consensus_state) => consensus_state.validate_basic(),
        }
    }
}

/// A header of any client type that accepts headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyHeader {
    /// Solo machine header
    SoloMachine(solomachine::Header),
    /// Tendermint header
    Tendermint(Box<tendermint::Header>),
}

impl AnyHeader {
    /// Unpacks a header by its type url.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownTypeUrl`] for unsupported types and a decode error if
    /// the value is malformed.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        match any.type_url.as_str() {
            solomachine::proto::HEADER_TYPE_URL => {
                solomachine::Header::from_any(any).map(Self::SoloMachine)
            }
            tendermint::proto::HEADER_TYPE_URL => tendermint::Header::from_any(any)
                .map(Box::new)
                .map(Self::Tendermint),
            type_url => Err(ClientError::UnknownTypeUrl {
                type_url: type_url.to_string(),
            }),
        }
    }

    /// Short type tag.
    #[must_use]
    pub fn client_type(&self) -> &'static str {
        match self {
            Self::SoloMachine(header) => header.client_type(),
            Self::Tendermint(header) => header.client_type(),
        }
    }

    /// Height of the header.
    #[must_use]
    pub fn height(&self) -> Height {
        match self {
            Self::SoloMachine(header) => header.height(),
            Self::Tendermint(header) => header.height(),
        }
    }

    /// Checks the structural validity of the header.
    ///
    /// # Errors
    /// Returns the validation error of the underlying client.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        match self {
            Self::SoloMachine(header) => header.validate_basic(),
            Self::Tendermint(header) => header.validate_basic(),
        }
    }
}

/// Misbehaviour evidence against any client type that can be frozen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyMisbehaviour {
    /// Solo machine misbehaviour
    SoloMachine(solomachine::Misbehaviour),
    /// Tendermint misbehaviour
    Tendermint(Box<tendermint::Misbehaviour>),
}

impl AnyMisbehaviour {
    /// Unpacks misbehaviour by its type url.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownTypeUrl`] for unsupported types and a decode error if
    /// the value is malformed.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        match any.type_url.as_str() {
            solomachine::proto::MISBEHAVIOUR_TYPE_URL => {
                solomachine::Misbehaviour::from_any(any).map(Self::SoloMachine)
            }
            tendermint::proto::MISBEHAVIOUR_TYPE_URL => tendermint::Misbehaviour::from_any(any)
                .map(Box::new)
                .map(Self::Tendermint),
            type_url => Err(ClientError::UnknownTypeUrl {
                type_url: type_url.to_string(),
            }),
        }
    }

    /// Short type tag.
    #[must_use]
    pub fn client_type(&self) -> &'static str {
        match self {
            Self::SoloMachine(misbehaviour) => misbehaviour.client_type(),
            Self::Tendermint(misbehaviour) => misbehaviour.client_type(),
        }
    }

    /// Client the evidence is submitted against.
    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::SoloMachine(misbehaviour) => misbehaviour.client_id(),
            Self::Tendermint(misbehaviour) => misbehaviour.client_id(),
        }
    }

    /// Height at which the misbehaviour happened.
    #[must_use]
    pub fn height(&self) -> Height {
        match self {
            Self::SoloMachine(misbehaviour) => misbehaviour.height(),
            Self::Tendermint(misbehaviour) => misbehaviour.height(),
        }
    }

    /// Checks the structural validity of the evidence.
    ///
    /// # Errors
    /// Returns the validation error of the underlying client.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        match self {
            Self::SoloMachine(misbehaviour) => misbehaviour.validate_basic(),
            Self::Tendermint(misbehaviour) => misbehaviour.validate_basic(),
        }
    }
}
