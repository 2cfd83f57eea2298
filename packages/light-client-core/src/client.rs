//! The contract every light client variant fulfils

use std::fmt;

use ics23::ProofSpec;
use serde::{Deserialize, Serialize};

use crate::{
    commitment::MerkleRoot,
    error::ClientError,
    height::Height,
    path::{
        channel_path, client_state_path, connection_path, consensus_state_path,
        next_sequence_recv_path, packet_acknowledgement_path, packet_commitment_path,
        packet_receipt_path,
    },
    Any,
};

/// Operations shared by every client state.
pub trait ClientStateCommon: Sized {
    /// Short type tag, e.g. `07-tendermint`
    fn client_type(&self) -> &'static str;

    /// Latest height the client has verified
    fn latest_height(&self) -> Height;

    /// Height at which the client was frozen, zero when it is not frozen
    fn frozen_height(&self) -> Height;

    /// Returns true if misbehaviour froze the client
    fn is_frozen(&self) -> bool {
        !self.frozen_height().is_zero()
    }

    /// Checks the structural validity of the client parameters.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidClient`] or a variant specific error on invalid fields.
    fn validate(&self) -> Result<(), ClientError>;

    /// Proof specs used to check Merkle proofs, innermost store first
    fn proof_specs(&self) -> Vec<ProofSpec>;

    /// Returns a copy with every client-chosen parameter cleared
    #[must_use]
    fn zero_custom_fields(&self) -> Self;

    /// Packs the client state
    fn to_any(&self) -> Any;
}

/// Operations shared by every consensus state.
pub trait ConsensusStateCommon {
    /// Short type tag
    fn client_type(&self) -> &'static str;

    /// Commitment root, empty for clients that do not commit to a tree
    fn root(&self) -> MerkleRoot;

    /// Timestamp in nanoseconds since the unix epoch
    fn timestamp(&self) -> u64;

    /// Checks the structural validity of the consensus state.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidConsensus`] on invalid fields.
    fn validate_basic(&self) -> Result<(), ClientError>;

    /// Packs the consensus state
    fn to_any(&self) -> Any;
}

/// Operations shared by every header.
pub trait HeaderCommon {
    /// Short type tag
    fn client_type(&self) -> &'static str;

    /// Height the header attests to
    fn height(&self) -> Height;

    /// Checks the structural validity of the header.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidHeader`] on invalid fields.
    fn validate_basic(&self) -> Result<(), ClientError>;

    /// Packs the header
    fn to_any(&self) -> Any;
}

/// Operations shared by every misbehaviour.
pub trait MisbehaviourCommon {
    /// Short type tag
    fn client_type(&self) -> &'static str;

    /// Client the evidence is submitted against
    fn client_id(&self) -> &str;

    /// Height at which the misbehaviour happened
    fn height(&self) -> Height;

    /// Checks the structural validity of the evidence.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidMisbehaviour`] on invalid fields.
    fn validate_basic(&self) -> Result<(), ClientError>;

    /// Packs the misbehaviour
    fn to_any(&self) -> Any;
}

/// A value a counterparty committed to, with the identifiers that locate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitmentTarget {
    /// The counterparty's client state for one of its clients
    ClientState {
        /// Client identifier on the counterparty
        client_id: String,
        /// Packed client state
        client_state: Any,
    },
    /// The counterparty's consensus state for one of its clients
    ConsensusState {
        /// Client identifier on the counterparty
        client_id: String,
        /// Height of the consensus state
        consensus_height: Height,
        /// Packed consensus state
        consensus_state: Any,
    },
    /// A connection end
    Connection {
        /// Connection identifier
        connection_id: String,
        /// Encoded connection end
        connection_end: Vec<u8>,
    },
    /// A channel end
    Channel {
        /// Port identifier
        port_id: String,
        /// Channel identifier
        channel_id: String,
        /// Encoded channel end
        channel_end: Vec<u8>,
    },
    /// A packet commitment
    PacketCommitment {
        /// Port identifier
        port_id: String,
        /// Channel identifier
        channel_id: String,
        /// Packet sequence
        sequence: u64,
        /// Commitment bytes
        commitment: Vec<u8>,
    },
    /// A packet acknowledgement
    PacketAcknowledgement {
        /// Port identifier
        port_id: String,
        /// Channel identifier
        channel_id: String,
        /// Packet sequence
        sequence: u64,
        /// Acknowledgement bytes
        acknowledgement: Vec<u8>,
    },
    /// The absence of a packet receipt
    PacketReceiptAbsence {
        /// Port identifier
        port_id: String,
        /// Channel identifier
        channel_id: String,
        /// Packet sequence
        sequence: u64,
    },
    /// The next sequence to receive on a channel
    NextSequenceRecv {
        /// Port identifier
        port_id: String,
        /// Channel identifier
        channel_id: String,
        /// Next receive sequence
        next_sequence_recv: u64,
    },
}

impl CommitmentTarget {
    /// The host path the value is committed under.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::ClientState { client_id, .. } => client_state_path(client_id),
            Self::ConsensusState {
                client_id,
                consensus_height,
                ..
            } => consensus_state_path(client_id, *consensus_height),
            Self::Connection { connection_id, .. } => connection_path(connection_id),
            Self::Channel {
                port_id,
                channel_id,
                ..
            } => channel_path(port_id, channel_id),
            Self::PacketCommitment {
                port_id,
                channel_id,
                sequence,
                ..
            } => packet_commitment_path(port_id, channel_id, *sequence),
            Self::PacketAcknowledgement {
                port_id,
                channel_id,
                sequence,
                ..
            } => packet_acknowledgement_path(port_id, channel_id, *sequence),
            Self::PacketReceiptAbsence {
                port_id,
                channel_id,
                sequence,
            } => packet_receipt_path(port_id, channel_id, *sequence),
            Self::NextSequenceRecv {
                port_id,
                channel_id,
                ..
            } => next_sequence_recv_path(port_id, channel_id),
        }
    }

    /// Returns true for the packet-level targets subject to a delay period.
    #[must_use]
    pub const fn is_packet(&self) -> bool {
        matches!(
            self,
            Self::PacketCommitment { .. }
                | Self::PacketAcknowledgement { .. }
                | Self::PacketReceiptAbsence { .. }
                | Self::NextSequenceRecv { .. }
        )
    }
}

/// Minimum time that must pass between storing a consensus state and using it for a
/// packet proof.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DelayPeriod {
    /// Current host time in nanoseconds
    pub current_timestamp_ns: u64,
    /// Required delay in nanoseconds
    pub delay_period_ns: u64,
}

/// The result of checking a header against a stored client.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome<C, S> {
    /// The header verified and produced a new consensus state
    Updated {
        /// Updated client state
        client_state: C,
        /// Consensus state for the header height
        consensus_state: S,
        /// Height of the new consensus state
        height: Height,
    },
    /// The header matches a consensus state that is already stored
    Unchanged,
    /// The header conflicts with stored state and the client was frozen
    Misbehaviour {
        /// Frozen client state
        client_state: C,
    },
}

/// Liveness of a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The client can be updated and used for verification
    Active,
    /// Misbehaviour froze the client
    Frozen,
    /// The latest consensus state is older than the trusting period
    Expired,
    /// The client is both frozen and expired
    FrozenAndExpired,
    /// The latest consensus state is missing
    Unknown,
}

impl Status {
    /// Combines the frozen and expired flags.
    #[must_use]
    pub const fn from_flags(frozen: bool, expired: bool) -> Self {
        match (frozen, expired) {
            (false, false) => Self::Active,
            (true, false) => Self::Frozen,
            (false, true) => Self::Expired,
            (true, true) => Self::FrozenAndExpired,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::Active => "Active",
            Self::Frozen => "Frozen",
            Self::Expired => "Expired",
            Self::FrozenAndExpired => "FrozenAndExpired",
            Self::Unknown => "Unknown",
        };
        f.write_str(status)
    }
}
