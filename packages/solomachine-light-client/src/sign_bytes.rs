//! Canonical sign bytes
//!
//! The solo machine produces and the client verifies signatures over exactly these bytes,
//! so both sides must go through the functions in this module.

use ibc_light_client_core::{
    client::CommitmentTarget, commitment::MerklePath, crypto::PublicKey, Any, ClientError,
};
use prost::Message;

use crate::proto::{
    DataType, RawChannelStateData, RawClientStateData, RawConnectionStateData,
    RawConsensusStateData, RawHeaderData, RawNextSequenceRecvData,
    RawPacketAcknowledgementData, RawPacketCommitmentData, RawPacketReceiptAbsenceData,
    RawSignBytes,
};

/// The typed payload of a solo machine signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignData {
    /// Key rotation
    Header {
        /// Key that signs from the next sequence on
        new_public_key: PublicKey,
        /// Diversifier used from the next sequence on
        new_diversifier: String,
    },
    /// A client state committed under `path`
    ClientState {
        /// Prefixed path
        path: Vec<u8>,
        /// Packed client state
        client_state: Any,
    },
    /// A consensus state committed under `path`
    ConsensusState {
        /// Prefixed path
        path: Vec<u8>,
        /// Packed consensus state
        consensus_state: Any,
    },
    /// An encoded connection end committed under `path`
    Connection {
        /// Prefixed path
        path: Vec<u8>,
        /// Encoded connection end
        connection: Vec<u8>,
    },
    /// An encoded channel end committed under `path`
    Channel {
        /// Prefixed path
        path: Vec<u8>,
        /// Encoded channel end
        channel: Vec<u8>,
    },
    /// A packet commitment committed under `path`
    PacketCommitment {
        /// Prefixed path
        path: Vec<u8>,
        /// Commitment bytes
        commitment: Vec<u8>,
    },
    /// A packet acknowledgement committed under `path`
    PacketAcknowledgement {
        /// Prefixed path
        path: Vec<u8>,
        /// Acknowledgement bytes
        acknowledgement: Vec<u8>,
    },
    /// Nothing committed under `path`
    PacketReceiptAbsence {
        /// Prefixed path
        path: Vec<u8>,
    },
    /// A next receive sequence committed under `path`
    NextSequenceRecv {
        /// Prefixed path
        path: Vec<u8>,
        /// Next receive sequence
        next_seq_recv: u64,
    },
}

impl SignData {
    /// Builds the payload proving `target` at the prefixed `path`.
    #[must_use]
    pub fn from_target(path: &MerklePath, target: &CommitmentTarget) -> Self {
        let path = path.to_string().into_bytes();
        match target.clone() {
            CommitmentTarget::ClientState { client_state, .. } => {
                Self::ClientState { path, client_state }
            }
            CommitmentTarget::ConsensusState {
                consensus_state, ..
            } => Self::ConsensusState {
                path,
                consensus_state,
            },
            CommitmentTarget::Connection { connection_end, .. } => Self::Connection {
                path,
                connection: connection_end,
            },
            CommitmentTarget::Channel { channel_end, .. } => Self::Channel {
                path,
                channel: channel_end,
            },
            CommitmentTarget::PacketCommitment { commitment, .. } => {
                Self::PacketCommitment { path, commitment }
            }
            CommitmentTarget::PacketAcknowledgement {
                acknowledgement, ..
            } => Self::PacketAcknowledgement {
                path,
                acknowledgement,
            },
            CommitmentTarget::PacketReceiptAbsence { .. } => Self::PacketReceiptAbsence { path },
            CommitmentTarget::NextSequenceRecv {
                next_sequence_recv, ..
            } => Self::NextSequenceRecv {
                path,
                next_seq_recv: next_sequence_recv,
            },
        }
    }

    /// The data type tag of the payload.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Header { .. } => DataType::Header,
            Self::ClientState { .. } => DataType::Client,
            Self::ConsensusState { .. } => DataType::Consensus,
            Self::Connection { .. } => DataType::Connection,
            Self::Channel { .. } => DataType::Channel,
            Self::PacketCommitment { .. } => DataType::PacketCommitment,
            Self::PacketAcknowledgement { .. } => DataType::PacketAcknowledgement,
            Self::PacketReceiptAbsence { .. } => DataType::PacketReceiptAbsence,
            Self::NextSequenceRecv { .. } => DataType::NextSequenceRecv,
        }
    }

    /// Encodes the payload into its protobuf bytes.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        match self.clone() {
            Self::Header {
                new_public_key,
                new_diversifier,
            } => RawHeaderData {
                new_pub_key: Some(new_public_key.to_any()),
                new_diversifier,
            }
            .encode_to_vec(),
            Self::ClientState { path, client_state } => RawClientStateData {
                path,
                client_state: Some(client_state),
            }
            .encode_to_vec(),
            Self::ConsensusState {
                path,
                consensus_state,
            } => RawConsensusStateData {
                path,
                consensus_state: Some(consensus_state),
            }
            .encode_to_vec(),
            Self::Connection { path, connection } => {
                RawConnectionStateData { path, connection }.encode_to_vec()
            }
            Self::Channel { path, channel } => {
                RawChannelStateData { path, channel }.encode_to_vec()
            }
            Self::PacketCommitment { path, commitment } => {
                RawPacketCommitmentData { path, commitment }.encode_to_vec()
            }
            Self::PacketAcknowledgement {
                path,
                acknowledgement,
            } => RawPacketAcknowledgementData {
                path,
                acknowledgement,
            }
            .encode_to_vec(),
            Self::PacketReceiptAbsence { path } => {
                RawPacketReceiptAbsenceData { path }.encode_to_vec()
            }
            Self::NextSequenceRecv {
                path,
                next_seq_recv,
            } => RawNextSequenceRecvData {
                path,
                next_seq_recv,
            }
            .encode_to_vec(),
        }
    }

    /// Decodes `data` as the payload declared by `data_type`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidDataType`] for [`DataType::Unspecified`] and
    /// [`ClientError::Decode`] if the bytes are not the declared payload.
    pub fn decode(data_type: DataType, data: &[u8]) -> Result<Self, ClientError> {
        let data = match data_type {
            DataType::Unspecified => {
                return Err(ClientError::InvalidDataType {
                    reason: "data type cannot be UNSPECIFIED".to_string(),
                })
            }
            DataType::Header => {
                let raw = RawHeaderData::decode(data)?;
                let new_public_key = raw.new_pub_key.as_ref().ok_or_else(|| ClientError::Decode {
                    reason: "header data has no public key".to_string(),
                })?;
                Self::Header {
                    new_public_key: PublicKey::from_any(new_public_key)?,
                    new_diversifier: raw.new_diversifier,
                }
            }
            DataType::Client => {
                let raw = RawClientStateData::decode(data)?;
                Self::ClientState {
                    path: raw.path,
                    client_state: raw.client_state.unwrap_or_default(),
                }
            }
            DataType::Consensus => {
                let raw = RawConsensusStateData::decode(data)?;
                Self::ConsensusState {
                    path: raw.path,
                    consensus_state: raw.consensus_state.unwrap_or_default(),
                }
            }
            DataType::Connection => {
                let raw = RawConnectionStateData::decode(data)?;
                Self::Connection {
                    path: raw.path,
                    connection: raw.connection,
                }
            }
            DataType::Channel => {
                let raw = RawChannelStateData::decode(data)?;
                Self::Channel {
                    path: raw.path,
                    channel: raw.channel,
                }
            }
            DataType::PacketCommitment => {
                let raw = RawPacketCommitmentData::decode(data)?;
                Self::PacketCommitment {
                    path: raw.path,
                    commitment: raw.commitment,
                }
            }
            DataType::PacketAcknowledgement => {
                let raw = RawPacketAcknowledgementData::decode(data)?;
                Self::PacketAcknowledgement {
                    path: raw.path,
                    acknowledgement: raw.acknowledgement,
                }
            }
            DataType::PacketReceiptAbsence => Self::PacketReceiptAbsence {
                path: RawPacketReceiptAbsenceData::decode(data)?.path,
            },
            DataType::NextSequenceRecv => {
                let raw = RawNextSequenceRecvData::decode(data)?;
                Self::NextSequenceRecv {
                    path: raw.path,
                    next_seq_recv: raw.next_seq_recv,
                }
            }
        };
        Ok(data)
    }
}

/// Wraps encoded payload bytes into the signed envelope.
#[must_use]
pub fn sign_bytes_raw(
    sequence: u64,
    timestamp: u64,
    diversifier: &str,
    data_type: DataType,
    data: Vec<u8>,
) -> Vec<u8> {
    RawSignBytes {
        sequence,
        timestamp,
        diversifier: diversifier.to_string(),
        data_type: data_type.into(),
        data,
    }
    .encode_to_vec()
}

/// The bytes a solo machine signs for `data` at `sequence`.
#[must_use]
pub fn sign_bytes(sequence: u64, timestamp: u64, diversifier: &str, data: &SignData) -> Vec<u8> {
    sign_bytes_raw(
        sequence,
        timestamp,
        diversifier,
        data.data_type(),
        data.encode_to_vec(),
    )
}
