//! `ibc.lightclients.solomachine.v1` wire types
#![allow(missing_docs, clippy::derive_partial_eq_without_eq)]

use ibc_light_client_core::Any;

/// Type url of the solo machine client state.
pub const CLIENT_STATE_TYPE_URL: &str = "/ibc.lightclients.solomachine.v1.ClientState";
/// Type url of the solo machine consensus state.
pub const CONSENSUS_STATE_TYPE_URL: &str = "/ibc.lightclients.solomachine.v1.ConsensusState";
/// Type url of the solo machine header.
pub const HEADER_TYPE_URL: &str = "/ibc.lightclients.solomachine.v1.Header";
/// Type url of the solo machine misbehaviour.
pub const MISBEHAVIOUR_TYPE_URL: &str = "/ibc.lightclients.solomachine.v1.Misbehaviour";

/// `ClientState`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawClientState {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub frozen_sequence: u64,
    #[prost(message, optional, tag = "3")]
    pub consensus_state: Option<RawConsensusState>,
    #[prost(bool, tag = "4")]
    pub allow_update_after_proposal: bool,
}

/// `ConsensusState`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawConsensusState {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(string, tag = "2")]
    pub diversifier: String,
    #[prost(uint64, tag = "3")]
    pub timestamp: u64,
}

/// `Header`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawHeader {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub new_public_key: Option<Any>,
    #[prost(string, tag = "5")]
    pub new_diversifier: String,
}

/// `Misbehaviour`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawMisbehaviour {
    #[prost(string, tag = "1")]
    pub client_id: String,
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
    #[prost(message, optional, tag = "3")]
    pub signature_one: Option<RawSignatureAndData>,
    #[prost(message, optional, tag = "4")]
    pub signature_two: Option<RawSignatureAndData>,
}

/// `SignatureAndData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawSignatureAndData {
    #[prost(bytes = "vec", tag = "1")]
    pub signature: Vec<u8>,
    #[prost(enumeration = "DataType", tag = "2")]
    pub data_type: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub timestamp: u64,
}

/// `TimestampedSignatureData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawTimestampedSignatureData {
    #[prost(bytes = "vec", tag = "1")]
    pub signature_data: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
}

/// `SignBytes`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawSignBytes {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    #[prost(string, tag = "3")]
    pub diversifier: String,
    #[prost(enumeration = "DataType", tag = "4")]
    pub data_type: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub data: Vec<u8>,
}

/// Kind of data a solo machine signature commits to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    /// Default zero value, never valid
    Unspecified = 0,
    /// Client state
    Client = 1,
    /// Consensus state
    Consensus = 2,
    /// Connection end
    Connection = 3,
    /// Channel end
    Channel = 4,
    /// Packet commitment
    PacketCommitment = 5,
    /// Packet acknowledgement
    PacketAcknowledgement = 6,
    /// Packet receipt absence
    PacketReceiptAbsence = 7,
    /// Next sequence to receive
    NextSequenceRecv = 8,
    /// Header
    Header = 9,
}

/// `HeaderData`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawHeaderData {
    #[prost(message, optional, tag = "1")]
    pub new_pub_key: Option<Any>,
    #[prost(string, tag = "2")]
    pub new_diversifier: String,
}

/// `ClientStateData`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawClientStateData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub client_state: Option<Any>,
}

/// `ConsensusStateData`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawConsensusStateData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub consensus_state: Option<Any>,
}

/// `ConnectionStateData`; the connection end is carried already encoded
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawConnectionStateData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub connection: Vec<u8>,
}

/// `ChannelStateData`; the channel end is carried already encoded
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawChannelStateData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub channel: Vec<u8>,
}

/// `PacketCommitmentData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawPacketCommitmentData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub commitment: Vec<u8>,
}

/// `PacketAcknowledgementData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawPacketAcknowledgementData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub acknowledgement: Vec<u8>,
}

/// `PacketReceiptAbsenceData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawPacketReceiptAbsenceData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
}

/// `NextSequenceRecvData`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawNextSequenceRecvData {
    #[prost(bytes = "vec", tag = "1")]
    pub path: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub next_seq_recv: u64,
}
