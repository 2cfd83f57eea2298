//! `ibc.lightclients.tendermint.v1` wire types
#![allow(missing_docs, clippy::derive_partial_eq_without_eq)]

use ibc_light_client_core::{ics23::ProofSpec, proto::RawHeight};
use tendermint_proto::{
    google::protobuf::{Duration, Timestamp},
    v0_38::types::{SignedHeader, ValidatorSet},
};

/// Type url of the tendermint client state.
pub const CLIENT_STATE_TYPE_URL: &str = "/ibc.lightclients.tendermint.v1.ClientState";
/// Type url of the tendermint consensus state.
pub const CONSENSUS_STATE_TYPE_URL: &str = "/ibc.lightclients.tendermint.v1.ConsensusState";
/// Type url of the tendermint header.
pub const HEADER_TYPE_URL: &str = "/ibc.lightclients.tendermint.v1.Header";
/// Type url of the tendermint misbehaviour.
pub const MISBEHAVIOUR_TYPE_URL: &str = "/ibc.lightclients.tendermint.v1.Misbehaviour";

/// `ClientState`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawClientState {
    #[prost(string, tag = "1")]
    pub chain_id: String,
    #[prost(message, optional, tag = "2")]
    pub trust_level: Option<RawFraction>,
    #[prost(message, optional, tag = "3")]
    pub trusting_period: Option<Duration>,
    #[prost(message, optional, tag = "4")]
    pub unbonding_period: Option<Duration>,
    #[prost(message, optional, tag = "5")]
    pub max_clock_drift: Option<Duration>,
    #[prost(message, optional, tag = "6")]
    pub frozen_height: Option<RawHeight>,
    #[prost(message, optional, tag = "7")]
    pub latest_height: Option<RawHeight>,
    #[prost(message, repeated, tag = "8")]
    pub proof_specs: Vec<ProofSpec>,
    #[prost(string, repeated, tag = "9")]
    pub upgrade_path: Vec<String>,
    #[prost(bool, tag = "10")]
    pub allow_update_after_expiry: bool,
    #[prost(bool, tag = "11")]
    pub allow_update_after_misbehaviour: bool,
}

/// `Fraction`
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct RawFraction {
    #[prost(uint64, tag = "1")]
    pub numerator: u64,
    #[prost(uint64, tag = "2")]
    pub denominator: u64,
}

/// `ibc.core.commitment.v1.MerkleRoot`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RawMerkleRoot {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: Vec<u8>,
}

/// `ConsensusState`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawConsensusState {
    #[prost(message, optional, tag = "1")]
    pub timestamp: Option<Timestamp>,
    #[prost(message, optional, tag = "2")]
    pub root: Option<RawMerkleRoot>,
    #[prost(bytes = "vec", tag = "3")]
    pub next_validators_hash: Vec<u8>,
}

/// `Header`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawHeader {
    #[prost(message, optional, tag = "1")]
    pub signed_header: Option<SignedHeader>,
    #[prost(message, optional, tag = "2")]
    pub validator_set: Option<ValidatorSet>,
    #[prost(message, optional, tag = "3")]
    pub trusted_height: Option<RawHeight>,
    #[prost(message, optional, tag = "4")]
    pub trusted_validators: Option<ValidatorSet>,
}

/// `Misbehaviour`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawMisbehaviour {
    #[prost(string, tag = "1")]
    pub client_id: String,
    #[prost(message, optional, tag = "2")]
    pub header_1: Option<RawHeader>,
    #[prost(message, optional, tag = "3")]
    pub header_2: Option<RawHeader>,
}
