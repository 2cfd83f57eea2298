//! Error types for the light clients

use thiserror::Error;

use crate::height::Height;

/// Error returned by every light client operation.
///
/// The variants mirror the error kinds a host maps onto its external error codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Malformed or out of range height
    #[error("Invalid height: {reason}")]
    InvalidHeight {
        /// Reason for error
        reason: String,
    },

    /// Malformed chain identifier
    #[error("Invalid chain id: {reason}")]
    InvalidChainId {
        /// Reason for error
        reason: String,
    },

    /// Malformed client identifier
    #[error("Invalid client identifier: {reason}")]
    InvalidClientId {
        /// Reason for error
        reason: String,
    },

    /// Client state failed validation or cannot be used
    #[error("Invalid client: {reason}")]
    InvalidClient {
        /// Reason for error
        reason: String,
    },

    /// Value of the wrong client variant was supplied
    #[error("Invalid client type: {reason}")]
    InvalidClientType {
        /// Reason for error
        reason: String,
    },

    /// Client is frozen
    #[error("Client is frozen")]
    ClientFrozen,

    /// A governance driven update could not be applied
    #[error("Update client failed: {reason}")]
    UpdateClientFailed {
        /// Reason for error
        reason: String,
    },

    /// Invalid header
    #[error("Invalid header: {reason}")]
    InvalidHeader {
        /// Reason for error
        reason: String,
    },

    /// Invalid misbehaviour evidence
    #[error("Invalid misbehaviour: {reason}")]
    InvalidMisbehaviour {
        /// Reason for error
        reason: String,
    },

    /// Consensus state failed validation
    #[error("Invalid consensus state: {reason}")]
    InvalidConsensus {
        /// Reason for error
        reason: String,
    },

    /// No consensus state stored at the requested height
    #[error("Consensus state not found at height {height}")]
    ConsensusStateNotFound {
        /// Requested height
        height: Height,
    },

    /// Bad proof provided
    #[error("Proof invalid: {reason}")]
    InvalidProof {
        /// Reason for error
        reason: String,
    },

    /// Bad commitment prefix provided
    #[error("Invalid prefix: {reason}")]
    InvalidPrefix {
        /// Reason for error
        reason: String,
    },

    /// Signature did not verify against the public key
    #[error("Signature verification failed: {reason}")]
    SignatureVerificationFailed {
        /// Reason for error
        reason: String,
    },

    /// The trusted consensus state is older than the trusting period
    #[error("Trusting period expired: {reason}")]
    TrustingPeriodExpired {
        /// Reason for error
        reason: String,
    },

    /// The unbonding period has passed
    #[error("Unbonding period expired: {reason}")]
    UnbondingPeriodExpired {
        /// Reason for error
        reason: String,
    },

    /// The packet delay period has not passed yet
    #[error("Delay period not passed: {reason}")]
    DelayPeriodNotPassed {
        /// Reason for error
        reason: String,
    },

    /// Upgrade is not possible or the upgrade proof is malformed
    #[error("Invalid upgrade client: {reason}")]
    InvalidUpgradeClient {
        /// Reason for error
        reason: String,
    },

    /// Substitute client cannot replace the subject
    #[error("Invalid substitute: {reason}")]
    InvalidSubstitute {
        /// Reason for error
        reason: String,
    },

    /// Unknown or unspecified sign-bytes data type
    #[error("Invalid data type: {reason}")]
    InvalidDataType {
        /// Reason for error
        reason: String,
    },

    /// Malformed signature and data pair
    #[error("Invalid signature and data: {reason}")]
    InvalidSignatureAndData {
        /// Reason for error
        reason: String,
    },

    /// Validator set does not match the trusted hash
    #[error("Invalid validator set: {reason}")]
    InvalidValidatorSet {
        /// Reason for error
        reason: String,
    },

    /// No processed time stored for the height
    #[error("Processed time not found at height {height}")]
    ProcessedTimeNotFound {
        /// Requested height
        height: Height,
    },

    /// No client stored under the identifier
    #[error("Client {client_id} not found")]
    ClientNotFound {
        /// Client identifier
        client_id: String,
    },

    /// A client already exists under the identifier
    #[error("Client {client_id} already exists")]
    ClientExists {
        /// Client identifier
        client_id: String,
    },

    /// The any-value carries a type url no registered client understands
    #[error("Unknown type url {type_url}")]
    UnknownTypeUrl {
        /// The offending type url
        type_url: String,
    },

    /// Protobuf decoding failed
    #[error("Decoding failed: {reason}")]
    Decode {
        /// Reason for error
        reason: String,
    },

    /// Message signer is not a valid address
    #[error("Invalid signer: {reason}")]
    InvalidSigner {
        /// Reason for error
        reason: String,
    },

    /// Params failed validation
    #[error("Invalid params: {reason}")]
    InvalidParams {
        /// Reason for error
        reason: String,
    },

    /// Genesis state failed validation
    #[error("Invalid genesis: {reason}")]
    InvalidGenesis {
        /// Reason for error
        reason: String,
    },
}

impl From<prost::DecodeError> for ClientError {
    fn from(err: prost::DecodeError) -> Self {
        Self::Decode {
            reason: err.to_string(),
        }
    }
}
