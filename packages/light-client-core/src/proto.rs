//! Protobuf wire types shared by the light clients
#![allow(clippy::derive_partial_eq_without_eq)]

pub use ibc_proto::ibc::core::client::v1::Height as RawHeight;
use prost::Message;

use crate::{error::ClientError, Any};

/// Type url of a secp256k1 public key.
pub const SECP256K1_PUB_KEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
/// Type url of an ed25519 public key.
pub const ED25519_PUB_KEY_TYPE_URL: &str = "/cosmos.crypto.ed25519.PubKey";
/// Type url of a legacy amino threshold multisig public key.
pub const MULTISIG_PUB_KEY_TYPE_URL: &str = "/cosmos.crypto.multisig.LegacyAminoPubKey";

/// `ibc.core.commitment.v1.MerkleProof`
#[derive(Clone, PartialEq, Message)]
pub struct RawMerkleProof {
    /// Proofs ordered from the innermost store to the root store
    #[prost(message, repeated, tag = "1")]
    pub proofs: Vec<ics23::CommitmentProof>,
}

/// `cosmos.crypto.secp256k1.PubKey` and `cosmos.crypto.ed25519.PubKey`
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RawPubKey {
    /// Raw key bytes
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

/// `cosmos.crypto.multisig.LegacyAminoPubKey`
#[derive(Clone, PartialEq, Message)]
pub struct RawLegacyAminoPubKey {
    /// Number of signatures required
    #[prost(uint32, tag = "1")]
    pub threshold: u32,
    /// Packed member keys
    #[prost(message, repeated, tag = "2")]
    pub public_keys: Vec<Any>,
}

/// `cosmos.crypto.multisig.v1beta1.CompactBitArray`
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RawCompactBitArray {
    /// Number of meaningful bits in the last byte, 0 meaning all eight
    #[prost(uint32, tag = "1")]
    pub extra_bits_stored: u32,
    /// Bits, most significant first
    #[prost(bytes = "vec", tag = "2")]
    pub elems: Vec<u8>,
}

/// `cosmos.tx.signing.v1beta1.SignatureDescriptor.Data`
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RawSignatureData {
    /// Single or multi signature payload
    #[prost(oneof = "raw_signature_data::Sum", tags = "1, 2")]
    pub sum: Option<raw_signature_data::Sum>,
}

/// Nested types of [`RawSignatureData`]
pub mod raw_signature_data {
    use super::RawCompactBitArray;

    /// `SignatureDescriptor.Data.Single`
    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Single {
        /// Sign mode
        #[prost(int32, tag = "1")]
        pub mode: i32,
        /// Raw signature
        #[prost(bytes = "vec", tag = "2")]
        pub signature: Vec<u8>,
    }

    /// `SignatureDescriptor.Data.Multi`
    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Multi {
        /// Which member keys signed
        #[prost(message, optional, tag = "1")]
        pub bitarray: Option<RawCompactBitArray>,
        /// Signatures of the members that signed, in key order
        #[prost(message, repeated, tag = "2")]
        pub signatures: Vec<super::RawSignatureData>,
    }

    /// The signature payload
    #[derive(Clone, PartialEq, Eq, ::prost::Oneof)]
    pub enum Sum {
        /// Single signer
        #[prost(message, tag = "1")]
        Single(Single),
        /// Threshold multisig
        #[prost(message, tag = "2")]
        Multi(Multi),
    }
}

/// Encodes a message into an [`Any`] under the given type url.
#[must_use]
pub fn to_any<M: Message>(type_url: &str, msg: &M) -> Any {
    Any {
        type_url: type_url.to_string(),
        value: msg.encode_to_vec(),
    }
}

/// Decodes the value of an [`Any`] after checking its type url.
///
/// # Errors
/// Returns [`ClientError::UnknownTypeUrl`] on a type url mismatch and
/// [`ClientError::Decode`] if the value does not decode.
pub fn decode_any<M: Message + Default>(any: &Any, type_url: &str) -> Result<M, ClientError> {
    if any.type_url != type_url {
        return Err(ClientError::UnknownTypeUrl {
            type_url: any.type_url.clone(),
        });
    }
    Ok(M::decode(any.value.as_slice())?)
}
