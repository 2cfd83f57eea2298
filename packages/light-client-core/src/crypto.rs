//! Public keys and signature verification for single and threshold signers

use ed25519_dalek::Verifier as _;
use prost::Message;

use crate::{
    error::ClientError,
    proto::{
        decode_any, raw_signature_data, to_any, RawCompactBitArray, RawLegacyAminoPubKey,
        RawPubKey, RawSignatureData, ED25519_PUB_KEY_TYPE_URL, MULTISIG_PUB_KEY_TYPE_URL,
        SECP256K1_PUB_KEY_TYPE_URL,
    },
    Any,
};

/// Sign mode used for direct signatures.
pub const SIGN_MODE_DIRECT: i32 = 1;
/// Sign mode used for legacy amino multisig members.
pub const SIGN_MODE_LEGACY_AMINO_JSON: i32 = 127;

/// A public key able to verify signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// Compressed SEC1 secp256k1 key
    Secp256k1(Vec<u8>),
    /// 32 byte ed25519 key
    Ed25519(Vec<u8>),
    /// Threshold multisig over member keys
    Multisig {
        /// Number of member signatures required
        threshold: u32,
        /// Member keys, in bit array order
        public_keys: Vec<PublicKey>,
    },
}

impl PublicKey {
    /// Packs the key into an [`Any`].
    #[must_use]
    pub fn to_any(&self) -> Any {
        match self {
            Self::Secp256k1(key) => {
                to_any(SECP256K1_PUB_KEY_TYPE_URL, &RawPubKey { key: key.clone() })
            }
            Self::Ed25519(key) => to_any(ED25519_PUB_KEY_TYPE_URL, &RawPubKey { key: key.clone() }),
            Self::Multisig {
                threshold,
                public_keys,
            } => to_any(
                MULTISIG_PUB_KEY_TYPE_URL,
                &RawLegacyAminoPubKey {
                    threshold: *threshold,
                    public_keys: public_keys.iter().map(Self::to_any).collect(),
                },
            ),
        }
    }

    /// Unpacks a key from an [`Any`].
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownTypeUrl`] for unsupported key types and
    /// [`ClientError::Decode`] for malformed values.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        match any.type_url.as_str() {
            SECP256K1_PUB_KEY_TYPE_URL => Ok(Self::Secp256k1(
                decode_any::<RawPubKey>(any, SECP256K1_PUB_KEY_TYPE_URL)?.key,
            )),
            ED25519_PUB_KEY_TYPE_URL => Ok(Self::Ed25519(
                decode_any::<RawPubKey>(any, ED25519_PUB_KEY_TYPE_URL)?.key,
            )),
            MULTISIG_PUB_KEY_TYPE_URL => {
                let raw: RawLegacyAminoPubKey = decode_any(any, MULTISIG_PUB_KEY_TYPE_URL)?;
                Ok(Self::Multisig {
                    threshold: raw.threshold,
                    public_keys: raw
                        .public_keys
                        .iter()
                        .map(Self::from_any)
                        .collect::<Result<_, _>>()?,
                })
            }
            other => Err(ClientError::UnknownTypeUrl {
                type_url: other.to_string(),
            }),
        }
    }

    fn verify_single(&self, msg: &[u8], signature: &[u8]) -> Result<(), ClientError> {
        let failed = |reason: String| ClientError::SignatureVerificationFailed { reason };

        match self {
            Self::Secp256k1(key) => {
                let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key)
                    .map_err(|e| failed(format!("invalid secp256k1 public key: {e}")))?;
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| failed(format!("invalid secp256k1 signature: {e}")))?;
                // only the lower-S form is canonical
                if signature.normalize_s().is_some() {
                    return Err(failed("secp256k1 signature is not in lower-S form".to_string()));
                }
                verifying_key
                    .verify(msg, &signature)
                    .map_err(|e| failed(format!("secp256k1 signature does not verify: {e}")))
            }
            Self::Ed25519(key) => {
                let verifying_key = ed25519_dalek::VerifyingKey::try_from(key.as_slice())
                    .map_err(|e| failed(format!("invalid ed25519 public key: {e}")))?;
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| failed(format!("invalid ed25519 signature: {e}")))?;
                verifying_key
                    .verify(msg, &signature)
                    .map_err(|e| failed(format!("ed25519 signature does not verify: {e}")))
            }
            Self::Multisig { .. } => Err(failed(
                "single signature supplied for a multisig public key".to_string(),
            )),
        }
    }
}

/// Bit array marking which members of a multisig signed, most significant bit first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactBitArray {
    /// Number of meaningful bits in the last byte, 0 meaning all eight
    pub extra_bits_stored: u32,
    /// Packed bits
    pub elems: Vec<u8>,
}

impl CompactBitArray {
    /// Creates an all-false array of `bits` bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(bits: usize) -> Self {
        Self {
            extra_bits_stored: (bits % 8) as u32,
            elems: vec![0; bits.div_ceil(8)],
        }
    }

    /// Number of bits in the array.
    #[must_use]
    pub fn count(&self) -> usize {
        if self.extra_bits_stored == 0 {
            self.elems.len() * 8
        } else {
            (self.elems.len().saturating_sub(1)) * 8 + self.extra_bits_stored as usize
        }
    }

    /// Returns the bit at `index`, false when out of range.
    #[must_use]
    pub fn get_index(&self, index: usize) -> bool {
        if index >= self.count() {
            return false;
        }
        self.elems
            .get(index >> 3)
            .is_some_and(|byte| byte & (1 << (7 - index % 8)) > 0)
    }

    /// Sets the bit at `index`. Returns false when out of range.
    pub fn set_index(&mut self, index: usize, value: bool) -> bool {
        if index >= self.count() {
            return false;
        }
        let mask = 1 << (7 - index % 8);
        let Some(byte) = self.elems.get_mut(index >> 3) else {
            return false;
        };
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        true
    }

    /// Number of set bits strictly before `index`.
    #[must_use]
    pub fn num_true_bits_before(&self, index: usize) -> usize {
        (0..index.min(self.count()))
            .filter(|&i| self.get_index(i))
            .count()
    }
}

impl From<RawCompactBitArray> for CompactBitArray {
    fn from(raw: RawCompactBitArray) -> Self {
        Self {
            extra_bits_stored: raw.extra_bits_stored,
            elems: raw.elems,
        }
    }
}

impl From<CompactBitArray> for RawCompactBitArray {
    fn from(bits: CompactBitArray) -> Self {
        Self {
            extra_bits_stored: bits.extra_bits_stored,
            elems: bits.elems,
        }
    }
}

/// A signature produced by a single key or a multisig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureData {
    /// Signature by a single key
    Single {
        /// Sign mode
        mode: i32,
        /// Raw signature bytes
        signature: Vec<u8>,
    },
    /// Signatures by the members of a multisig
    Multi {
        /// Members that signed
        bit_array: CompactBitArray,
        /// Member signatures, in member order
        signatures: Vec<SignatureData>,
    },
}

impl SignatureData {
    /// Decodes signature data from its protobuf bytes.
    ///
    /// # Errors
    /// Returns [`ClientError::Decode`] if the bytes do not decode or carry no signature.
    pub fn decode(bytes: &[u8]) -> Result<Self, ClientError> {
        RawSignatureData::decode(bytes)?.try_into()
    }

    /// Encodes the signature data into protobuf bytes.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        RawSignatureData::from(self.clone()).encode_to_vec()
    }
}

impl TryFrom<RawSignatureData> for SignatureData {
    type Error = ClientError;

    fn try_from(raw: RawSignatureData) -> Result<Self, Self::Error> {
        match raw.sum {
            Some(raw_signature_data::Sum::Single(single)) => Ok(Self::Single {
                mode: single.mode,
                signature: single.signature,
            }),
            Some(raw_signature_data::Sum::Multi(multi)) => Ok(Self::Multi {
                bit_array: multi.bitarray.unwrap_or_default().into(),
                signatures: multi
                    .signatures
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            None => Err(ClientError::Decode {
                reason: "signature data is empty".to_string(),
            }),
        }
    }
}

impl From<SignatureData> for RawSignatureData {
    fn from(data: SignatureData) -> Self {
        let sum = match data {
            SignatureData::Single { mode, signature } => {
                raw_signature_data::Sum::Single(raw_signature_data::Single { mode, signature })
            }
            SignatureData::Multi {
                bit_array,
                signatures,
            } => raw_signature_data::Sum::Multi(raw_signature_data::Multi {
                bitarray: Some(bit_array.into()),
                signatures: signatures.into_iter().map(Into::into).collect(),
            }),
        };
        Self { sum: Some(sum) }
    }
}

/// Verifies `signature_data` over `sign_bytes` against `public_key`.
///
/// Single keys accept only single signatures and multisig keys accept only multi
/// signatures. Members of a multisig sign the same bytes regardless of their sign mode.
///
/// # Errors
/// Returns [`ClientError::SignatureVerificationFailed`] on a key/signature kind mismatch,
/// a malformed multisig or a signature that does not verify.
pub fn verify_signature(
    public_key: &PublicKey,
    sign_bytes: &[u8],
    signature_data: &SignatureData,
) -> Result<(), ClientError> {
    match (public_key, signature_data) {
        (PublicKey::Multisig { .. }, SignatureData::Single { .. }) => {
            Err(ClientError::SignatureVerificationFailed {
                reason: "single signature supplied for a multisig public key".to_string(),
            })
        }
        (key, SignatureData::Single { signature, .. }) => key.verify_single(sign_bytes, signature),
        (
            PublicKey::Multisig {
                threshold,
                public_keys,
            },
            SignatureData::Multi {
                bit_array,
                signatures,
            },
        ) => verify_multisig(*threshold, public_keys, sign_bytes, bit_array, signatures),
        (_, SignatureData::Multi { .. }) => Err(ClientError::SignatureVerificationFailed {
            reason: "multi signature supplied for a single public key".to_string(),
        }),
    }
}

fn verify_multisig(
    threshold: u32,
    public_keys: &[PublicKey],
    sign_bytes: &[u8],
    bit_array: &CompactBitArray,
    signatures: &[SignatureData],
) -> Result<(), ClientError> {
    let failed = |reason: String| Err(ClientError::SignatureVerificationFailed { reason });
    let threshold = threshold as usize;
    let size = bit_array.count();

    if public_keys.len() != size {
        return failed(format!(
            "bit array size is incorrect, expected: {}, got: {size}",
            public_keys.len()
        ));
    }
    if signatures.len() < threshold || signatures.len() > size {
        return failed(format!(
            "signature size is incorrect, expected between {threshold} and {size}, got: {}",
            signatures.len()
        ));
    }
    if bit_array.num_true_bits_before(size) < threshold {
        return failed(format!(
            "not enough signatures set, have {}, expected at least {threshold}",
            bit_array.num_true_bits_before(size)
        ));
    }

    let mut signatures = signatures.iter();
    for (index, key) in public_keys.iter().enumerate() {
        if !bit_array.get_index(index) {
            continue;
        }
        let Some(signature) = signatures.next() else {
            return failed(format!("missing signature for multisig member {index}"));
        };
        verify_signature(key, sign_bytes, signature)?;
    }
    Ok(())
}
