//! Solo machine header: a signed key rotation

use ibc_light_client_core::{
    client::HeaderCommon, crypto::PublicKey, proto::decode_any, Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    proto::{RawHeader, HEADER_TYPE_URL},
    SOLOMACHINE_CLIENT_TYPE,
};

/// A signed rotation to a new key and diversifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Sequence the header is signed at
    pub sequence: u64,
    /// Time of the header in nanoseconds
    pub timestamp: u64,
    /// Encoded signature data by the current key
    pub signature: Vec<u8>,
    /// Key taking over from the next sequence
    pub new_public_key: PublicKey,
    /// Diversifier taking over from the next sequence
    pub new_diversifier: String,
}

impl Header {
    /// Unpacks a header.
    ///
    /// # Errors
    /// Returns an error if the type url is not the solo machine header or the value does not
    /// decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawHeader>(any, HEADER_TYPE_URL)?.try_into()
    }
}

impl HeaderCommon for Header {
    fn client_type(&self) -> &'static str {
        SOLOMACHINE_CLIENT_TYPE
    }

    fn height(&self) -> Height {
        Height::new(0, self.sequence)
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            self.sequence != 0,
            ClientError::InvalidHeader {
                reason: "sequence cannot be 0".to_string(),
            }
        );
        ensure!(
            self.timestamp != 0,
            ClientError::InvalidHeader {
                reason: "timestamp cannot be 0".to_string(),
            }
        );
        ensure!(
            !self.signature.is_empty(),
            ClientError::InvalidHeader {
                reason: "signature cannot be empty".to_string(),
            }
        );
        ensure!(
            self.new_diversifier.is_empty() || !self.new_diversifier.trim().is_empty(),
            ClientError::InvalidHeader {
                reason: "new diversifier cannot contain only spaces".to_string(),
            }
        );
        Ok(())
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: HEADER_TYPE_URL.to_string(),
            value: RawHeader::from(self.clone()).encode_to_vec(),
        }
    }
}

impl TryFrom<RawHeader> for Header {
    type Error = ClientError;

    fn try_from(raw: RawHeader) -> Result<Self, Self::Error> {
        let new_public_key = raw
            .new_public_key
            .as_ref()
            .ok_or_else(|| ClientError::InvalidHeader {
                reason: "new public key cannot be empty".to_string(),
            })
            .and_then(PublicKey::from_any)?;
        Ok(Self {
            sequence: raw.sequence,
            timestamp: raw.timestamp,
            signature: raw.signature,
            new_public_key,
            new_diversifier: raw.new_diversifier,
        })
    }
}

impl From<Header> for RawHeader {
    fn from(header: Header) -> Self {
        Self {
            sequence: header.sequence,
            timestamp: header.timestamp,
            signature: header.signature,
            new_public_key: Some(header.new_public_key.to_any()),
            new_diversifier: header.new_diversifier,
        }
    }
}
