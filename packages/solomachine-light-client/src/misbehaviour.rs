//! Solo machine misbehaviour: two signatures by the same key at the same sequence

use ibc_light_client_core::{
    client::MisbehaviourCommon, identifier::validate_client_identifier, proto::decode_any, Any,
    ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    proto::{DataType, RawMisbehaviour, RawSignatureAndData, MISBEHAVIOUR_TYPE_URL},
    SOLOMACHINE_CLIENT_TYPE,
};

/// A signature together with the payload it signs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureAndData {
    /// Encoded signature data
    pub signature: Vec<u8>,
    /// Declared type of `data`
    pub data_type: DataType,
    /// Encoded payload
    pub data: Vec<u8>,
    /// Time the signature was produced at in nanoseconds
    pub timestamp: u64,
}

impl SignatureAndData {
    /// Checks that every field is set.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidSignatureAndData`] if a field is empty or zero.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        let invalid = |reason: &str| ClientError::InvalidSignatureAndData {
            reason: reason.to_string(),
        };
        ensure!(!self.signature.is_empty(), invalid("signature cannot be empty"));
        ensure!(!self.data.is_empty(), invalid("data for signature cannot be empty"));
        ensure!(
            self.data_type != DataType::Unspecified,
            invalid("data type cannot be UNSPECIFIED")
        );
        ensure!(self.timestamp != 0, invalid("timestamp cannot be 0"));
        Ok(())
    }
}

impl From<RawSignatureAndData> for SignatureAndData {
    fn from(raw: RawSignatureAndData) -> Self {
        Self {
            data_type: raw.data_type(),
            signature: raw.signature,
            data: raw.data,
            timestamp: raw.timestamp,
        }
    }
}

impl From<SignatureAndData> for RawSignatureAndData {
    fn from(value: SignatureAndData) -> Self {
        Self {
            signature: value.signature,
            data_type: value.data_type.into(),
            data: value.data,
            timestamp: value.timestamp,
        }
    }
}

/// Evidence that the solo machine signed two different messages at one sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Misbehaviour {
    /// Client the evidence is submitted against
    pub client_id: String,
    /// Sequence both signatures were produced at
    pub sequence: u64,
    /// First signature
    pub signature_one: SignatureAndData,
    /// Second signature
    pub signature_two: SignatureAndData,
}

impl Misbehaviour {
    /// Unpacks a misbehaviour.
    ///
    /// # Errors
    /// Returns an error if the type url is not the solo machine misbehaviour or the value does
    /// not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawMisbehaviour>(any, MISBEHAVIOUR_TYPE_URL)?.try_into()
    }
}

impl MisbehaviourCommon for Misbehaviour {
    fn client_type(&self) -> &'static str {
        SOLOMACHINE_CLIENT_TYPE
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn height(&self) -> Height {
        Height::new(0, self.sequence)
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        validate_client_identifier(&self.client_id).map_err(|e| {
            ClientError::InvalidMisbehaviour {
                reason: format!("invalid client identifier for solo machine: {e}"),
            }
        })?;
        ensure!(
            self.sequence != 0,
            ClientError::InvalidMisbehaviour {
                reason: "sequence cannot be 0".to_string(),
            }
        );
        self.signature_one.validate_basic()?;
        self.signature_two.validate_basic()?;
        ensure!(
            self.signature_one.signature != self.signature_two.signature,
            ClientError::InvalidMisbehaviour {
                reason: "misbehaviour signatures cannot be equal".to_string(),
            }
        );
        ensure!(
            self.signature_one.data != self.signature_two.data,
            ClientError::InvalidMisbehaviour {
                reason: "misbehaviour signature data must be signed over different messages"
                    .to_string(),
            }
        );
        Ok(())
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: MISBEHAVIOUR_TYPE_URL.to_string(),
            value: RawMisbehaviour::from(self.clone()).encode_to_vec(),
        }
    }
}

impl TryFrom<RawMisbehaviour> for Misbehaviour {
    type Error = ClientError;

    fn try_from(raw: RawMisbehaviour) -> Result<Self, Self::Error> {
        let missing = |which: &str| ClientError::InvalidMisbehaviour {
            reason: format!("{which} cannot be empty"),
        };
        Ok(Self {
            client_id: raw.client_id,
            sequence: raw.sequence,
            signature_one: raw.signature_one.ok_or_else(|| missing("signature one"))?.into(),
            signature_two: raw.signature_two.ok_or_else(|| missing("signature two"))?.into(),
        })
    }
}

impl From<Misbehaviour> for RawMisbehaviour {
    fn from(misbehaviour: Misbehaviour) -> Self {
        Self {
            client_id: misbehaviour.client_id,
            sequence: misbehaviour.sequence,
            signature_one: Some(misbehaviour.signature_one.into()),
            signature_two: Some(misbehaviour.signature_two.into()),
        }
    }
}
