//! Tendermint header: a signed block header together with the validator sets needed to
//! verify it

use ibc_light_client_core::{
    client::HeaderCommon, identifier::parse_chain_id, proto::decode_any, Any, ClientError,
    Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use tendermint::{block::signed_header::SignedHeader, validator::Set as ValidatorSet, Hash, Time};

use crate::{
    proto::{RawHeader, HEADER_TYPE_URL},
    TENDERMINT_CLIENT_TYPE,
};

/// A header submitted to update a tendermint client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Block header and the commit signing it
    pub signed_header: SignedHeader,
    /// Validator set that signed the commit
    pub validator_set: ValidatorSet,
    /// Height of the consensus state the header is verified against
    pub trusted_height: Height,
    /// Next validator set of the trusted consensus state
    pub trusted_validators: ValidatorSet,
}

impl Header {
    /// Unpacks a header.
    ///
    /// # Errors
    /// Returns an error if the type url is not the tendermint header or the value does not
    /// decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawHeader>(any, HEADER_TYPE_URL)?.try_into()
    }

    /// Block time of the header.
    #[must_use]
    pub fn time(&self) -> Time {
        self.signed_header.header().time
    }

    /// Chain id the header was produced on.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        self.signed_header.header().chain_id.as_str()
    }

    /// Hash of the block the commit signs.
    #[must_use]
    pub fn block_hash(&self) -> Hash {
        self.signed_header.commit().block_id.hash
    }

    /// Checks that the trusted validators hash to the next validators hash of the trusted
    /// consensus state.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidValidatorSet`] on a mismatch.
    pub fn check_trusted_next_validator_set(
        &self,
        next_validators_hash: &Hash,
    ) -> Result<(), ClientError> {
        let trusted_hash = self.trusted_validators.hash();
        ensure!(
            trusted_hash == *next_validators_hash,
            ClientError::InvalidValidatorSet {
                reason: format!(
                    "trusted validators {trusted_hash} do not hash to the latest trusted validators {next_validators_hash}"
                ),
            }
        );
        Ok(())
    }
}

impl HeaderCommon for Header {
    fn client_type(&self) -> &'static str {
        TENDERMINT_CLIENT_TYPE
    }

    fn height(&self) -> Height {
        Height::new(
            parse_chain_id(self.chain_id()),
            self.signed_header.header().height.value(),
        )
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        let invalid = |reason: String| ClientError::InvalidHeader { reason };
        let block = self.signed_header.header();
        let commit = self.signed_header.commit();

        ensure!(
            commit.height == block.height,
            invalid(format!(
                "commit height {} does not match header height {}",
                commit.height, block.height
            ))
        );
        ensure!(
            commit.block_id.hash == block.hash(),
            invalid("commit signs a block other than the header".to_string())
        );
        ensure!(
            self.trusted_height <= self.height(),
            invalid(format!(
                "trusted height {} must not exceed header height {}",
                self.trusted_height,
                self.height()
            ))
        );
        let validators_hash = self.validator_set.hash();
        ensure!(
            validators_hash == block.validators_hash,
            invalid(format!(
                "validator set hash {validators_hash} does not match header validators hash {}",
                block.validators_hash
            ))
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
        let missing = |field: &str| ClientError::InvalidHeader {
            reason: format!("{field} cannot be empty"),
        };
        let malformed = |field: &str, e: tendermint::Error| ClientError::InvalidHeader {
            reason: format!("invalid {field}: {e}"),
        };

        let signed_header = raw
            .signed_header
            .ok_or_else(|| missing("signed header"))?
            .try_into()
            .map_err(|e| malformed("signed header", e))?;
        let validator_set = raw
            .validator_set
            .ok_or_else(|| missing("validator set"))?
            .try_into()
            .map_err(|e| malformed("validator set", e))?;
        let trusted_validators = raw
            .trusted_validators
            .ok_or_else(|| missing("trusted validators"))?
            .try_into()
            .map_err(|e| malformed("trusted validators", e))?;

        Ok(Self {
            signed_header,
            validator_set,
            trusted_height: raw.trusted_height.map(Into::into).unwrap_or_default(),
            trusted_validators,
        })
    }
}

impl From<Header> for RawHeader {
    fn from(header: Header) -> Self {
        Self {
            signed_header: Some(header.signed_header.into()),
            validator_set: Some(header.validator_set.into()),
            trusted_height: Some(header.trusted_height.into()),
            trusted_validators: Some(header.trusted_validators.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestChain;

    #[test]
    fn height_carries_chain_revision() {
        let chain = TestChain::new("gaia-4");
        let header = chain.header(12, 10);
        assert_eq!(header.height(), Height::new(4, 12));
        assert_eq!(header.trusted_height, Height::new(4, 10));
        header.validate_basic().unwrap();
    }

    #[test]
    fn rejects_trusted_height_above_header() {
        let chain = TestChain::default();
        let mut header = chain.header(11, 10);
        header.trusted_height = Height::new(0, 12);
        assert!(matches!(
            header.validate_basic(),
            Err(ClientError::InvalidHeader { reason }) if reason.contains("trusted height")
        ));
    }

    #[test]
    fn rejects_foreign_validator_set() {
        let chain = TestChain::default();
        let mut header = chain.header(11, 10);
        header.validator_set = TestChain::other_validators().validator_set();
        assert!(matches!(
            header.validate_basic(),
            Err(ClientError::InvalidHeader { reason }) if reason.contains("validator set hash")
        ));
    }

    #[test]
    fn checks_trusted_validators_against_consensus_state() {
        let chain = TestChain::default();
        let header = chain.header(11, 10);
        let trusted = chain.consensus_state_at(10);
        header
            .check_trusted_next_validator_set(&trusted.next_validators_hash)
            .unwrap();

        let other = TestChain::other_validators().validator_set().hash();
        assert!(matches!(
            header.check_trusted_next_validator_set(&other),
            Err(ClientError::InvalidValidatorSet { .. })
        ));
    }

    #[test]
    fn unpacks_packed_header() {
        let header = TestChain::default().header(11, 10);
        assert_eq!(Header::from_any(&header.to_any()).unwrap(), header);

        let raw = RawHeader {
            trusted_validators: None,
            ..header.into()
        };
        assert!(matches!(
            Header::try_from(raw),
            Err(ClientError::InvalidHeader { .. })
        ));
    }
}
