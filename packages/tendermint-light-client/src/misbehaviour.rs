//! Tendermint misbehaviour: two validly signed headers committing different blocks at the
//! same height

use ibc_light_client_core::{
    client::{ClientStateCommon, HeaderCommon, MisbehaviourCommon},
    identifier::validate_client_identifier,
    proto::decode_any,
    store::Store,
    Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    client_state::ClientState,
    header::Header,
    proto::{RawHeader, RawMisbehaviour, MISBEHAVIOUR_TYPE_URL},
    time,
    update::{load_consensus_state, verify_with_verifier, VerificationMode},
    TENDERMINT_CLIENT_TYPE,
};

/// Evidence of a fork or a double sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Misbehaviour {
    /// Client the evidence is submitted against
    pub client_id: String,
    /// First conflicting header
    pub header_1: Header,
    /// Second conflicting header
    pub header_2: Header,
}

impl Misbehaviour {
    /// Unpacks a misbehaviour.
    ///
    /// # Errors
    /// Returns an error if the type url is not the tendermint misbehaviour or the value does
    /// not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawMisbehaviour>(any, MISBEHAVIOUR_TYPE_URL)?.try_into()
    }
}

impl MisbehaviourCommon for Misbehaviour {
    fn client_type(&self) -> &'static str {
        TENDERMINT_CLIENT_TYPE
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn height(&self) -> Height {
        self.header_1.height()
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        let invalid = |reason: String| ClientError::InvalidMisbehaviour { reason };

        validate_client_identifier(&self.client_id)
            .map_err(|e| invalid(format!("invalid client identifier: {e}")))?;
        for (name, header) in [("header 1", &self.header_1), ("header 2", &self.header_2)] {
            ensure!(
                !header.trusted_height.is_zero(),
                invalid(format!("{name} trusted height cannot be zero"))
            );
            header
                .validate_basic()
                .map_err(|e| invalid(format!("{name} is invalid: {e}")))?;
        }
        ensure!(
            self.header_1.chain_id() == self.header_2.chain_id(),
            invalid(format!(
                "headers must have the same chain id, got {} and {}",
                self.header_1.chain_id(),
                self.header_2.chain_id()
            ))
        );
        ensure!(
            self.header_1.height() == self.header_2.height(),
            invalid(format!(
                "headers must be at the same height, got {} and {}",
                self.header_1.height(),
                self.header_2.height()
            ))
        );
        ensure!(
            self.header_1.block_hash() != self.header_2.block_hash(),
            invalid("headers commit to the same block id".to_string())
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
        let header = |raw: Option<RawHeader>, name: &str| -> Result<Header, ClientError> {
            raw.ok_or_else(|| ClientError::InvalidMisbehaviour {
                reason: format!("{name} cannot be empty"),
            })?
            .try_into()
        };
        Ok(Self {
            header_1: header(raw.header_1, "header 1")?,
            header_2: header(raw.header_2, "header 2")?,
            client_id: raw.client_id,
        })
    }
}

impl From<Misbehaviour> for RawMisbehaviour {
    fn from(misbehaviour: Misbehaviour) -> Self {
        Self {
            client_id: misbehaviour.client_id,
            header_1: Some(misbehaviour.header_1.into()),
            header_2: Some(misbehaviour.header_2.into()),
        }
    }
}

/// Checks one side of the evidence against the consensus state it trusts.
fn verify_conflicting_header(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
    now_ns: u64,
) -> Result<(), ClientError> {
    let invalid = |reason: String| ClientError::InvalidMisbehaviour { reason };

    let chain_id = client_state.chain_id_at(header.height())?;
    ensure!(
        header.chain_id() == chain_id,
        invalid(format!(
            "header chain id {} does not match client chain id {chain_id}",
            header.chain_id()
        ))
    );

    let trusted = load_consensus_state(store, header.trusted_height)?;
    header.check_trusted_next_validator_set(&trusted.next_validators_hash)?;
    ensure!(
        !client_state.is_expired(time::to_nanos(trusted.timestamp), now_ns),
        ClientError::TrustingPeriodExpired {
            reason: format!(
                "trusted consensus state at {} is outside the trusting period",
                header.trusted_height
            ),
        }
    );

    verify_with_verifier(
        client_state,
        &trusted,
        header,
        now_ns,
        VerificationMode::Misbehaviour,
    )
    .map_err(invalid)
}

/// Verifies both headers of `misbehaviour` and returns the client frozen at its height.
///
/// # Errors
/// Returns [`ClientError::InvalidMisbehaviour`] if the evidence is malformed, the client is
/// already frozen at or below its height, or either header fails verification;
/// [`ClientError::ConsensusStateNotFound`] if a trusted consensus state is missing.
pub fn check_misbehaviour_and_update_state(
    client_state: &ClientState,
    store: &dyn Store,
    misbehaviour: &Misbehaviour,
    now_ns: u64,
) -> Result<ClientState, ClientError> {
    misbehaviour.validate_basic()?;

    let height = misbehaviour.height();
    ensure!(
        !client_state.is_frozen() || client_state.frozen_height > height,
        ClientError::InvalidMisbehaviour {
            reason: format!(
                "client is already frozen at {}, not above misbehaviour height {height}",
                client_state.frozen_height
            ),
        }
    );

    verify_conflicting_header(client_state, store, &misbehaviour.header_1, now_ns)?;
    verify_conflicting_header(client_state, store, &misbehaviour.header_2, now_ns)?;

    Ok(ClientState {
        frozen_height: height,
        ..client_state.clone()
    })
}
