//! Solo machine client state

use ibc_light_client_core::{
    client::{ClientStateCommon, ConsensusStateCommon, Status},
    ics23::ProofSpec,
    proto::decode_any,
    Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    consensus_state::ConsensusState,
    proto::{RawClientState, CLIENT_STATE_TYPE_URL},
    SOLOMACHINE_CLIENT_TYPE,
};

/// State of a solo machine client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientState {
    /// Sequence of the next message the solo machine must sign
    pub sequence: u64,
    /// Sequence at which misbehaviour froze the client, 0 when not frozen
    pub frozen_sequence: u64,
    /// Current signing key, diversifier and time
    pub consensus_state: ConsensusState,
    /// Whether a governance proposal may replace the key of a frozen client
    pub allow_update_after_proposal: bool,
}

impl ClientState {
    /// Unpacks a client state.
    ///
    /// # Errors
    /// Returns an error if the type url is not the solo machine client state or the value does
    /// not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawClientState>(any, CLIENT_STATE_TYPE_URL)?.try_into()
    }

    /// Solo machines are frozen or active, they never expire.
    #[must_use]
    pub const fn status(&self) -> Status {
        if self.frozen_sequence != 0 {
            Status::Frozen
        } else {
            Status::Active
        }
    }

    /// Checks the consensus state a client is created with.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidConsensus`] if it differs from the embedded one.
    pub fn initialize(&self, consensus_state: &ConsensusState) -> Result<(), ClientError> {
        ensure!(
            *consensus_state == self.consensus_state,
            ClientError::InvalidConsensus {
                reason: "initial consensus state does not match the client state".to_string(),
            }
        );
        Ok(())
    }

    /// Upgrades are not supported by solo machines.
    ///
    /// # Errors
    /// Always returns [`ClientError::InvalidUpgradeClient`].
    pub fn verify_upgrade(&self) -> Result<(), ClientError> {
        Err(ClientError::InvalidUpgradeClient {
            reason: format!("cannot upgrade {} client", self.client_type()),
        })
    }
}

impl ClientStateCommon for ClientState {
    fn client_type(&self) -> &'static str {
        SOLOMACHINE_CLIENT_TYPE
    }

    fn latest_height(&self) -> Height {
        Height::new(0, self.sequence)
    }

    fn frozen_height(&self) -> Height {
        Height::new(0, self.frozen_sequence)
    }

    fn validate(&self) -> Result<(), ClientError> {
        ensure!(
            self.sequence != 0,
            ClientError::InvalidClient {
                reason: "sequence cannot be 0".to_string(),
            }
        );
        self.consensus_state.validate_basic()
    }

    fn proof_specs(&self) -> Vec<ProofSpec> {
        vec![]
    }

    fn zero_custom_fields(&self) -> Self {
        Self {
            frozen_sequence: 0,
            allow_update_after_proposal: false,
            ..self.clone()
        }
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: CLIENT_STATE_TYPE_URL.to_string(),
            value: RawClientState::from(self.clone()).encode_to_vec(),
        }
    }
}

impl TryFrom<RawClientState> for ClientState {
    type Error = ClientError;

    fn try_from(raw: RawClientState) -> Result<Self, Self::Error> {
        let consensus_state = raw
            .consensus_state
            .ok_or_else(|| ClientError::InvalidClient {
                reason: "consensus state cannot be empty".to_string(),
            })?
            .try_into()?;
        Ok(Self {
            sequence: raw.sequence,
            frozen_sequence: raw.frozen_sequence,
            consensus_state,
            allow_update_after_proposal: raw.allow_update_after_proposal,
        })
    }
}

impl From<ClientState> for RawClientState {
    fn from(client_state: ClientState) -> Self {
        Self {
            sequence: client_state.sequence,
            frozen_sequence: client_state.frozen_sequence,
            consensus_state: Some(client_state.consensus_state.into()),
            allow_update_after_proposal: client_state.allow_update_after_proposal,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestSoloMachine;

    use super::*;

    #[test]
    fn validate() {
        let solo = TestSoloMachine::secp256k1(1);
        solo.client_state().validate().unwrap();

        let mut client_state = solo.client_state();
        client_state.sequence = 0;
        assert!(matches!(
            client_state.validate(),
            Err(ClientError::InvalidClient { reason }) if reason.contains("sequence")
        ));

        let mut client_state = solo.client_state();
        client_state.consensus_state.timestamp = 0;
        assert!(matches!(
            client_state.validate(),
            Err(ClientError::InvalidConsensus { .. })
        ));

        let mut client_state = solo.client_state();
        client_state.consensus_state.diversifier = "  ".to_string();
        assert!(client_state.validate().is_err());
    }

    #[test]
    fn heights_follow_sequences() {
        let mut client_state = TestSoloMachine::secp256k1(1).client_state();
        client_state.sequence = 7;
        assert_eq!(client_state.latest_height(), Height::new(0, 7));
        assert!(!client_state.is_frozen());
        assert_eq!(client_state.status(), Status::Active);

        client_state.frozen_sequence = 5;
        assert_eq!(client_state.frozen_height(), Height::new(0, 5));
        assert!(client_state.is_frozen());
        assert_eq!(client_state.status(), Status::Frozen);
    }

    #[test]
    fn zero_custom_fields_clears_freeze_and_allowance() {
        let mut client_state = TestSoloMachine::secp256k1(1).client_state();
        client_state.frozen_sequence = 3;
        client_state.allow_update_after_proposal = true;

        let zeroed = client_state.zero_custom_fields();
        assert_eq!(zeroed.frozen_sequence, 0);
        assert!(!zeroed.allow_update_after_proposal);
        assert_eq!(zeroed.sequence, client_state.sequence);
        assert_eq!(zeroed.consensus_state, client_state.consensus_state);
    }

    #[test]
    fn unpacks_packed_state() {
        let client_state = TestSoloMachine::ed25519(2).client_state();
        assert_eq!(
            ClientState::from_any(&client_state.to_any()).unwrap(),
            client_state
        );
        assert!(client_state.proof_specs().is_empty());

        let res = ClientState::from_any(&client_state.consensus_state.to_any());
        assert!(matches!(res, Err(ClientError::UnknownTypeUrl { .. })));
    }

    #[test]
    fn initialize_requires_embedded_consensus_state() {
        let solo = TestSoloMachine::secp256k1(1);
        let client_state = solo.client_state();
        client_state.initialize(&solo.consensus_state()).unwrap();

        let mut other = solo.consensus_state();
        other.timestamp += 1;
        assert!(matches!(
            client_state.initialize(&other),
            Err(ClientError::InvalidConsensus { .. })
        ));
    }

    #[test]
    fn upgrade_is_unsupported() {
        let client_state = TestSoloMachine::secp256k1(1).client_state();
        assert!(matches!(
            client_state.verify_upgrade(),
            Err(ClientError::InvalidUpgradeClient { .. })
        ));
    }
}
