//! Client messages and their stateless validation

use ibc_light_client_core::{
    identifier::validate_client_identifier, Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;

use crate::{
    any_client::{AnyClientState, AnyConsensusState, AnyHeader, AnyMisbehaviour},
    localhost::LOCALHOST_CLIENT_ID,
};

/// Checks that `signer` is a non-empty bech32 address.
///
/// # Errors
/// Returns [`ClientError::InvalidSigner`] otherwise.
pub fn validate_signer(signer: &str) -> Result<(), ClientError> {
    ensure!(
        !signer.trim().is_empty(),
        ClientError::InvalidSigner {
            reason: "signer cannot be empty".to_string(),
        }
    );
    let (_, address) =
        subtle_encoding::bech32::decode(signer).map_err(|e| ClientError::InvalidSigner {
            reason: format!("{signer:?} is not a bech32 address: {e}"),
        })?;
    ensure!(
        !address.is_empty(),
        ClientError::InvalidSigner {
            reason: format!("{signer:?} has an empty address"),
        }
    );
    Ok(())
}

fn ensure_not_localhost(client_id: &str) -> Result<(), ClientError> {
    ensure!(
        client_id != LOCALHOST_CLIENT_ID,
        ClientError::InvalidClient {
            reason: format!("{LOCALHOST_CLIENT_ID} is managed by the host"),
        }
    );
    Ok(())
}

/// Creates a client from its initial client and consensus state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgCreateClient {
    /// Requested identifier, generated when empty
    pub client_id: String,
    /// Packed initial client state
    pub client_state: Any,
    /// Packed initial consensus state
    pub consensus_state: Any,
    /// Sender address
    pub signer: String,
}

impl MsgCreateClient {
    /// Stateless checks of the message.
    ///
    /// # Errors
    /// Returns an error if the signer or identifier is malformed, either state does not
    /// decode or validate, the states are of different types or the client is a localhost
    /// client.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        validate_signer(&self.signer)?;
        if !self.client_id.is_empty() {
            validate_client_identifier(&self.client_id)?;
            ensure_not_localhost(&self.client_id)?;
        }

        let client_state = AnyClientState::from_any(&self.client_state)?;
        ensure!(
            !matches!(client_state, AnyClientState::Localhost(_)),
            ClientError::InvalidClient {
                reason: "localhost clients cannot be created".to_string(),
            }
        );
        client_state.validate()?;

        let consensus_state = AnyConsensusState::from_any(&self.consensus_state)?;
        ensure!(
            client_state.client_type() == consensus_state.client_type(),
            ClientError::InvalidClientType {
                reason: format!(
                    "client type {} does not match consensus state type {}",
                    client_state.client_type(),
                    consensus_state.client_type()
                ),
            }
        );
        consensus_state.validate_basic()
    }
}

/// Updates a client with a new header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUpdateClient {
    /// Client to update
    pub client_id: String,
    /// Packed header
    pub header: Any,
    /// Sender address
    pub signer: String,
}

impl MsgUpdateClient {
    /// Stateless checks of the message.
    ///
    /// # Errors
    /// Returns an error if the signer or identifier is malformed, the client is the localhost
    /// client or the header does not decode or validate.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        validate_signer(&self.signer)?;
        validate_client_identifier(&self.client_id)?;
        ensure_not_localhost(&self.client_id)?;
        AnyHeader::from_any(&self.header)?.validate_basic()
    }
}

/// Upgrades a client to a client state committed by the counterparty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUpgradeClient {
    /// Client to upgrade
    pub client_id: String,
    /// Packed upgraded client state
    pub client_state: Any,
    /// Height of the last block before the upgrade
    pub upgrade_height: Height,
    /// Proof of the committed upgraded client
    pub proof_upgrade: Vec<u8>,
    /// Sender address
    pub signer: String,
}

impl MsgUpgradeClient {
    /// Stateless checks of the message.
    ///
    /// # Errors
    /// Returns an error if the signer or identifier is malformed, the upgraded client does
    /// not decode, the upgrade height is zero or the proof is empty.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        validate_signer(&self.signer)?;
        validate_client_identifier(&self.client_id)?;
        AnyClientState::from_any(&self.client_state)?;
        ensure!(
            !self.upgrade_height.is_zero(),
            ClientError::InvalidHeight {
                reason: "upgrade height cannot be zero".to_string(),
            }
        );
        ensure!(
            !self.proof_upgrade.is_empty(),
            ClientError::InvalidUpgradeClient {
                reason: "proof of upgrade cannot be empty".to_string(),
            }
        );
        Ok(())
    }
}

/// Submits evidence of misbehaviour against a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSubmitMisbehaviour {
    /// Client the evidence is against
    pub client_id: String,
    /// Packed misbehaviour
    pub misbehaviour: Any,
    /// Sender address
    pub signer: String,
}

impl MsgSubmitMisbehaviour {
    /// Stateless checks of the message.
    ///
    /// # Errors
    /// Returns an error if the signer or identifier is malformed, or the misbehaviour does
    /// not decode, names another client or does not validate.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        validate_signer(&self.signer)?;
        validate_client_identifier(&self.client_id)?;
        let misbehaviour = AnyMisbehaviour::from_any(&self.misbehaviour)?;
        ensure!(
            misbehaviour.client_id() == self.client_id,
            ClientError::InvalidMisbehaviour {
                reason: format!(
                    "misbehaviour is for client {}, not {}",
                    misbehaviour.client_id(),
                    self.client_id
                ),
            }
        );
        misbehaviour.validate_basic()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use ibc_light_client_core::client::{
        ClientStateCommon, ConsensusStateCommon, HeaderCommon, MisbehaviourCommon,
    };
    use rstest::rstest;
    use solomachine_light_client::test_utils::TestSoloMachine;
    use tendermint_light_client::test_utils::TestChain;

    use super::*;
    use crate::localhost;

    pub fn signer() -> String {
        subtle_encoding::bech32::encode("cosmos", [7_u8; 20])
    }

    fn create_msg() -> MsgCreateClient {
        let solo = TestSoloMachine::secp256k1(1);
        MsgCreateClient {
            client_id: String::new(),
            client_state: solo.client_state().to_any(),
            consensus_state: solo.consensus_state().to_any(),
            signer: signer(),
        }
    }

    #[rstest]
    #[case::empty(String::new(), false)]
    #[case::blank("  ".to_string(), false)]
    #[case::not_bech32("cosmos-address".to_string(), false)]
    #[case::bad_checksum(format!("{}x", signer()), false)]
    #[case::bech32(signer(), true)]
    fn signer_must_be_bech32(#[case] address: String, #[case] ok: bool) {
        let res = validate_signer(&address);
        assert_eq!(res.is_ok(), ok);
        if !ok {
            assert!(matches!(res, Err(ClientError::InvalidSigner { .. })));
        }
    }

    #[test]
    fn create_client() {
        create_msg().validate_basic().unwrap();

        let mut msg = create_msg();
        msg.client_id = "06-solomachine-4".to_string();
        msg.validate_basic().unwrap();

        let mut msg = create_msg();
        msg.signer = String::new();
        assert!(matches!(
            msg.validate_basic(),
            Err(ClientError::InvalidSigner { .. })
        ));

        let mut msg = create_msg();
        msg.client_id = "bad/id".to_string();
        assert!(matches!(
            msg.validate_basic(),
            Err(ClientError::InvalidClientId { .. })
        ));

        let mut msg = create_msg();
        msg.consensus_state = TestChain::default().consensus_state_at(1).to_any();
        assert!(matches!(
            msg.validate_basic(),
            Err(ClientError::InvalidClientType { .. })
        ));
    }

    #[test]
    fn create_localhost_client_rejected() {
        let mut msg = create_msg();
        msg.client_state = localhost::ClientState::new("host", 1).to_any();
        assert!(matches!(
            msg.validate_basic(),
            Err(ClientError::InvalidClient { .. })
        ));

        let mut msg = create_msg();
        msg.client_id = LOCALHOST_CLIENT_ID.to_string();
        assert!(matches!(
            msg.validate_basic(),
            Err(ClientError::InvalidClient { .. })
        ));
    }

    #[test]
    fn update_client() {
        let chain = TestChain::default();
        let msg = MsgUpdateClient {
            client_id: "07-tendermint-0".to_string(),
            header: chain.header(11, 10).to_any(),
            signer: signer(),
        };
        msg.validate_basic().unwrap();

        let localhost_msg = MsgUpdateClient {
            client_id: LOCALHOST_CLIENT_ID.to_string(),
            ..msg.clone()
        };
        assert!(matches!(
            localhost_msg.validate_basic(),
            Err(ClientError::InvalidClient { .. })
        ));

        let unknown = MsgUpdateClient {
            header: chain.client_state(10).to_any(),
            ..msg
        };
        assert!(matches!(
            unknown.validate_basic(),
            Err(ClientError::UnknownTypeUrl { .. })
        ));
    }

    #[test]
    fn upgrade_client() {
        let msg = MsgUpgradeClient {
            client_id: "07-tendermint-0".to_string(),
            client_state: TestChain::default().client_state(10).to_any(),
            upgrade_height: Height::new(0, 20),
            proof_upgrade: vec![1],
            signer: signer(),
        };
        msg.validate_basic().unwrap();

        let zero_height = MsgUpgradeClient {
            upgrade_height: Height::zero(),
            ..msg.clone()
        };
        assert!(matches!(
            zero_height.validate_basic(),
            Err(ClientError::InvalidHeight { .. })
        ));

        let no_proof = MsgUpgradeClient {
            proof_upgrade: vec![],
            ..msg
        };
        assert!(matches!(
            no_proof.validate_basic(),
            Err(ClientError::InvalidUpgradeClient { .. })
        ));
    }

    #[test]
    fn submit_misbehaviour_for_named_client() {
        let solo = TestSoloMachine::secp256k1(1);
        let misbehaviour = solo.create_misbehaviour("06-solomachine-0");
        let msg = MsgSubmitMisbehaviour {
            client_id: misbehaviour.client_id().to_string(),
            misbehaviour: misbehaviour.to_any(),
            signer: signer(),
        };
        msg.validate_basic().unwrap();

        let other = MsgSubmitMisbehaviour {
            client_id: "06-solomachine-1".to_string(),
            ..msg
        };
        assert!(matches!(
            other.validate_basic(),
            Err(ClientError::InvalidMisbehaviour { reason }) if reason.contains("06-solomachine-0")
        ));
    }
}
