//! State transitions of the solo machine client: key rotation, misbehaviour, and
//! governance recovery.

use ibc_light_client_core::{
    client::ClientStateCommon,
    crypto::{verify_signature, SignatureData},
    ClientError,
};
use ibc_light_client_utils::ensure;

use crate::{
    client_state::ClientState,
    consensus_state::ConsensusState,
    header::Header,
    misbehaviour::{Misbehaviour, SignatureAndData},
    sign_bytes::{sign_bytes, sign_bytes_raw, SignData},
};

/// Verifies a key rotation header signed by the current key.
///
/// # Errors
/// Returns [`ClientError::InvalidHeader`] if the header is not at the client sequence, is
/// older than the consensus state, or is not signed by the current key.
pub fn verify_header(client_state: &ClientState, header: &Header) -> Result<(), ClientError> {
    ensure!(
        header.sequence == client_state.sequence,
        ClientError::InvalidHeader {
            reason: format!(
                "header sequence does not match the client state sequence ({} != {})",
                header.sequence, client_state.sequence
            ),
        }
    );
    ensure!(
        header.timestamp >= client_state.consensus_state.timestamp,
        ClientError::InvalidHeader {
            reason: format!(
                "header timestamp is less than the consensus state timestamp ({} < {})",
                header.timestamp, client_state.consensus_state.timestamp
            ),
        }
    );

    let data = SignData::Header {
        new_public_key: header.new_public_key.clone(),
        new_diversifier: header.new_diversifier.clone(),
    };
    let sign_bytes = sign_bytes(
        header.sequence,
        header.timestamp,
        &header.new_diversifier,
        &data,
    );
    let signature_data =
        SignatureData::decode(&header.signature).map_err(|e| ClientError::InvalidHeader {
            reason: format!("failed to decode header signature: {e}"),
        })?;
    verify_signature(
        &client_state.consensus_state.public_key,
        &sign_bytes,
        &signature_data,
    )
    .map_err(|e| ClientError::InvalidHeader {
        reason: format!("failed to verify header signature: {e}"),
    })
}

/// Verifies `header` and rotates the client to its key and diversifier.
///
/// The new consensus state belongs at the header height, `(0, header.sequence)`.
///
/// # Errors
/// Returns an error if [`verify_header`] fails.
pub fn check_header_and_update_state(
    client_state: &ClientState,
    header: &Header,
) -> Result<(ClientState, ConsensusState), ClientError> {
    verify_header(client_state, header)?;
    let sequence = client_state
        .sequence
        .checked_add(1)
        .ok_or_else(|| ClientError::InvalidHeader {
            reason: format!("sequence {} cannot be advanced", client_state.sequence),
        })?;

    let consensus_state = ConsensusState {
        public_key: header.new_public_key.clone(),
        diversifier: header.new_diversifier.clone(),
        timestamp: header.timestamp,
    };
    let client_state = ClientState {
        sequence,
        consensus_state: consensus_state.clone(),
        ..client_state.clone()
    };
    Ok((client_state, consensus_state))
}

/// Verifies both signatures of `misbehaviour` and freezes the client at its sequence.
///
/// # Errors
/// Returns [`ClientError::ClientFrozen`] if the client is already frozen and an error if
/// either signature is older than the consensus state, carries undecodable data or does not
/// verify.
pub fn check_misbehaviour_and_update_state(
    client_state: &ClientState,
    misbehaviour: &Misbehaviour,
) -> Result<ClientState, ClientError> {
    ensure!(!client_state.is_frozen(), ClientError::ClientFrozen);

    for signature_and_data in [&misbehaviour.signature_one, &misbehaviour.signature_two] {
        verify_signature_and_data(client_state, misbehaviour.sequence, signature_and_data)?;
    }

    Ok(ClientState {
        frozen_sequence: misbehaviour.sequence,
        ..client_state.clone()
    })
}

fn verify_signature_and_data(
    client_state: &ClientState,
    sequence: u64,
    signature_and_data: &SignatureAndData,
) -> Result<(), ClientError> {
    let consensus_state = &client_state.consensus_state;
    ensure!(
        signature_and_data.timestamp >= consensus_state.timestamp,
        ClientError::InvalidMisbehaviour {
            reason: format!(
                "timestamp of misbehaviour signature is less than the consensus state timestamp ({} < {})",
                signature_and_data.timestamp, consensus_state.timestamp
            ),
        }
    );
    SignData::decode(signature_and_data.data_type, &signature_and_data.data)?;

    let sign_bytes = sign_bytes_raw(
        sequence,
        signature_and_data.timestamp,
        &consensus_state.diversifier,
        signature_and_data.data_type,
        signature_and_data.data.clone(),
    );
    let signature_data = SignatureData::decode(&signature_and_data.signature)?;
    verify_signature(&consensus_state.public_key, &sign_bytes, &signature_data)
}

/// Replaces the key of the subject client with that of `substitute`.
///
/// # Errors
/// Returns [`ClientError::UpdateClientFailed`] if the subject does not allow updates after a
/// proposal and [`ClientError::InvalidHeader`] if the substitute keeps the subject key.
pub fn check_substitute_and_update_state(
    subject: &ClientState,
    substitute: &ClientState,
) -> Result<ClientState, ClientError> {
    ensure!(
        subject.allow_update_after_proposal,
        ClientError::UpdateClientFailed {
            reason: "solo machine client is not allowed to be updated with a proposal"
                .to_string(),
        }
    );
    ensure!(
        substitute.consensus_state.public_key != subject.consensus_state.public_key,
        ClientError::InvalidHeader {
            reason: "subject and substitute have the same public key".to_string(),
        }
    );

    Ok(ClientState {
        sequence: substitute.sequence,
        frozen_sequence: 0,
        consensus_state: substitute.consensus_state.clone(),
        ..subject.clone()
    })
}

/// Applies a governance approved header without checking its signature.
///
/// # Errors
/// Returns [`ClientError::UpdateClientFailed`] if the client does not allow updates after a
/// proposal and [`ClientError::InvalidHeader`] if the header keeps the current key.
pub fn check_proposed_header_and_update_state(
    client_state: &ClientState,
    header: &Header,
) -> Result<(ClientState, ConsensusState), ClientError> {
    ensure!(
        client_state.allow_update_after_proposal,
        ClientError::UpdateClientFailed {
            reason: "solo machine client is not allowed to be updated with a proposal"
                .to_string(),
        }
    );
    ensure!(
        header.new_public_key != client_state.consensus_state.public_key,
        ClientError::InvalidHeader {
            reason: "new public key in header equals current public key".to_string(),
        }
    );

    let consensus_state = ConsensusState {
        public_key: header.new_public_key.clone(),
        diversifier: header.new_diversifier.clone(),
        timestamp: header.timestamp,
    };
    let client_state = ClientState {
        sequence: header.sequence,
        frozen_sequence: 0,
        consensus_state: consensus_state.clone(),
        ..client_state.clone()
    };
    Ok((client_state, consensus_state))
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::test_utils::TestSigner;

    use super::*;
    use crate::{proto::DataType, test_utils::TestSoloMachine};

    mod header {
        use super::*;

        #[test]
        fn rotates_key_and_diversifier() {
            let solo = TestSoloMachine::secp256k1(1);
            let next = TestSigner::ed25519(2);
            let header = solo.create_header(&next, "rotated");

            let (client_state, consensus_state) =
                check_header_and_update_state(&solo.client_state(), &header).unwrap();
            assert_eq!(client_state.sequence, solo.sequence + 1);
            assert_eq!(consensus_state.public_key, next.public_key());
            assert_eq!(consensus_state.diversifier, "rotated");
            assert_eq!(consensus_state.timestamp, header.timestamp);
            assert_eq!(client_state.consensus_state, consensus_state);
        }

        #[test]
        fn rotates_multisig_key() {
            let solo = TestSoloMachine::multisig(2, 3);
            let header = solo.create_header(&TestSigner::secp256k1(5), "testing");
            check_header_and_update_state(&solo.client_state(), &header).unwrap();
        }

        #[test]
        fn rejects_wrong_sequence() {
            let solo = TestSoloMachine::secp256k1(1);
            let mut header = solo.create_header(&TestSigner::ed25519(2), "testing");
            header.sequence += 1;
            assert!(matches!(
                check_header_and_update_state(&solo.client_state(), &header),
                Err(ClientError::InvalidHeader { reason }) if reason.contains("sequence")
            ));
        }

        #[test]
        fn rejects_exhausted_sequence() {
            let solo = TestSoloMachine {
                sequence: u64::MAX,
                ..TestSoloMachine::secp256k1(1)
            };
            let header = solo.create_header(&TestSigner::ed25519(2), "testing");
            assert!(matches!(
                check_header_and_update_state(&solo.client_state(), &header),
                Err(ClientError::InvalidHeader { reason }) if reason.contains("advanced")
            ));
        }

        #[test]
        fn rejects_old_timestamp() {
            let mut solo = TestSoloMachine::secp256k1(1);
            let header = solo.create_header(&TestSigner::ed25519(2), "testing");
            solo.timestamp = header.timestamp + 1;
            assert!(matches!(
                check_header_and_update_state(&solo.client_state(), &header),
                Err(ClientError::InvalidHeader { reason }) if reason.contains("timestamp")
            ));
        }

        #[test]
        fn rejects_tampered_rotation() {
            let solo = TestSoloMachine::secp256k1(1);
            let mut header = solo.create_header(&TestSigner::ed25519(2), "testing");
            header.new_public_key = TestSigner::ed25519(3).public_key();
            assert!(matches!(
                check_header_and_update_state(&solo.client_state(), &header),
                Err(ClientError::InvalidHeader { reason }) if reason.contains("signature")
            ));
        }

        #[test]
        fn rejects_header_signed_by_other_key() {
            let solo = TestSoloMachine::secp256k1(1);
            let impostor = TestSoloMachine::new(TestSigner::secp256k1(7));
            let header = impostor.create_header(&TestSigner::ed25519(2), "testing");
            assert!(check_header_and_update_state(&solo.client_state(), &header).is_err());
        }
    }

    mod misbehaviour {
        use super::*;

        #[test]
        fn freezes_at_misbehaviour_sequence() {
            let solo = TestSoloMachine::ed25519(1);
            let misbehaviour = solo.create_misbehaviour("06-solomachine-0");

            let client_state =
                check_misbehaviour_and_update_state(&solo.client_state(), &misbehaviour).unwrap();
            assert_eq!(client_state.frozen_sequence, misbehaviour.sequence);
            assert!(client_state.is_frozen());
        }

        #[test]
        fn rejects_already_frozen_client() {
            let solo = TestSoloMachine::ed25519(1);
            let mut client_state = solo.client_state();
            client_state.frozen_sequence = 1;
            let res = check_misbehaviour_and_update_state(
                &client_state,
                &solo.create_misbehaviour("06-solomachine-0"),
            );
            assert!(matches!(res, Err(ClientError::ClientFrozen)));
        }

        #[test]
        fn rejects_signature_older_than_consensus_state() {
            let solo = TestSoloMachine::ed25519(1);
            let mut misbehaviour = solo.create_misbehaviour("06-solomachine-0");
            misbehaviour.signature_two.timestamp = solo.timestamp - 1;
            let res = check_misbehaviour_and_update_state(&solo.client_state(), &misbehaviour);
            assert!(matches!(res, Err(ClientError::InvalidMisbehaviour { .. })));
        }

        #[test]
        fn rejects_data_of_wrong_type() {
            let solo = TestSoloMachine::ed25519(1);
            let mut misbehaviour = solo.create_misbehaviour("06-solomachine-0");
            misbehaviour.signature_one.data_type = DataType::Header;
            let res = check_misbehaviour_and_update_state(&solo.client_state(), &misbehaviour);
            assert!(res.is_err());
        }

        #[test]
        fn rejects_signature_by_other_key() {
            let solo = TestSoloMachine::ed25519(1);
            let impostor = TestSoloMachine::new(TestSigner::ed25519(8));
            let misbehaviour = impostor.create_misbehaviour("06-solomachine-0");
            let res = check_misbehaviour_and_update_state(&solo.client_state(), &misbehaviour);
            assert!(matches!(res, Err(ClientError::SignatureVerificationFailed { .. })));
        }
    }

    mod proposal {
        use super::*;

        #[test]
        fn substitute_requires_allowance() {
            let subject = TestSoloMachine::secp256k1(1).client_state();
            let substitute = TestSoloMachine::ed25519(2).client_state();
            assert!(matches!(
                check_substitute_and_update_state(&subject, &substitute),
                Err(ClientError::UpdateClientFailed { .. })
            ));
        }

        #[test]
        fn substitute_replaces_key_and_unfreezes() {
            let mut subject = TestSoloMachine::secp256k1(1).client_state();
            subject.allow_update_after_proposal = true;
            subject.frozen_sequence = 1;
            let mut substitute = TestSoloMachine::ed25519(2).client_state();
            substitute.sequence = 9;

            let updated = check_substitute_and_update_state(&subject, &substitute).unwrap();
            assert_eq!(updated.sequence, 9);
            assert_eq!(updated.frozen_sequence, 0);
            assert_eq!(updated.consensus_state, substitute.consensus_state);
            assert!(updated.allow_update_after_proposal);
        }

        #[test]
        fn substitute_must_change_key() {
            let mut subject = TestSoloMachine::secp256k1(1).client_state();
            subject.allow_update_after_proposal = true;
            let substitute = TestSoloMachine::secp256k1(1).client_state();
            assert!(matches!(
                check_substitute_and_update_state(&subject, &substitute),
                Err(ClientError::InvalidHeader { .. })
            ));
        }

        #[test]
        fn proposed_header_replaces_key_without_signature() {
            let solo = TestSoloMachine::secp256k1(1);
            let mut client_state = solo.client_state();
            client_state.allow_update_after_proposal = true;
            client_state.frozen_sequence = 1;
            let mut header = solo.create_header(&TestSigner::ed25519(2), "rescued");
            header.sequence = 20;
            header.signature = vec![1];

            let (updated, consensus_state) =
                check_proposed_header_and_update_state(&client_state, &header).unwrap();
            assert_eq!(updated.sequence, 20);
            assert!(!updated.is_frozen());
            assert_eq!(consensus_state.diversifier, "rescued");

            client_state.allow_update_after_proposal = false;
            assert!(matches!(
                check_proposed_header_and_update_state(&client_state, &header),
                Err(ClientError::UpdateClientFailed { .. })
            ));
        }

        #[test]
        fn proposed_header_must_change_key() {
            let solo = TestSoloMachine::secp256k1(1);
            let mut client_state = solo.client_state();
            client_state.allow_update_after_proposal = true;
            let header = solo.create_header(&TestSigner::secp256k1(1), "testing");
            assert!(matches!(
                check_proposed_header_and_update_state(&client_state, &header),
                Err(ClientError::InvalidHeader { .. })
            ));
        }
    }
}
