//! Membership verification against the solo machine key

use ibc_light_client_core::{
    client::{ClientStateCommon, CommitmentTarget},
    commitment::{apply_prefix, MerklePrefix},
    crypto::{verify_signature, SignatureData},
    ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{
    client_state::ClientState,
    proto::RawTimestampedSignatureData,
    sign_bytes::{sign_bytes, SignData},
};

/// A signature over a committed value, together with the time it was produced at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampedSignatureData {
    /// Signature over the sign bytes
    pub signature_data: SignatureData,
    /// Time the signature was produced at in nanoseconds
    pub timestamp: u64,
}

impl TimestampedSignatureData {
    /// Decodes a solo machine proof.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] if the proof is empty or does not decode.
    pub fn decode(proof: &[u8]) -> Result<Self, ClientError> {
        ensure!(
            !proof.is_empty(),
            ClientError::InvalidProof {
                reason: "proof cannot be empty".to_string(),
            }
        );
        let raw = RawTimestampedSignatureData::decode(proof).map_err(|e| {
            ClientError::InvalidProof {
                reason: format!("failed to decode timestamped signature data: {e}"),
            }
        })?;
        ensure!(
            !raw.signature_data.is_empty(),
            ClientError::InvalidProof {
                reason: "signature data cannot be empty".to_string(),
            }
        );
        let signature_data =
            SignatureData::decode(&raw.signature_data).map_err(|e| ClientError::InvalidProof {
                reason: format!("failed to decode signature data: {e}"),
            })?;
        Ok(Self {
            signature_data,
            timestamp: raw.timestamp,
        })
    }

    /// Encodes the proof.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        RawTimestampedSignatureData {
            signature_data: self.signature_data.encode_to_vec(),
            timestamp: self.timestamp,
        }
        .encode_to_vec()
    }
}

/// Verifies that the solo machine signed `target` at the sequence given by `height`.
///
/// On success the sequence is consumed and the consensus timestamp advances to the proof
/// timestamp. The caller persists the updated client state.
///
/// # Errors
/// Returns an error if the client is frozen, the height or proof is malformed or the
/// signature does not verify.
pub fn verify_commitment(
    client_state: &mut ClientState,
    height: Height,
    prefix: &MerklePrefix,
    proof: &[u8],
    target: &CommitmentTarget,
) -> Result<(), ClientError> {
    ensure!(
        height.revision_number == 0,
        ClientError::InvalidHeight {
            reason: format!("revision must be 0 for solo machine, got {height}"),
        }
    );
    ensure!(!client_state.is_frozen(), ClientError::ClientFrozen);
    ensure!(
        !prefix.is_empty(),
        ClientError::InvalidPrefix {
            reason: "prefix cannot be empty".to_string(),
        }
    );
    let proof = TimestampedSignatureData::decode(proof)?;

    let sequence = height.revision_height;
    ensure!(
        client_state.sequence >= sequence,
        ClientError::InvalidHeight {
            reason: format!(
                "client state sequence {} is smaller than proof sequence {sequence}",
                client_state.sequence
            ),
        }
    );
    ensure!(
        client_state.consensus_state.timestamp <= proof.timestamp,
        ClientError::InvalidProof {
            reason: format!(
                "consensus state timestamp {} is greater than signature timestamp {}",
                client_state.consensus_state.timestamp, proof.timestamp
            ),
        }
    );

    let next_sequence = client_state
        .sequence
        .checked_add(1)
        .ok_or_else(|| ClientError::InvalidHeight {
            reason: format!("sequence {} cannot be advanced", client_state.sequence),
        })?;

    let path = apply_prefix(prefix, target.path())?;
    let data = SignData::from_target(&path, target);
    let sign_bytes = sign_bytes(
        sequence,
        proof.timestamp,
        &client_state.consensus_state.diversifier,
        &data,
    );
    verify_signature(
        &client_state.consensus_state.public_key,
        &sign_bytes,
        &proof.signature_data,
    )?;

    client_state.sequence = next_sequence;
    client_state.consensus_state.timestamp = proof.timestamp;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::{test_utils::TestSigner, Any};
    use rstest::rstest;

    use super::*;
    use crate::test_utils::TestSoloMachine;

    fn prefix() -> MerklePrefix {
        MerklePrefix::new(b"ibc".to_vec())
    }

    fn connection() -> CommitmentTarget {
        CommitmentTarget::Connection {
            connection_id: "connection-0".to_string(),
            connection_end: b"connection end".to_vec(),
        }
    }

    fn receipt_absence() -> CommitmentTarget {
        CommitmentTarget::PacketReceiptAbsence {
            port_id: "transfer".to_string(),
            channel_id: "channel-0".to_string(),
            sequence: 1,
        }
    }

    fn client_state_target() -> CommitmentTarget {
        CommitmentTarget::ClientState {
            client_id: "07-tendermint-0".to_string(),
            client_state: Any {
                type_url: "/counterparty".to_string(),
                value: vec![1, 2, 3],
            },
        }
    }

    #[rstest]
    #[case::secp256k1(TestSoloMachine::secp256k1(1))]
    #[case::ed25519(TestSoloMachine::ed25519(2))]
    #[case::multisig(TestSoloMachine::multisig(2, 3))]
    fn verifies_and_consumes_sequence(#[case] solo: TestSoloMachine) {
        for target in [connection(), receipt_absence(), client_state_target()] {
            let mut client_state = solo.client_state();
            let proof = solo.sign_target(&prefix(), &target, solo.timestamp + 5);
            verify_commitment(
                &mut client_state,
                solo.height(),
                &prefix(),
                &proof,
                &target,
            )
            .unwrap();
            assert_eq!(client_state.sequence, solo.sequence + 1);
            assert_eq!(client_state.consensus_state.timestamp, solo.timestamp + 5);
        }
    }

    #[test]
    fn proof_cannot_be_replayed() {
        let solo = TestSoloMachine::secp256k1(1);
        let mut client_state = solo.client_state();
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        verify_commitment(&mut client_state, solo.height(), &prefix(), &proof, &connection())
            .unwrap();

        let next = Height::new(0, client_state.sequence);
        let res = verify_commitment(&mut client_state, next, &prefix(), &proof, &connection());
        assert!(matches!(res, Err(ClientError::SignatureVerificationFailed { .. })));
    }

    #[test]
    fn rejects_exhausted_sequence() {
        let solo = TestSoloMachine {
            sequence: u64::MAX,
            ..TestSoloMachine::secp256k1(1)
        };
        let mut client_state = solo.client_state();
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let res =
            verify_commitment(&mut client_state, solo.height(), &prefix(), &proof, &connection());
        assert!(matches!(res, Err(ClientError::InvalidHeight { .. })));
        assert_eq!(client_state, solo.client_state());
    }

    #[test]
    fn rejects_value_that_was_not_signed() {
        let solo = TestSoloMachine::ed25519(2);
        let mut client_state = solo.client_state();
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let other = CommitmentTarget::Connection {
            connection_id: "connection-0".to_string(),
            connection_end: b"other end".to_vec(),
        };
        let res = verify_commitment(&mut client_state, solo.height(), &prefix(), &proof, &other);
        assert!(matches!(res, Err(ClientError::SignatureVerificationFailed { .. })));
        assert_eq!(client_state, solo.client_state());
    }

    #[test]
    fn rejects_signature_from_other_key() {
        let solo = TestSoloMachine::secp256k1(1);
        let impostor = TestSoloMachine::new(TestSigner::secp256k1(9));
        let mut client_state = solo.client_state();
        let proof = impostor.sign_target(&prefix(), &connection(), solo.timestamp);
        let res =
            verify_commitment(&mut client_state, solo.height(), &prefix(), &proof, &connection());
        assert!(matches!(res, Err(ClientError::SignatureVerificationFailed { .. })));
    }

    #[test]
    fn rejects_nonzero_revision() {
        let solo = TestSoloMachine::secp256k1(1);
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let res = verify_commitment(
            &mut solo.client_state(),
            Height::new(1, solo.sequence),
            &prefix(),
            &proof,
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidHeight { .. })));
    }

    #[test]
    fn rejects_frozen_client() {
        let solo = TestSoloMachine::secp256k1(1);
        let mut client_state = solo.client_state();
        client_state.frozen_sequence = 1;
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let res =
            verify_commitment(&mut client_state, solo.height(), &prefix(), &proof, &connection());
        assert!(matches!(res, Err(ClientError::ClientFrozen)));
    }

    #[test]
    fn rejects_empty_prefix_and_proof() {
        let solo = TestSoloMachine::secp256k1(1);
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let res = verify_commitment(
            &mut solo.client_state(),
            solo.height(),
            &MerklePrefix::default(),
            &proof,
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidPrefix { .. })));

        let res = verify_commitment(
            &mut solo.client_state(),
            solo.height(),
            &prefix(),
            &[],
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidProof { .. })));

        let res = verify_commitment(
            &mut solo.client_state(),
            solo.height(),
            &prefix(),
            &[0xff, 0xff],
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
    }

    #[test]
    fn rejects_sequence_ahead_of_client() {
        let solo = TestSoloMachine::secp256k1(1);
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp);
        let res = verify_commitment(
            &mut solo.client_state(),
            Height::new(0, solo.sequence + 1),
            &prefix(),
            &proof,
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidHeight { .. })));
    }

    #[test]
    fn rejects_proof_older_than_consensus_state() {
        let solo = TestSoloMachine::secp256k1(1);
        let proof = solo.sign_target(&prefix(), &connection(), solo.timestamp - 1);
        let res = verify_commitment(
            &mut solo.client_state(),
            solo.height(),
            &prefix(),
            &proof,
            &connection(),
        );
        assert!(matches!(res, Err(ClientError::InvalidProof { reason }) if reason.contains("timestamp")));
    }
}
