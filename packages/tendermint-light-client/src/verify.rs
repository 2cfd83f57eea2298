//! Membership verification against the app hash of a stored consensus state

use ibc_light_client_core::{
    client::{ClientStateCommon, CommitmentTarget, DelayPeriod},
    commitment::{apply_prefix, verify_membership, verify_non_membership, MerklePrefix},
    store::{get_processed_time, Store},
    ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use sha2::{Digest, Sha256};

use crate::{client_state::ClientState, update::load_consensus_state};

/// The bytes a chain stores under the path of `target`, `None` for absence proofs.
///
/// Acknowledgements are stored hashed and sequences as big-endian integers.
#[must_use]
pub fn committed_value(target: &CommitmentTarget) -> Option<Vec<u8>> {
    match target {
        CommitmentTarget::ClientState { client_state, .. } => Some(client_state.encode_to_vec()),
        CommitmentTarget::ConsensusState {
            consensus_state, ..
        } => Some(consensus_state.encode_to_vec()),
        CommitmentTarget::Connection { connection_end, .. } => Some(connection_end.clone()),
        CommitmentTarget::Channel { channel_end, .. } => Some(channel_end.clone()),
        CommitmentTarget::PacketCommitment { commitment, .. } => Some(commitment.clone()),
        CommitmentTarget::PacketAcknowledgement {
            acknowledgement, ..
        } => Some(Sha256::digest(acknowledgement).to_vec()),
        CommitmentTarget::PacketReceiptAbsence { .. } => None,
        CommitmentTarget::NextSequenceRecv {
            next_sequence_recv, ..
        } => Some(next_sequence_recv.to_be_bytes().to_vec()),
    }
}

/// Checks that the consensus state at `height` was stored at least `delay_period_ns` ago.
fn verify_delay_period_passed(
    store: &dyn Store,
    height: Height,
    delay: DelayPeriod,
) -> Result<(), ClientError> {
    let processed_time =
        get_processed_time(store, height).ok_or(ClientError::ProcessedTimeNotFound { height })?;
    let valid_after = processed_time.saturating_add(delay.delay_period_ns);
    ensure!(
        valid_after <= delay.current_timestamp_ns,
        ClientError::DelayPeriodNotPassed {
            reason: format!(
                "cannot verify packet until time {valid_after}, current time {}",
                delay.current_timestamp_ns
            ),
        }
    );
    Ok(())
}

/// Verifies that the counterparty committed `target` in its state at `height`.
///
/// Packet targets additionally wait for `delay` to pass since the consensus state was stored.
///
/// # Errors
/// Returns [`ClientError::ClientFrozen`] if the client is frozen,
/// [`ClientError::InvalidHeight`] if `height` is beyond the latest height,
/// [`ClientError::ConsensusStateNotFound`] if no consensus state is stored at `height`, a
/// delay period error, and [`ClientError::InvalidPrefix`] or [`ClientError::InvalidProof`]
/// if the proof does not verify.
pub fn verify_commitment(
    client_state: &ClientState,
    store: &dyn Store,
    height: Height,
    prefix: &MerklePrefix,
    proof: &[u8],
    target: &CommitmentTarget,
    delay: Option<DelayPeriod>,
) -> Result<(), ClientError> {
    ensure!(!client_state.is_frozen(), ClientError::ClientFrozen);
    ensure!(
        height <= client_state.latest_height,
        ClientError::InvalidHeight {
            reason: format!(
                "client latest height {} is less than proof height {height}",
                client_state.latest_height
            ),
        }
    );
    ensure!(
        !prefix.is_empty(),
        ClientError::InvalidPrefix {
            reason: "prefix cannot be empty".to_string(),
        }
    );
    ensure!(
        !proof.is_empty(),
        ClientError::InvalidProof {
            reason: "proof cannot be empty".to_string(),
        }
    );

    let consensus_state = load_consensus_state(store, height)?;

    if let Some(delay) = delay.filter(|d| target.is_packet() && d.delay_period_ns > 0) {
        verify_delay_period_passed(store, height, delay)?;
    }

    let path = apply_prefix(prefix, target.path())?;
    match committed_value(target) {
        Some(value) => verify_membership(
            &client_state.proof_specs,
            &consensus_state.root,
            &path,
            &value,
            proof,
        ),
        None => verify_non_membership(
            &client_state.proof_specs,
            &consensus_state.root,
            &path,
            proof,
        ),
    }
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::{
        client::ConsensusStateCommon,
        commitment::MerklePath,
        store::{set_consensus_state, set_processed_time, MemoryStore},
        test_utils::{membership_proof, non_membership_proof},
        Any,
    };
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{TestChain, NANOS_PER_SECOND};

    const PROOF_HEIGHT: u64 = 10;
    const PROCESSED_TIME: u64 = 1_000 * NANOS_PER_SECOND;

    fn prefix() -> MerklePrefix {
        MerklePrefix::new(b"ibc".to_vec())
    }

    /// A client at height 10 whose consensus state commits `path`, with the proof of it.
    fn setup(path: &MerklePath, value: Option<&[u8]>) -> (ClientState, MemoryStore, Vec<u8>) {
        let chain = TestChain::default();
        let (root, proof) = match value {
            Some(value) => membership_proof(path, value),
            None => non_membership_proof(path),
        };
        let mut consensus_state = chain.consensus_state_at(PROOF_HEIGHT);
        consensus_state.root = root;
        let mut store = MemoryStore::new();
        let height = chain.height(PROOF_HEIGHT);
        set_consensus_state(&mut store, height, &consensus_state.to_any());
        set_processed_time(&mut store, height, PROCESSED_TIME);
        (chain.client_state(PROOF_HEIGHT), store, proof)
    }

    fn targets() -> Vec<CommitmentTarget> {
        vec![
            CommitmentTarget::ClientState {
                client_id: "07-tendermint-0".to_string(),
                client_state: Any {
                    type_url: "/test.ClientState".to_string(),
                    value: b"client".to_vec(),
                },
            },
            CommitmentTarget::ConsensusState {
                client_id: "07-tendermint-0".to_string(),
                consensus_height: Height::new(0, 5),
                consensus_state: Any {
                    type_url: "/test.ConsensusState".to_string(),
                    value: b"consensus".to_vec(),
                },
            },
            CommitmentTarget::Connection {
                connection_id: "connection-0".to_string(),
                connection_end: b"connection".to_vec(),
            },
            CommitmentTarget::Channel {
                port_id: "transfer".to_string(),
                channel_id: "channel-0".to_string(),
                channel_end: b"channel".to_vec(),
            },
            CommitmentTarget::PacketCommitment {
                port_id: "transfer".to_string(),
                channel_id: "channel-0".to_string(),
                sequence: 1,
                commitment: vec![7; 32],
            },
            CommitmentTarget::PacketAcknowledgement {
                port_id: "transfer".to_string(),
                channel_id: "channel-0".to_string(),
                sequence: 1,
                acknowledgement: b"ack".to_vec(),
            },
            CommitmentTarget::NextSequenceRecv {
                port_id: "transfer".to_string(),
                channel_id: "channel-0".to_string(),
                next_sequence_recv: 3,
            },
        ]
    }

    fn verify(
        client_state: &ClientState,
        store: &MemoryStore,
        proof: &[u8],
        target: &CommitmentTarget,
    ) -> Result<(), ClientError> {
        verify_commitment(
            client_state,
            store,
            TestChain::default().height(PROOF_HEIGHT),
            &prefix(),
            proof,
            target,
            None,
        )
    }

    #[test]
    fn verifies_every_committed_value() {
        for target in targets() {
            let path = apply_prefix(&prefix(), target.path()).unwrap();
            let value = committed_value(&target).unwrap();
            let (client_state, store, proof) = setup(&path, Some(value.as_slice()));
            verify(&client_state, &store, &proof, &target).unwrap();
        }
    }

    #[test]
    fn acknowledgement_is_committed_hashed() {
        let target = &targets()[5];
        let CommitmentTarget::PacketAcknowledgement {
            acknowledgement, ..
        } = target
        else {
            panic!("expected an acknowledgement");
        };
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) = setup(&path, Some(acknowledgement.as_slice()));
        assert!(matches!(
            verify(&client_state, &store, &proof, target),
            Err(ClientError::InvalidProof { .. })
        ));
    }

    #[test]
    fn verifies_receipt_absence() {
        let target = CommitmentTarget::PacketReceiptAbsence {
            port_id: "transfer".to_string(),
            channel_id: "channel-0".to_string(),
            sequence: 2,
        };
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) = setup(&path, None);
        verify(&client_state, &store, &proof, &target).unwrap();

        let (_, _, membership) = setup(&path, Some(b"receipt".as_slice()));
        assert!(verify(&client_state, &store, &membership, &target).is_err());
    }

    #[test]
    fn rejects_wrong_value() {
        let target = &targets()[2];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) = setup(&path, Some(b"other connection".as_slice()));
        assert!(matches!(
            verify(&client_state, &store, &proof, target),
            Err(ClientError::InvalidProof { .. })
        ));
    }

    #[test]
    fn rejects_frozen_client() {
        let target = &targets()[0];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (mut client_state, store, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        client_state.frozen_height = Height::new(0, 1);
        assert!(matches!(
            verify(&client_state, &store, &proof, target),
            Err(ClientError::ClientFrozen)
        ));
    }

    #[test]
    fn rejects_height_beyond_latest() {
        let target = &targets()[0];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (mut client_state, store, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        client_state.latest_height = Height::new(0, PROOF_HEIGHT - 1);
        assert!(matches!(
            verify(&client_state, &store, &proof, target),
            Err(ClientError::InvalidHeight { .. })
        ));
    }

    #[test]
    fn rejects_missing_consensus_state() {
        let target = &targets()[0];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, _, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        assert!(matches!(
            verify(&client_state, &MemoryStore::new(), &proof, target),
            Err(ClientError::ConsensusStateNotFound { .. })
        ));
    }

    #[test]
    fn rejects_empty_prefix_and_proof() {
        let target = &targets()[0];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        let height = client_state.latest_height;

        let res = verify_commitment(
            &client_state,
            &store,
            height,
            &MerklePrefix::default(),
            &proof,
            target,
            None,
        );
        assert!(matches!(res, Err(ClientError::InvalidPrefix { .. })));

        let res = verify(&client_state, &store, &[], target);
        assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
    }

    #[rstest]
    #[case::elapsed(PROCESSED_TIME + 10, 10, true)]
    #[case::pending(PROCESSED_TIME + 9, 10, false)]
    #[case::no_delay(PROCESSED_TIME, 0, true)]
    fn packet_delay_period(#[case] now: u64, #[case] delay_period_ns: u64, #[case] ok: bool) {
        let target = &targets()[4];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        let delay = DelayPeriod {
            current_timestamp_ns: now,
            delay_period_ns,
        };

        let res = verify_commitment(
            &client_state,
            &store,
            client_state.latest_height,
            &prefix(),
            &proof,
            target,
            Some(delay),
        );
        if ok {
            res.unwrap();
        } else {
            assert!(matches!(res, Err(ClientError::DelayPeriodNotPassed { .. })));
        }
    }

    #[test]
    fn delay_period_requires_processed_time() {
        let target = &targets()[4];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, _, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        let mut store = MemoryStore::new();
        let consensus_state = {
            let (root, _) = membership_proof(&path, &committed_value(target).unwrap());
            let mut cs = TestChain::default().consensus_state_at(PROOF_HEIGHT);
            cs.root = root;
            cs
        };
        set_consensus_state(&mut store, client_state.latest_height, &consensus_state.to_any());

        let res = verify_commitment(
            &client_state,
            &store,
            client_state.latest_height,
            &prefix(),
            &proof,
            target,
            Some(DelayPeriod {
                current_timestamp_ns: u64::MAX,
                delay_period_ns: 1,
            }),
        );
        assert!(matches!(res, Err(ClientError::ProcessedTimeNotFound { .. })));
    }

    #[test]
    fn delay_period_ignored_for_connection_proofs() {
        let target = &targets()[2];
        let path = apply_prefix(&prefix(), target.path()).unwrap();
        let (client_state, store, proof) =
            setup(&path, Some(committed_value(target).unwrap().as_slice()));
        let res = verify_commitment(
            &client_state,
            &store,
            client_state.latest_height,
            &prefix(),
            &proof,
            target,
            Some(DelayPeriod {
                current_timestamp_ns: 0,
                delay_period_ns: u64::MAX,
            }),
        );
        res.unwrap();
    }
}
