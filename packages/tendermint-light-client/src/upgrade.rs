//! Verification of a client upgrade committed by the counterparty chain

use ibc_light_client_core::{
    client::{ClientStateCommon, ConsensusStateCommon},
    commitment::{MerklePath, MerkleProof},
    store::Store,
    ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;

use crate::{client_state::ClientState, update::load_consensus_state};

/// Verifies that the counterparty committed `upgraded` under its upgrade path at
/// `upgrade_height`, and returns the client state that replaces `client_state`.
///
/// The counterparty only commits the chain chosen fields. The client chosen fields of the
/// upgraded client must be those of the current one.
///
/// # Errors
/// Returns [`ClientError::InvalidUpgradeClient`] if upgrades are disabled or the proof is
/// empty, [`ClientError::InvalidHeight`] if the upgraded client is not newer,
/// [`ClientError::InvalidProof`] if the proof does not decode and
/// [`ClientError::InvalidClient`] if the latest consensus state is expired, the upgraded
/// client does not match what was committed or the proof does not verify.
pub fn verify_upgrade(
    client_state: &ClientState,
    store: &dyn Store,
    upgraded: &ClientState,
    upgrade_height: Height,
    proof: &[u8],
    now_ns: u64,
) -> Result<ClientState, ClientError> {
    let key_path = client_state.upgrade_key_path(upgrade_height)?;
    ensure!(
        upgraded.latest_height > client_state.latest_height,
        ClientError::InvalidHeight {
            reason: format!(
                "upgraded client height {} must be greater than current client height {}",
                upgraded.latest_height, client_state.latest_height
            ),
        }
    );
    ensure!(
        !proof.is_empty(),
        ClientError::InvalidUpgradeClient {
            reason: "proof of upgraded client cannot be empty".to_string(),
        }
    );
    let proof = MerkleProof::decode(proof)?;

    let committed = upgraded.zero_custom_fields();

    let latest = load_consensus_state(store, client_state.latest_height)?;
    ensure!(
        !client_state.is_expired(latest.timestamp(), now_ns),
        ClientError::InvalidClient {
            reason: "cannot upgrade an expired client".to_string(),
        }
    );

    let expected = ClientState {
        trust_level: client_state.trust_level,
        trusting_period: client_state.trusting_period,
        max_clock_drift: client_state.max_clock_drift,
        allow_update_after_expiry: client_state.allow_update_after_expiry,
        allow_update_after_misbehaviour: client_state.allow_update_after_misbehaviour,
        ..committed.clone()
    };
    ensure!(
        expected.to_any() == upgraded.to_any(),
        ClientError::InvalidClient {
            reason: "upgraded client does not keep the client chosen parameters".to_string(),
        }
    );

    proof
        .verify_membership(
            &client_state.proof_specs,
            &latest.root,
            &MerklePath::new(key_path),
            &committed.to_any().encode_to_vec(),
        )
        .map_err(|e| ClientError::InvalidClient {
            reason: format!("upgraded client is not committed under the upgrade path: {e}"),
        })?;

    Ok(expected)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ibc_light_client_core::{
        store::{set_consensus_state, MemoryStore},
        test_utils::membership_proof,
    };

    use super::*;
    use crate::{test_utils::TestChain, TrustLevel};

    const UPGRADE_HEIGHT: u64 = 11;

    struct Setup {
        client_state: ClientState,
        store: MemoryStore,
        upgraded: ClientState,
        proof: Vec<u8>,
        now: u64,
    }

    /// A `gaia-1` client at height 10 and the `gaia-2` client its chain committed to.
    fn setup() -> Setup {
        let chain = TestChain::new("gaia-1");
        let mut client_state = chain.client_state(10);
        client_state.allow_update_after_expiry = true;

        let upgraded = ClientState {
            chain_id: "gaia-2".to_string(),
            latest_height: Height::new(2, 1),
            unbonding_period: Duration::from_secs(28 * 24 * 3600),
            ..client_state.clone()
        };
        let committed = upgraded.zero_custom_fields().to_any().encode_to_vec();
        let key_path = client_state
            .upgrade_key_path(Height::new(1, UPGRADE_HEIGHT))
            .unwrap();
        let (root, proof) = membership_proof(&MerklePath::new(key_path), &committed);

        let mut consensus_state = chain.consensus_state_at(10);
        consensus_state.root = root;
        let mut store = MemoryStore::new();
        set_consensus_state(&mut store, chain.height(10), &consensus_state.to_any());

        Setup {
            client_state,
            store,
            upgraded,
            proof,
            now: chain.now_after(10),
        }
    }

    fn verify(s: &Setup) -> Result<ClientState, ClientError> {
        verify_upgrade(
            &s.client_state,
            &s.store,
            &s.upgraded,
            Height::new(1, UPGRADE_HEIGHT),
            &s.proof,
            s.now,
        )
    }

    #[test]
    fn accepts_committed_upgrade() {
        let s = setup();
        let upgraded = verify(&s).unwrap();
        assert_eq!(upgraded, s.upgraded);

        assert_eq!(upgraded.trust_level, s.client_state.trust_level);
        assert_eq!(upgraded.trusting_period, s.client_state.trusting_period);
        assert_eq!(upgraded.max_clock_drift, s.client_state.max_clock_drift);
        assert!(upgraded.allow_update_after_expiry);

        assert_eq!(upgraded.chain_id, "gaia-2");
        assert_eq!(upgraded.latest_height, Height::new(2, 1));
        assert_eq!(upgraded.unbonding_period, Duration::from_secs(28 * 24 * 3600));
    }

    #[test]
    fn rejects_changed_chain_id() {
        let mut s = setup();
        s.upgraded.chain_id = "evil-2".to_string();
        assert!(matches!(verify(&s), Err(ClientError::InvalidClient { .. })));
    }

    #[test]
    fn rejects_changed_client_chosen_parameters() {
        let mut s = setup();
        s.upgraded.trust_level = TrustLevel {
            numerator: 1,
            denominator: 2,
        };
        assert!(matches!(
            verify(&s),
            Err(ClientError::InvalidClient { reason }) if reason.contains("client chosen")
        ));
    }

    #[test]
    fn rejects_disabled_upgrades() {
        let mut s = setup();
        s.client_state.upgrade_path.clear();
        assert!(matches!(
            verify(&s),
            Err(ClientError::InvalidUpgradeClient { .. })
        ));
    }

    #[test]
    fn rejects_older_upgraded_client() {
        let mut s = setup();
        s.upgraded.latest_height = Height::new(1, 10);
        assert!(matches!(verify(&s), Err(ClientError::InvalidHeight { .. })));
    }

    #[test]
    fn rejects_empty_proof() {
        let mut s = setup();
        s.proof.clear();
        assert!(matches!(
            verify(&s),
            Err(ClientError::InvalidUpgradeClient { .. })
        ));
    }

    #[test]
    fn rejects_malformed_proof() {
        let mut s = setup();
        s.proof = vec![0xff; 4];
        assert!(matches!(verify(&s), Err(ClientError::InvalidProof { .. })));
    }

    #[test]
    fn rejects_expired_client() {
        let mut s = setup();
        s.now += u64::try_from(s.client_state.trusting_period.as_nanos()).unwrap();
        assert!(matches!(
            verify(&s),
            Err(ClientError::InvalidClient { reason }) if reason.contains("expired")
        ));
    }

    #[test]
    fn rejects_missing_consensus_state() {
        let mut s = setup();
        s.store = MemoryStore::new();
        assert!(matches!(
            verify(&s),
            Err(ClientError::ConsensusStateNotFound { .. })
        ));
    }
}
