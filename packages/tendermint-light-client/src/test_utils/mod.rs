//! Test utilities for the tendermint client

#[cfg(any(test, feature = "test-utils"))]
pub use fixtures::*;

#[allow(missing_docs, clippy::missing_panics_doc)]
#[cfg(any(test, feature = "test-utils"))]
mod fixtures {
    use std::time::Duration;

    use ibc_light_client_core::{
        client::ConsensusStateCommon,
        commitment::MerkleRoot,
        identifier::parse_chain_id,
        store::{set_consensus_state, MemoryStore},
        test_utils::proof_specs,
        Height,
    };
    use sha2::{Digest, Sha256};
    use tendermint::{validator::Set as ValidatorSet, AppHash, Time};
    use tendermint_testgen::{
        light_block::TmLightBlock, Generator, Header as TestgenHeader,
        LightBlock as TestgenLightBlock, Validator,
    };

    use crate::{ClientState, ConsensusState, Header, TrustLevel};

    pub const CHAIN_ID: &str = "testchain";
    pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
    /// Time of block 0, every block is ten seconds after the previous one.
    pub const GENESIS_TIME_SECS: u64 = 1_700_000_000;
    pub const BLOCK_INTERVAL_SECS: u64 = 10;

    /// A valid client state tracking [`CHAIN_ID`] at `latest_height`.
    #[must_use]
    pub fn client_state(latest_height: Height) -> ClientState {
        ClientState {
            chain_id: CHAIN_ID.to_string(),
            trust_level: TrustLevel::ONE_THIRD,
            trusting_period: Duration::from_secs(14 * 24 * 3600),
            unbonding_period: Duration::from_secs(21 * 24 * 3600),
            max_clock_drift: Duration::from_secs(10),
            frozen_height: Height::default(),
            latest_height,
            proof_specs: proof_specs(),
            upgrade_path: vec!["upgrade".to_string(), "upgradedIBCState".to_string()],
            allow_update_after_expiry: false,
            allow_update_after_misbehaviour: false,
        }
    }

    /// A valid consensus state created `secs` seconds after the unix epoch.
    #[must_use]
    pub fn consensus_state(secs: u64) -> ConsensusState {
        ConsensusState {
            timestamp: time_from_secs(secs),
            root: MerkleRoot::new(Sha256::digest(b"root").to_vec()),
            next_validators_hash: TestChain::default().validator_set().hash(),
        }
    }

    #[must_use]
    pub fn time_from_secs(secs: u64) -> Time {
        Time::from_unix_timestamp(i64::try_from(secs).expect("small time"), 0).expect("valid time")
    }

    #[must_use]
    pub fn nanos(time: Time) -> u64 {
        u64::try_from(time.unix_timestamp_nanos()).expect("time after epoch")
    }

    /// A chain of blocks signed by a fixed validator set.
    #[derive(Clone, Debug)]
    pub struct TestChain {
        pub chain_id: String,
        pub validators: Vec<Validator>,
    }

    impl Default for TestChain {
        fn default() -> Self {
            Self::new(CHAIN_ID)
        }
    }

    impl TestChain {
        #[must_use]
        pub fn new(chain_id: &str) -> Self {
            Self {
                chain_id: chain_id.to_string(),
                validators: vec![
                    Validator::new("1").voting_power(50),
                    Validator::new("2").voting_power(50),
                ],
            }
        }

        /// The default chain signed by a disjoint validator set.
        #[must_use]
        pub fn other_validators() -> Self {
            Self {
                validators: vec![
                    Validator::new("3").voting_power(40),
                    Validator::new("4").voting_power(60),
                ],
                ..Self::default()
            }
        }

        #[must_use]
        pub fn revision(&self) -> u64 {
            parse_chain_id(&self.chain_id)
        }

        #[must_use]
        pub fn height(&self, revision_height: u64) -> Height {
            Height::new(self.revision(), revision_height)
        }

        #[must_use]
        pub fn validator_set(&self) -> ValidatorSet {
            ValidatorSet::without_proposer(
                self.validators
                    .iter()
                    .map(|v| v.generate().expect("valid validator"))
                    .collect(),
            )
        }

        #[must_use]
        pub fn time_at(&self, height: u64) -> Time {
            time_from_secs(GENESIS_TIME_SECS + height * BLOCK_INTERVAL_SECS)
        }

        /// Host time shortly after the block at `height`.
        #[must_use]
        pub fn now_after(&self, height: u64) -> u64 {
            nanos(self.time_at(height)) + 5 * NANOS_PER_SECOND
        }

        #[must_use]
        pub fn light_block(&self, height: u64) -> TmLightBlock {
            self.light_block_at(height, self.time_at(height))
        }

        #[must_use]
        pub fn light_block_at(&self, height: u64, time: Time) -> TmLightBlock {
            let app_hash = AppHash::try_from(Sha256::digest(height.to_be_bytes()).to_vec())
                .expect("valid app hash");
            let header = TestgenHeader::new(&self.validators)
                .next_validators(&self.validators)
                .chain_id(&self.chain_id)
                .height(height)
                .time(time)
                .app_hash(app_hash);
            TestgenLightBlock::new_default_with_header(header)
                .generate()
                .expect("valid light block")
        }

        /// A header at `height` trusting the block at `trusted_height`.
        #[must_use]
        pub fn header(&self, height: u64, trusted_height: u64) -> Header {
            self.header_at(height, trusted_height, self.time_at(height))
        }

        /// Like [`Self::header`], with the block time overridden.
        #[must_use]
        pub fn header_at(&self, height: u64, trusted_height: u64, time: Time) -> Header {
            let block = self.light_block_at(height, time);
            Header {
                signed_header: block.signed_header,
                validator_set: block.validators,
                trusted_height: self.height(trusted_height),
                trusted_validators: self.light_block(trusted_height).next_validators,
            }
        }

        #[must_use]
        pub fn consensus_state_at(&self, height: u64) -> ConsensusState {
            let block = self.light_block(height);
            let header = block.signed_header.header();
            ConsensusState {
                timestamp: header.time,
                root: MerkleRoot::new(header.app_hash.as_bytes().to_vec()),
                next_validators_hash: header.next_validators_hash,
            }
        }

        /// A client state of this chain at `latest_height`.
        #[must_use]
        pub fn client_state(&self, latest_height: u64) -> ClientState {
            ClientState {
                chain_id: self.chain_id.clone(),
                ..client_state(self.height(latest_height))
            }
        }

        /// A store holding this chain's consensus states at `heights`.
        #[must_use]
        pub fn store_with(&self, heights: &[u64]) -> MemoryStore {
            let mut store = MemoryStore::new();
            for height in heights {
                set_consensus_state(
                    &mut store,
                    self.height(*height),
                    &self.consensus_state_at(*height).to_any(),
                );
            }
            store
        }
    }
}
