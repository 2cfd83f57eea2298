//! Test utilities for the solo machine client

#[cfg(any(test, feature = "test-utils"))]
pub use fixtures::*;

#[allow(missing_docs, clippy::missing_panics_doc)]
#[cfg(any(test, feature = "test-utils"))]
mod fixtures {
    use ibc_light_client_core::{
        client::CommitmentTarget,
        commitment::{apply_prefix, MerklePrefix},
        crypto::{PublicKey, SignatureData},
        test_utils::{TestMultisig, TestSigner},
        Any, Height,
    };

    use crate::{
        client_state::ClientState,
        consensus_state::ConsensusState,
        header::Header,
        misbehaviour::{Misbehaviour, SignatureAndData},
        sign_bytes::{sign_bytes, SignData},
        verify::TimestampedSignatureData,
    };

    pub const DEFAULT_DIVERSIFIER: &str = "testing";
    pub const DEFAULT_TIMESTAMP: u64 = 10;

    #[derive(Clone, Debug)]
    pub enum SoloSigner {
        Single(TestSigner),
        Multi(TestMultisig),
    }

    /// A solo machine that signs with deterministic keys.
    #[derive(Clone, Debug)]
    pub struct TestSoloMachine {
        pub signer: SoloSigner,
        pub diversifier: String,
        pub sequence: u64,
        pub timestamp: u64,
    }

    impl TestSoloMachine {
        #[must_use]
        pub fn new(signer: TestSigner) -> Self {
            Self::with_signer(SoloSigner::Single(signer))
        }

        #[must_use]
        pub fn with_signer(signer: SoloSigner) -> Self {
            Self {
                signer,
                diversifier: DEFAULT_DIVERSIFIER.to_string(),
                sequence: 1,
                timestamp: DEFAULT_TIMESTAMP,
            }
        }

        #[must_use]
        pub fn secp256k1(seed: u8) -> Self {
            Self::new(TestSigner::secp256k1(seed))
        }

        #[must_use]
        pub fn ed25519(seed: u8) -> Self {
            Self::new(TestSigner::ed25519(seed))
        }

        #[must_use]
        pub fn multisig(threshold: u32, members: usize) -> Self {
            Self::with_signer(SoloSigner::Multi(TestMultisig::new(threshold, members)))
        }

        #[must_use]
        pub fn public_key(&self) -> PublicKey {
            match &self.signer {
                SoloSigner::Single(signer) => signer.public_key(),
                SoloSigner::Multi(multisig) => multisig.public_key(),
            }
        }

        /// Signs `msg`; a multisig signs with exactly its threshold of members.
        #[must_use]
        pub fn sign(&self, msg: &[u8]) -> SignatureData {
            match &self.signer {
                SoloSigner::Single(signer) => signer.sign_data(msg),
                SoloSigner::Multi(multisig) => {
                    let signing: Vec<usize> = (0..multisig.threshold as usize).collect();
                    multisig.sign_data(msg, &signing)
                }
            }
        }

        #[must_use]
        pub const fn height(&self) -> Height {
            Height::new(0, self.sequence)
        }

        #[must_use]
        pub fn consensus_state(&self) -> ConsensusState {
            ConsensusState {
                public_key: self.public_key(),
                diversifier: self.diversifier.clone(),
                timestamp: self.timestamp,
            }
        }

        #[must_use]
        pub fn client_state(&self) -> ClientState {
            ClientState {
                sequence: self.sequence,
                frozen_sequence: 0,
                consensus_state: self.consensus_state(),
                allow_update_after_proposal: false,
            }
        }

        /// A header rotating to `next` and `new_diversifier`, one nanosecond after the
        /// current timestamp.
        #[must_use]
        pub fn create_header(&self, next: &TestSigner, new_diversifier: &str) -> Header {
            let timestamp = self.timestamp + 1;
            let data = SignData::Header {
                new_public_key: next.public_key(),
                new_diversifier: new_diversifier.to_string(),
            };
            let bytes = sign_bytes(self.sequence, timestamp, new_diversifier, &data);
            Header {
                sequence: self.sequence,
                timestamp,
                signature: self.sign(&bytes).encode_to_vec(),
                new_public_key: next.public_key(),
                new_diversifier: new_diversifier.to_string(),
            }
        }

        /// An encoded proof for `target` at the current sequence.
        #[must_use]
        pub fn sign_target(
            &self,
            prefix: &MerklePrefix,
            target: &CommitmentTarget,
            timestamp: u64,
        ) -> Vec<u8> {
            let path = apply_prefix(prefix, target.path()).expect("valid prefix");
            let data = SignData::from_target(&path, target);
            let bytes = sign_bytes(self.sequence, timestamp, &self.diversifier, &data);
            TimestampedSignatureData {
                signature_data: self.sign(&bytes),
                timestamp,
            }
            .encode_to_vec()
        }

        fn signature_and_data(&self, data: &SignData, timestamp: u64) -> SignatureAndData {
            let bytes = sign_bytes(self.sequence, timestamp, &self.diversifier, data);
            SignatureAndData {
                signature: self.sign(&bytes).encode_to_vec(),
                data_type: data.data_type(),
                data: data.encode_to_vec(),
                timestamp,
            }
        }

        /// Two signatures over different client states at the current sequence.
        #[must_use]
        pub fn create_misbehaviour(&self, client_id: &str) -> Misbehaviour {
            let data = |value: u8| SignData::ClientState {
                path: b"/ibc/clients/counterparty/clientState".to_vec(),
                client_state: Any {
                    type_url: "/counterparty.ClientState".to_string(),
                    value: vec![value],
                },
            };
            Misbehaviour {
                client_id: client_id.to_string(),
                sequence: self.sequence,
                signature_one: self.signature_and_data(&data(1), self.timestamp),
                signature_two: self.signature_and_data(&data(2), self.timestamp + 1),
            }
        }
    }
}
