//! Test utilities for the light client crates

#[cfg(any(test, feature = "test-utils"))]
pub use fixtures::*;

#[allow(missing_docs, clippy::missing_panics_doc)]
#[cfg(any(test, feature = "test-utils"))]
mod fixtures {
    use ed25519_dalek::Signer as _;
    use ics23::{
        calculate_existence_root, commitment_proof::Proof, CommitmentProof, ExistenceProof,
        HashOp, HostFunctionsManager, InnerOp, NonExistenceProof, ProofSpec,
    };

    use crate::{
        commitment::{MerklePath, MerkleProof, MerkleRoot},
        crypto::{CompactBitArray, PublicKey, SignatureData, SIGN_MODE_DIRECT,
            SIGN_MODE_LEGACY_AMINO_JSON},
    };

    /// Proof specs for a two level store of simple Merkle trees, leaf store first.
    #[must_use]
    pub fn proof_specs() -> Vec<ProofSpec> {
        vec![ics23::tendermint_spec(), ics23::tendermint_spec()]
    }

    fn leaf(key: &[u8], value: &[u8]) -> ExistenceProof {
        ExistenceProof {
            key: key.to_vec(),
            value: value.to_vec(),
            leaf: ics23::tendermint_spec().leaf_spec,
            path: vec![],
        }
    }

    fn root_of(proof: &ExistenceProof) -> Vec<u8> {
        calculate_existence_root::<HostFunctionsManager>(proof).expect("valid existence proof")
    }

    fn commitment(proof: Proof) -> CommitmentProof {
        CommitmentProof { proof: Some(proof) }
    }

    /// Wraps a leaf store root into a single-key root store under `store_key`.
    fn seal(
        store_key: &str,
        subroot: Vec<u8>,
        leaf_proof: CommitmentProof,
    ) -> (MerkleRoot, Vec<u8>) {
        let upper = leaf(store_key.as_bytes(), &subroot);
        let root = root_of(&upper);
        let proof = MerkleProof {
            proofs: vec![leaf_proof, commitment(Proof::Exist(upper))],
        };
        (MerkleRoot::new(root), proof.encode_to_vec())
    }

    /// Builds a root and an encoded proof committing `value` under the two-key `path`.
    #[must_use]
    pub fn membership_proof(path: &MerklePath, value: &[u8]) -> (MerkleRoot, Vec<u8>) {
        let [store_key, key] = path.key_path.as_slice() else {
            panic!("expected a two key path");
        };
        let lower = leaf(key.as_bytes(), value);
        let subroot = root_of(&lower);
        seal(store_key, subroot, commitment(Proof::Exist(lower)))
    }

    /// Builds a root and an encoded proof that nothing is committed under the two-key `path`.
    #[must_use]
    pub fn non_membership_proof(path: &MerklePath) -> (MerkleRoot, Vec<u8>) {
        let [store_key, key] = path.key_path.as_slice() else {
            panic!("expected a two key path");
        };
        let key = key.as_bytes();
        let left_key = &key[..key.len() - 1];
        let right_key = [key, b"~"].concat();

        let left_hash = root_of(&leaf(left_key, b"left"));
        let right_hash = root_of(&leaf(&right_key, b"right"));

        let mut left = leaf(left_key, b"left");
        left.path = vec![InnerOp {
            hash: HashOp::Sha256.into(),
            prefix: vec![1],
            suffix: right_hash,
        }];
        let mut right = leaf(&right_key, b"right");
        right.path = vec![InnerOp {
            hash: HashOp::Sha256.into(),
            prefix: [vec![1], left_hash].concat(),
            suffix: vec![],
        }];
        let subroot = root_of(&left);

        seal(
            store_key,
            subroot,
            commitment(Proof::Nonexist(NonExistenceProof {
                key: key.to_vec(),
                left: Some(left),
                right: Some(right),
            })),
        )
    }

    /// A deterministic signing key.
    #[derive(Clone, Debug)]
    pub enum TestSigner {
        Secp256k1(k256::ecdsa::SigningKey),
        Ed25519(ed25519_dalek::SigningKey),
    }

    impl TestSigner {
        #[must_use]
        pub fn secp256k1(seed: u8) -> Self {
            Self::Secp256k1(
                k256::ecdsa::SigningKey::from_slice(&[seed.max(1); 32]).expect("valid key"),
            )
        }

        #[must_use]
        pub fn ed25519(seed: u8) -> Self {
            Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
        }

        #[must_use]
        pub fn public_key(&self) -> PublicKey {
            match self {
                Self::Secp256k1(key) => PublicKey::Secp256k1(
                    key.verifying_key()
                        .to_encoded_point(true)
                        .as_bytes()
                        .to_vec(),
                ),
                Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes().to_vec()),
            }
        }

        #[must_use]
        pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
            match self {
                Self::Secp256k1(key) => {
                    let signature: k256::ecdsa::Signature = key.sign(msg);
                    signature.to_bytes().to_vec()
                }
                Self::Ed25519(key) => key.sign(msg).to_bytes().to_vec(),
            }
        }

        #[must_use]
        pub fn sign_data(&self, msg: &[u8]) -> SignatureData {
            SignatureData::Single {
                mode: SIGN_MODE_DIRECT,
                signature: self.sign(msg),
            }
        }
    }

    /// A threshold multisig over deterministic secp256k1 members.
    #[derive(Clone, Debug)]
    pub struct TestMultisig {
        pub threshold: u32,
        pub members: Vec<TestSigner>,
    }

    impl TestMultisig {
        #[must_use]
        pub fn new(threshold: u32, members: usize) -> Self {
            Self {
                threshold,
                members: (0..members)
                    .map(|i| TestSigner::secp256k1(u8::try_from(i + 10).expect("few members")))
                    .collect(),
            }
        }

        #[must_use]
        pub fn public_key(&self) -> PublicKey {
            PublicKey::Multisig {
                threshold: self.threshold,
                public_keys: self.members.iter().map(TestSigner::public_key).collect(),
            }
        }

        /// Signs with the members at the given indices.
        #[must_use]
        pub fn sign_data(&self, msg: &[u8], signing: &[usize]) -> SignatureData {
            let mut bit_array = CompactBitArray::new(self.members.len());
            let mut signatures = vec![];
            for (index, member) in self.members.iter().enumerate() {
                if signing.contains(&index) {
                    bit_array.set_index(index, true);
                    signatures.push(SignatureData::Single {
                        mode: SIGN_MODE_LEGACY_AMINO_JSON,
                        signature: member.sign(msg),
                    });
                }
            }
            SignatureData::Multi {
                bit_array,
                signatures,
            }
        }
    }
}
