//! Merkle commitments: prefixes, roots, paths and proofs

use std::fmt;

use ics23::{
    calculate_existence_root, commitment_proof::Proof, CommitmentProof, HostFunctionsManager,
    NonExistenceProof, ProofSpec,
};
use prost::Message;

use crate::{error::ClientError, proto::RawMerkleProof};

/// The store prefix under which a chain commits its host state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerklePrefix {
    /// Prefix bytes, usually the store name
    pub key_prefix: Vec<u8>,
}

impl MerklePrefix {
    /// Creates a prefix from its bytes.
    #[must_use]
    pub fn new(key_prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
        }
    }

    /// Returns true if the prefix holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_prefix.is_empty()
    }
}

/// A commitment root, e.g. an application hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleRoot {
    /// Root hash
    pub hash: Vec<u8>,
}

impl MerkleRoot {
    /// Creates a root from its hash.
    #[must_use]
    pub fn new(hash: impl Into<Vec<u8>>) -> Self {
        Self { hash: hash.into() }
    }

    /// Returns true if the root holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

/// An ordered list of keys, root store first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerklePath {
    /// Keys from the root store down to the leaf store
    pub key_path: Vec<String>,
}

impl MerklePath {
    /// Creates a path from its keys.
    #[must_use]
    pub const fn new(key_path: Vec<String>) -> Self {
        Self { key_path }
    }
}

impl fmt::Display for MerklePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.key_path {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

/// Builds the Merkle path `[prefix, path]`.
///
/// # Errors
/// Returns [`ClientError::InvalidPrefix`] if the prefix is empty or not valid utf-8.
pub fn apply_prefix(
    prefix: &MerklePrefix,
    path: impl Into<String>,
) -> Result<MerklePath, ClientError> {
    if prefix.is_empty() {
        return Err(ClientError::InvalidPrefix {
            reason: "prefix cannot be empty".to_string(),
        });
    }
    let prefix = String::from_utf8(prefix.key_prefix.clone()).map_err(|e| {
        ClientError::InvalidPrefix {
            reason: format!("prefix is not valid utf-8: {e}"),
        }
    })?;
    Ok(MerklePath::new(vec![prefix, path.into()]))
}

/// A chain of ics23 commitment proofs, one per store level, innermost store first.
#[derive(Clone, Debug, PartialEq)]
pub struct MerkleProof {
    /// The proofs
    pub proofs: Vec<CommitmentProof>,
}

impl MerkleProof {
    /// Decodes a proof from its protobuf bytes.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] if the bytes are empty or do not decode.
    pub fn decode(bytes: &[u8]) -> Result<Self, ClientError> {
        if bytes.is_empty() {
            return Err(ClientError::InvalidProof {
                reason: "proof cannot be empty".to_string(),
            });
        }
        let raw = RawMerkleProof::decode(bytes).map_err(|e| ClientError::InvalidProof {
            reason: format!("failed to decode merkle proof: {e}"),
        })?;
        Ok(Self { proofs: raw.proofs })
    }

    /// Encodes the proof into protobuf bytes.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        RawMerkleProof {
            proofs: self.proofs.clone(),
        }
        .encode_to_vec()
    }

    fn check_shape(
        &self,
        specs: &[ProofSpec],
        root: &MerkleRoot,
        path: &MerklePath,
    ) -> Result<(), ClientError> {
        let invalid = |reason: String| Err(ClientError::InvalidProof { reason });

        if self.proofs.is_empty() {
            return invalid("merkle proof has no commitment proofs".to_string());
        }
        if root.is_empty() {
            return invalid("commitment root cannot be empty".to_string());
        }
        if specs.len() != self.proofs.len() {
            return invalid(format!(
                "number of proofs ({}) does not match number of specs ({})",
                self.proofs.len(),
                specs.len()
            ));
        }
        if path.key_path.len() != self.proofs.len() {
            return invalid(format!(
                "number of proofs ({}) does not match number of keys ({})",
                self.proofs.len(),
                path.key_path.len()
            ));
        }
        Ok(())
    }

    /// Verifies that `value` is committed under `path` in the tree with the given root.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] if the proof is malformed or does not verify.
    pub fn verify_membership(
        &self,
        specs: &[ProofSpec],
        root: &MerkleRoot,
        path: &MerklePath,
        value: &[u8],
    ) -> Result<(), ClientError> {
        self.check_shape(specs, root, path)?;
        if value.is_empty() {
            return Err(ClientError::InvalidProof {
                reason: "value cannot be empty".to_string(),
            });
        }
        self.verify_chained(specs, root, path, value.to_vec(), 0)
    }

    /// Verifies that nothing is committed under `path` in the tree with the given root.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidProof`] if the proof is malformed or does not verify.
    pub fn verify_non_membership(
        &self,
        specs: &[ProofSpec],
        root: &MerkleRoot,
        path: &MerklePath,
    ) -> Result<(), ClientError> {
        self.check_shape(specs, root, path)?;

        let (Some(proof), Some(spec), Some(key)) =
            (self.proofs.first(), specs.first(), path.key_path.last())
        else {
            return Err(ClientError::InvalidProof {
                reason: "merkle proof has no commitment proofs".to_string(),
            });
        };

        let Some(Proof::Nonexist(non_existence)) = &proof.proof else {
            return Err(ClientError::InvalidProof {
                reason: "expected a non-existence proof for the leaf store".to_string(),
            });
        };
        let subroot = non_existence_root(non_existence)?;
        if !ics23::verify_non_membership::<HostFunctionsManager>(
            proof,
            spec,
            &subroot,
            key.as_bytes(),
        ) {
            return Err(ClientError::InvalidProof {
                reason: format!("failed to verify non-membership of key {key:?}"),
            });
        }

        self.verify_chained(specs, root, path, subroot, 1)
    }

    fn verify_chained(
        &self,
        specs: &[ProofSpec],
        root: &MerkleRoot,
        path: &MerklePath,
        value: Vec<u8>,
        start_index: usize,
    ) -> Result<(), ClientError> {
        let mut value = value;
        for ((proof, spec), key) in self
            .proofs
            .iter()
            .zip(specs)
            .zip(path.key_path.iter().rev())
            .skip(start_index)
        {
            let Some(Proof::Exist(existence)) = &proof.proof else {
                return Err(ClientError::InvalidProof {
                    reason: format!("expected an existence proof for key {key:?}"),
                });
            };
            let subroot = calculate_existence_root::<HostFunctionsManager>(existence).map_err(
                |e| ClientError::InvalidProof {
                    reason: format!("failed to calculate existence root: {e}"),
                },
            )?;
            if !ics23::verify_membership::<HostFunctionsManager>(
                proof,
                spec,
                &subroot,
                key.as_bytes(),
                &value,
            ) {
                return Err(ClientError::InvalidProof {
                    reason: format!("failed to verify membership of key {key:?}"),
                });
            }
            value = subroot;
        }

        if root.hash != value {
            return Err(ClientError::InvalidProof {
                reason: "calculated root does not match the commitment root".to_string(),
            });
        }
        Ok(())
    }
}

fn non_existence_root(proof: &NonExistenceProof) -> Result<Vec<u8>, ClientError> {
    let existence = proof
        .left
        .as_ref()
        .or(proof.right.as_ref())
        .ok_or_else(|| ClientError::InvalidProof {
            reason: "non-existence proof has neither left nor right neighbour".to_string(),
        })?;
    calculate_existence_root::<HostFunctionsManager>(existence).map_err(|e| {
        ClientError::InvalidProof {
            reason: format!("failed to calculate non-existence root: {e}"),
        }
    })
}

/// Decodes `proof` and verifies that `value` is committed under `path`.
///
/// # Errors
/// Returns [`ClientError::InvalidProof`] if the proof does not decode or verify.
pub fn verify_membership(
    specs: &[ProofSpec],
    root: &MerkleRoot,
    path: &MerklePath,
    value: &[u8],
    proof: &[u8],
) -> Result<(), ClientError> {
    MerkleProof::decode(proof)?.verify_membership(specs, root, path, value)
}

/// Decodes `proof` and verifies that nothing is committed under `path`.
///
/// # Errors
/// Returns [`ClientError::InvalidProof`] if the proof does not decode or verify.
pub fn verify_non_membership(
    specs: &[ProofSpec],
    root: &MerkleRoot,
    path: &MerklePath,
    proof: &[u8],
) -> Result<(), ClientError> {
    MerkleProof::decode(proof)?.verify_non_membership(specs, root, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{membership_proof, non_membership_proof, proof_specs};

    fn ibc_prefix() -> MerklePrefix {
        MerklePrefix::new(b"ibc".to_vec())
    }

    mod apply_prefix {
        use super::*;

        #[test]
        fn joins_prefix_and_path() {
            let path = apply_prefix(&ibc_prefix(), "clients/chainA/clientState").unwrap();
            assert_eq!(path.key_path, vec!["ibc", "clients/chainA/clientState"]);
            assert_eq!(path.to_string(), "/ibc/clients/chainA/clientState");
        }

        #[test]
        fn rejects_empty_prefix() {
            let res = apply_prefix(&MerklePrefix::default(), "connections/connection-0");
            assert!(matches!(res, Err(ClientError::InvalidPrefix { .. })));
        }
    }

    mod membership {
        use super::*;

        #[test]
        fn verifies_committed_value() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (root, proof) = membership_proof(&path, b"connection end");

            verify_membership(&proof_specs(), &root, &path, b"connection end", &proof).unwrap();
        }

        #[test]
        fn rejects_wrong_value() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (root, proof) = membership_proof(&path, b"connection end");

            let res = verify_membership(&proof_specs(), &root, &path, b"other end", &proof);
            assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
        }

        #[test]
        fn rejects_wrong_root() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (_, proof) = membership_proof(&path, b"connection end");

            let res = verify_membership(
                &proof_specs(),
                &MerkleRoot::new(vec![1; 32]),
                &path,
                b"connection end",
                &proof,
            );
            assert!(
                matches!(res, Err(ClientError::InvalidProof { reason }) if reason.contains("root"))
            );
        }

        #[test]
        fn rejects_wrong_path() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (root, proof) = membership_proof(&path, b"connection end");
            let other = apply_prefix(&ibc_prefix(), "connections/connection-1").unwrap();

            let res = verify_membership(&proof_specs(), &root, &other, b"connection end", &proof);
            assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
        }

        #[test]
        fn rejects_undecodable_and_empty_proofs() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let root = MerkleRoot::new(vec![1; 32]);

            for proof in [vec![], vec![0xff, 0x01, 0x02]] {
                let res = verify_membership(&proof_specs(), &root, &path, b"value", &proof);
                assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
            }
        }

        #[test]
        fn rejects_spec_count_mismatch() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (root, proof) = membership_proof(&path, b"connection end");

            let res = verify_membership(
                &proof_specs()[..1],
                &root,
                &path,
                b"connection end",
                &proof,
            );
            assert!(
                matches!(res, Err(ClientError::InvalidProof { reason }) if reason.contains("specs"))
            );
        }
    }

    mod non_membership {
        use super::*;

        #[test]
        fn verifies_absent_key() {
            let path = apply_prefix(
                &ibc_prefix(),
                "receipts/ports/transfer/channels/channel-0/sequences/1",
            )
            .unwrap();
            let (root, proof) = non_membership_proof(&path);

            verify_non_membership(&proof_specs(), &root, &path, &proof).unwrap();
        }

        #[test]
        fn rejects_membership_proof() {
            let path = apply_prefix(&ibc_prefix(), "connections/connection-0").unwrap();
            let (root, proof) = membership_proof(&path, b"connection end");

            let res = verify_non_membership(&proof_specs(), &root, &path, &proof);
            assert!(
                matches!(res, Err(ClientError::InvalidProof { reason }) if reason.contains("non-existence"))
            );
        }

        #[test]
        fn rejects_key_outside_neighbours() {
            let path = apply_prefix(
                &ibc_prefix(),
                "receipts/ports/transfer/channels/channel-0/sequences/1",
            )
            .unwrap();
            let (root, proof) = non_membership_proof(&path);
            let other = apply_prefix(
                &ibc_prefix(),
                "receipts/ports/transfer/channels/channel-0/sequences/2",
            )
            .unwrap();

            let res = verify_non_membership(&proof_specs(), &root, &other, &proof);
            assert!(matches!(res, Err(ClientError::InvalidProof { .. })));
        }
    }
}
