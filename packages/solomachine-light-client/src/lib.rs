//! The solo machine light client: a single key (or multisig) whose signatures over
//! sequenced messages stand in for consensus.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod client_state;
pub mod consensus_state;
pub mod header;
pub mod misbehaviour;
pub mod proto;
pub mod sign_bytes;
pub mod update;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client_state::ClientState;
pub use consensus_state::ConsensusState;
pub use header::Header;
pub use misbehaviour::{Misbehaviour, SignatureAndData};

/// Client type of the solo machine client.
pub const SOLOMACHINE_CLIENT_TYPE: &str = "06-solomachine";
