//! Core types shared by the IBC light clients: heights, identifiers, client stores, Merkle
//! proofs and signatures.

#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

#[cfg(test)]
use hex as _;
#[cfg(test)]
use serde_json as _;

pub mod client;
pub mod commitment;
pub mod crypto;
pub mod error;
pub mod height;
pub mod identifier;
pub mod path;
pub mod proto;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::ClientError;
pub use height::Height;
pub use ibc_proto::google::protobuf::Any;
pub use ics23;
