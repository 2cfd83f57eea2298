//! The client keeper: a registry of IBC light clients over one host store.
//!
//! Every client lives in its own `clients/{client_id}/` namespace. The keeper routes messages
//! to the client implementation by type, persists the states they return and records the
//! events the host emits.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod any_client;
pub mod events;
pub mod genesis;
pub mod keeper;
pub mod localhost;
pub mod msgs;
pub mod params;
pub mod proposal;

pub use any_client::{AnyClientState, AnyConsensusState, AnyHeader, AnyMisbehaviour};
pub use events::{ClientEvent, EventType};
pub use genesis::GenesisState;
pub use keeper::ClientKeeper;
pub use params::Params;
pub use proposal::ClientUpdateProposal;
