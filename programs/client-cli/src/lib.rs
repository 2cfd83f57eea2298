//! `ibc-client`: a command line interface over the IBC client keeper.
//!
//! The client store is held in a genesis file. Every command imports it, executes against
//! the keeper at the given host time and block height, and writes it back if it changed.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod cli;
pub mod observability;
pub mod runners;

#[cfg(test)]
use solomachine_light_client as _;
#[cfg(test)]
use tendermint_light_client as _;
