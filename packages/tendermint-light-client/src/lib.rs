//! The ICS-07 Tendermint light client.
//!
//! Headers are verified with [`tendermint_light_client_verifier`] against consensus states
//! stored in a per-client [`ibc_light_client_core::store::Store`]. Every state transition is
//! a pure function of the stored client, its store and the host time in nanoseconds, and
//! returns the states the caller must persist.
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
pub mod proposal;
pub mod proto;
pub mod update;
pub mod upgrade;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client_state::{ClientState, TrustLevel};
pub use consensus_state::ConsensusState;
pub use header::Header;
pub use misbehaviour::Misbehaviour;

/// Client type of the tendermint client.
pub const TENDERMINT_CLIENT_TYPE: &str = "07-tendermint";

mod time {
    use ibc_light_client_core::ClientError;
    use tendermint::Time;

    const NANOS_PER_SECOND: u64 = 1_000_000_000;

    /// Converts host nanoseconds since the unix epoch into a tendermint time.
    pub fn from_nanos(nanos: u64) -> Result<Time, ClientError> {
        let seconds = i64::try_from(nanos / NANOS_PER_SECOND).map_err(|e| {
            ClientError::InvalidHeader {
                reason: format!("timestamp {nanos} out of range: {e}"),
            }
        })?;
        #[allow(clippy::cast_possible_truncation)]
        let subsec = (nanos % NANOS_PER_SECOND) as u32;
        Time::from_unix_timestamp(seconds, subsec).map_err(|e| ClientError::InvalidHeader {
            reason: format!("timestamp {nanos} out of range: {e}"),
        })
    }

    /// Nanoseconds since the unix epoch, zero for times before it.
    pub fn to_nanos(time: Time) -> u64 {
        u64::try_from(time.unix_timestamp_nanos()).unwrap_or_default()
    }
}
