//! Host commitment paths for the entities a light client can prove

use crate::height::Height;

/// Key of the client state inside a client namespace.
pub const CLIENT_STATE_KEY: &str = "clientState";
/// Key prefix of the consensus states inside a client namespace.
pub const CONSENSUS_STATES_KEY: &str = "consensusStates";
/// Suffix of the processed time records inside a client namespace.
pub const PROCESSED_TIME_KEY: &str = "processedTime";

/// `clients/{client_id}/clientState`
#[must_use]
pub fn client_state_path(client_id: &str) -> String {
    format!("clients/{client_id}/{CLIENT_STATE_KEY}")
}

/// `clients/{client_id}/consensusStates/{height}`
#[must_use]
pub fn consensus_state_path(client_id: &str, height: Height) -> String {
    format!("clients/{client_id}/{}", consensus_state_key(height))
}

/// `consensusStates/{height}`, relative to a client namespace
#[must_use]
pub fn consensus_state_key(height: Height) -> String {
    format!("{CONSENSUS_STATES_KEY}/{height}")
}

/// `consensusStates/{height}/processedTime`, relative to a client namespace
#[must_use]
pub fn processed_time_key(height: Height) -> String {
    format!("{}/{PROCESSED_TIME_KEY}", consensus_state_key(height))
}

/// `connections/{connection_id}`
#[must_use]
pub fn connection_path(connection_id: &str) -> String {
    format!("connections/{connection_id}")
}

/// `channelEnds/ports/{port_id}/channels/{channel_id}`
#[must_use]
pub fn channel_path(port_id: &str, channel_id: &str) -> String {
    format!("channelEnds/ports/{port_id}/channels/{channel_id}")
}

/// `commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}`
#[must_use]
pub fn packet_commitment_path(port_id: &str, channel_id: &str, sequence: u64) -> String {
    format!("commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// `acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}`
#[must_use]
pub fn packet_acknowledgement_path(port_id: &str, channel_id: &str, sequence: u64) -> String {
    format!("acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// `receipts/ports/{port_id}/channels/{channel_id}/sequences/{sequence}`
#[must_use]
pub fn packet_receipt_path(port_id: &str, channel_id: &str, sequence: u64) -> String {
    format!("receipts/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// `nextSequenceRecv/ports/{port_id}/channels/{channel_id}`
#[must_use]
pub fn next_sequence_recv_path(port_id: &str, channel_id: &str) -> String {
    format!("nextSequenceRecv/ports/{port_id}/channels/{channel_id}")
}

/// Parses the height out of a `consensusStates/{height}/processedTime` key.
#[must_use]
pub fn parse_processed_time_key(key: &str) -> Option<Height> {
    let height = key
        .strip_prefix(CONSENSUS_STATES_KEY)?
        .strip_prefix('/')?
        .strip_suffix(PROCESSED_TIME_KEY)?
        .strip_suffix('/')?;
    height.parse().ok()
}

/// Parses the height out of a `consensusStates/{height}` key.
#[must_use]
pub fn parse_consensus_state_key(key: &str) -> Option<Height> {
    key.strip_prefix(CONSENSUS_STATES_KEY)?
        .strip_prefix('/')?
        .parse()
        .ok()
}
