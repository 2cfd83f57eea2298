//! Events emitted by the client keeper

use std::fmt;

use ibc_light_client_core::Height;
use serde::{Deserialize, Serialize};

/// Kind of a client keeper event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A client was created
    CreateClient,
    /// A client accepted a header
    UpdateClient,
    /// A client was upgraded
    UpgradeClient,
    /// A client was frozen by misbehaviour
    ClientMisbehaviour,
    /// A client was recovered by governance
    UpdateClientProposal,
}

impl EventType {
    /// Event name as emitted to the host.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateClient => "create_client",
            Self::UpdateClient => "update_client",
            Self::UpgradeClient => "upgrade_client",
            Self::ClientMisbehaviour => "client_misbehaviour",
            Self::UpdateClientProposal => "update_client_proposal",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEvent {
    /// Kind of event
    pub event_type: EventType,
    /// Client the event is about
    pub client_id: String,
    /// Type of that client
    pub client_type: String,
    /// Consensus height the event refers to
    pub consensus_height: Height,
    /// Hex encoded header, for updates only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl ClientEvent {
    /// An event without a header attribute.
    #[must_use]
    pub fn new(
        event_type: EventType,
        client_id: &str,
        client_type: &str,
        consensus_height: Height,
    ) -> Self {
        Self {
            event_type,
            client_id: client_id.to_string(),
            client_type: client_type.to_string(),
            consensus_height,
            header: None,
        }
    }

    /// Attaches the encoded header as hex.
    #[must_use]
    pub fn with_header(mut self, header: &[u8]) -> Self {
        self.header = Some(hex::encode(header));
        self
    }

    /// The event attributes as key-value pairs.
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("client_id", self.client_id.clone()),
            ("client_type", self.client_type.clone()),
            ("consensus_height", self.consensus_height.to_string()),
        ];
        if let Some(header) = &self.header {
            attributes.push(("header", header.clone()));
        }
        attributes
    }
}
