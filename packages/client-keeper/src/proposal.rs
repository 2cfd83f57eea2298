//! Governance proposal that recovers a client from a substitute

use ibc_light_client_core::{identifier::validate_client_identifier, ClientError, Height};
use ibc_light_client_utils::ensure;
use serde::{Deserialize, Serialize};

/// Proposal to replace the state of a frozen or expired subject client with the state of
/// an active substitute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdateProposal {
    /// Proposal title
    pub title: String,
    /// Proposal description
    pub description: String,
    /// Client to recover
    pub subject_client_id: String,
    /// Client whose state is copied
    pub substitute_client_id: String,
    /// First substitute height to copy consensus states from
    pub initial_height: Height,
}

impl ClientUpdateProposal {
    /// Stateless checks of the proposal.
    ///
    /// # Errors
    /// Returns [`ClientError::UpdateClientFailed`] for a blank title or description or
    /// identical clients, [`ClientError::InvalidClientId`] for a malformed identifier and
    /// [`ClientError::InvalidHeight`] for a zero initial height.
    pub fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            !self.title.trim().is_empty(),
            ClientError::UpdateClientFailed {
                reason: "proposal title cannot be blank".to_string(),
            }
        );
        ensure!(
            !self.description.trim().is_empty(),
            ClientError::UpdateClientFailed {
                reason: "proposal description cannot be blank".to_string(),
            }
        );
        validate_client_identifier(&self.subject_client_id)?;
        validate_client_identifier(&self.substitute_client_id)?;
        ensure!(
            self.subject_client_id != self.substitute_client_id,
            ClientError::UpdateClientFailed {
                reason: "subject and substitute client identifiers are equal".to_string(),
            }
        );
        ensure!(
            !self.initial_height.is_zero(),
            ClientError::InvalidHeight {
                reason: "initial height cannot be zero".to_string(),
            }
        );
        Ok(())
    }
}
