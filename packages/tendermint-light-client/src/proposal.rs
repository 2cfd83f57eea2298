//! Governance driven recovery of frozen or expired tendermint clients

use ibc_light_client_core::{
    client::{ClientStateCommon, ConsensusStateCommon, HeaderCommon, UpdateOutcome},
    store::{
        consensus_heights, get_consensus_state, get_processed_time, set_consensus_state,
        set_processed_time, Store,
    },
    ClientError, Height,
};
use ibc_light_client_utils::ensure;

use crate::{
    client_state::ClientState,
    consensus_state::ConsensusState,
    header::Header,
    time,
    update::{check_header_and_update_state, load_consensus_state},
};

fn is_expired_at_latest(
    client_state: &ClientState,
    store: &dyn Store,
    now_ns: u64,
) -> Result<bool, ClientError> {
    let latest = load_consensus_state(store, client_state.latest_height)?;
    Ok(client_state.is_expired(latest.timestamp(), now_ns))
}

/// Accepts `header` for a client that is being rescued, without trust level verification.
///
/// The header must be structurally valid for the client's chain, newer than the latest
/// consensus state both in height and time, and within the trusting period of `now_ns`.
/// With `require_zero_trusted_height` the header must not name a trusted height.
///
/// # Errors
/// Returns [`ClientError::InvalidHeader`] if any of those checks fail and
/// [`ClientError::ConsensusStateNotFound`] if the latest consensus state is missing.
pub fn unexpire(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
    now_ns: u64,
    require_zero_trusted_height: bool,
) -> Result<UpdateOutcome<ClientState, ConsensusState>, ClientError> {
    let invalid = |reason: String| ClientError::InvalidHeader { reason };

    ensure!(
        !require_zero_trusted_height || header.trusted_height.is_zero(),
        invalid(format!(
            "trusted height must be zero, got {}",
            header.trusted_height
        ))
    );
    header.validate_basic()?;

    let height = header.height();
    let chain_id = client_state.chain_id_at(height)?;
    ensure!(
        header.chain_id() == chain_id,
        invalid(format!(
            "header chain id {} does not match client chain id {chain_id}",
            header.chain_id()
        ))
    );

    let latest = load_consensus_state(store, client_state.latest_height)?;
    ensure!(
        header.time() > latest.timestamp,
        invalid(format!(
            "header time {} must be after the latest consensus state time {}",
            header.time(),
            latest.timestamp
        ))
    );
    ensure!(
        height > client_state.latest_height,
        invalid(format!(
            "header height {height} must be greater than latest height {}",
            client_state.latest_height
        ))
    );
    ensure!(
        !client_state.is_expired(time::to_nanos(header.time()), now_ns),
        invalid(format!(
            "header time {} is outside the trusting period",
            header.time()
        ))
    );

    Ok(UpdateOutcome::Updated {
        client_state: ClientState {
            latest_height: height,
            ..client_state.clone()
        },
        consensus_state: ConsensusState::from(header),
        height,
    })
}

/// Applies a header approved by governance to a frozen or expired client.
///
/// A frozen client is unfrozen if it allows updates after misbehaviour, then either
/// unexpired or updated normally. An expired client is unexpired if it allows updates after
/// expiry.
///
/// # Errors
/// Returns [`ClientError::UpdateClientFailed`] if the client does not allow the recovery, or
/// the error of the update path taken.
pub fn check_proposed_header_and_update_state(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
    now_ns: u64,
) -> Result<UpdateOutcome<ClientState, ConsensusState>, ClientError> {
    let expired = is_expired_at_latest(client_state, store, now_ns)?;

    if client_state.is_frozen() {
        ensure!(
            client_state.allow_update_after_misbehaviour,
            ClientError::UpdateClientFailed {
                reason: "client is not allowed to be unfrozen".to_string(),
            }
        );
        let unfrozen = ClientState {
            frozen_height: Height::default(),
            ..client_state.clone()
        };
        if expired {
            return unexpire(&unfrozen, store, header, now_ns, false);
        }
        return match check_header_and_update_state(&unfrozen, store, header, now_ns)? {
            // the header is already stored, only the freeze is lifted
            UpdateOutcome::Unchanged => Ok(UpdateOutcome::Updated {
                consensus_state: ConsensusState::from(header),
                height: header.height(),
                client_state: unfrozen,
            }),
            outcome => Ok(outcome),
        };
    }

    if client_state.allow_update_after_expiry && expired {
        return unexpire(client_state, store, header, now_ns, false);
    }

    Err(ClientError::UpdateClientFailed {
        reason: "client cannot be updated with a proposal unless it is frozen or expired"
            .to_string(),
    })
}

/// Returns `client_state` with the fields a substitute may differ in zeroed.
fn without_substitutable_fields(client_state: &ClientState) -> ClientState {
    ClientState {
        chain_id: String::new(),
        latest_height: Height::default(),
        frozen_height: Height::default(),
        ..client_state.clone()
    }
}

/// Replaces a frozen or expired subject with the state of an active substitute.
///
/// Consensus states of the substitute from `initial_height` up to its latest height are
/// copied into `subject_store` together with their processed times. Nothing is written to
/// `subject_store` unless the substituted client is accepted.
///
/// # Errors
/// Returns [`ClientError::InvalidHeight`] if the substitute is on another revision than
/// `initial_height`, [`ClientError::InvalidSubstitute`] if the parameters of the two clients
/// differ, [`ClientError::UpdateClientFailed`] if the subject does not allow the recovery and
/// [`ClientError::InvalidClient`] if the resulting client is invalid or expired.
pub fn check_substitute_and_update_state(
    subject: &ClientState,
    subject_store: &mut dyn Store,
    substitute: &ClientState,
    substitute_store: &dyn Store,
    initial_height: Height,
    now_ns: u64,
) -> Result<ClientState, ClientError> {
    ensure!(
        substitute.latest_height.revision_number == initial_height.revision_number,
        ClientError::InvalidHeight {
            reason: format!(
                "substitute revision {} does not match initial height revision {}",
                substitute.latest_height.revision_number, initial_height.revision_number
            ),
        }
    );
    ensure!(
        without_substitutable_fields(subject) == without_substitutable_fields(substitute),
        ClientError::InvalidSubstitute {
            reason: "subject and substitute client parameters do not match".to_string(),
        }
    );

    let mut client_state = subject.clone();
    if subject.is_frozen() {
        ensure!(
            subject.allow_update_after_misbehaviour,
            ClientError::UpdateClientFailed {
                reason: "subject is not allowed to be unfrozen".to_string(),
            }
        );
        client_state.frozen_height = Height::default();
    } else if is_expired_at_latest(subject, subject_store, now_ns)? {
        ensure!(
            subject.allow_update_after_expiry,
            ClientError::UpdateClientFailed {
                reason: "subject is not allowed to be unexpired".to_string(),
            }
        );
    } else {
        return Err(ClientError::UpdateClientFailed {
            reason: "subject is neither frozen nor expired".to_string(),
        });
    }

    let copied = consensus_heights(substitute_store)
        .into_iter()
        .filter(|height| {
            height.revision_number == initial_height.revision_number
                && height.revision_height >= initial_height.revision_height
                && *height <= substitute.latest_height
        })
        .map(|height| {
            Ok((
                height,
                get_consensus_state(substitute_store, height)?,
                get_processed_time(substitute_store, height),
            ))
        })
        .collect::<Result<Vec<_>, ClientError>>()?;

    client_state.latest_height = substitute.latest_height;
    client_state.chain_id.clone_from(&substitute.chain_id);
    client_state
        .validate()
        .map_err(|e| ClientError::InvalidClient {
            reason: format!("substituted client is invalid: {e}"),
        })?;

    let latest = copied
        .iter()
        .find(|(height, _, _)| *height == client_state.latest_height)
        .and_then(|(_, consensus_state, _)| consensus_state.as_ref())
        .map(ConsensusState::from_any)
        .transpose()?
        .ok_or_else(|| ClientError::InvalidClient {
            reason: format!(
                "no consensus state copied at latest height {}",
                client_state.latest_height
            ),
        })?;
    ensure!(
        !client_state.is_expired(latest.timestamp(), now_ns),
        ClientError::InvalidClient {
            reason: "substituted client is expired".to_string(),
        }
    );

    // the subject store is only written once the substituted client is accepted
    for (height, consensus_state, processed_time) in copied {
        if let Some(consensus_state) = consensus_state {
            set_consensus_state(subject_store, height, &consensus_state);
        }
        if let Some(processed_time) = processed_time {
            set_processed_time(subject_store, height, processed_time);
        }
    }

    Ok(client_state)
}
