//! Header verification and the update of a tendermint client

use ibc_light_client_core::{
    client::{ClientStateCommon, HeaderCommon, UpdateOutcome},
    store::{consensus_heights, get_consensus_state, Store},
    ClientError, Height,
};
use ibc_light_client_utils::ensure;
use tendermint::{block::Height as BlockHeight, chain::Id as ChainId};
use tendermint_light_client_verifier::{
    types::{TrustedBlockState, UntrustedBlockState},
    ProdVerifier, Verdict, Verifier,
};

use crate::{
    client_state::ClientState, consensus_state::ConsensusState, header::Header, time,
};

/// Loads the consensus state stored at `height`.
///
/// # Errors
/// Returns [`ClientError::ConsensusStateNotFound`] if there is none.
pub fn load_consensus_state(
    store: &dyn Store,
    height: Height,
) -> Result<ConsensusState, ClientError> {
    let any = get_consensus_state(store, height)?
        .ok_or(ClientError::ConsensusStateNotFound { height })?;
    ConsensusState::from_any(&any)
}

/// Which verifier entry point a header goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum VerificationMode {
    Update,
    Misbehaviour,
}

/// Runs the trust level verification of `header` against the trusted consensus state.
pub(crate) fn verify_with_verifier(
    client_state: &ClientState,
    trusted: &ConsensusState,
    header: &Header,
    now_ns: u64,
    mode: VerificationMode,
) -> Result<(), String> {
    let chain_id = client_state
        .chain_id_at(header.height())
        .map_err(|e| e.to_string())?;
    let chain_id = ChainId::try_from(chain_id).map_err(|e| format!("invalid chain id: {e}"))?;
    let trusted_height = BlockHeight::try_from(header.trusted_height.revision_height)
        .map_err(|e| format!("invalid trusted height: {e}"))?;
    let options = client_state
        .as_light_client_options()
        .map_err(|e| e.to_string())?;
    let now = time::from_nanos(now_ns).map_err(|e| e.to_string())?;

    let trusted_state = TrustedBlockState {
        chain_id: &chain_id,
        header_time: trusted.timestamp,
        height: trusted_height,
        next_validators: &header.trusted_validators,
        next_validators_hash: trusted.next_validators_hash,
    };
    let untrusted_state = UntrustedBlockState {
        signed_header: &header.signed_header,
        validators: &header.validator_set,
        next_validators: None,
    };

    let verifier = ProdVerifier::default();
    let verdict = match mode {
        VerificationMode::Update => {
            verifier.verify_update_header(untrusted_state, trusted_state, &options, now)
        }
        VerificationMode::Misbehaviour => {
            verifier.verify_misbehaviour_header(untrusted_state, trusted_state, &options, now)
        }
    };
    match verdict {
        Verdict::Success => Ok(()),
        Verdict::NotEnoughTrust(tally) => Err(format!("not enough trust: {tally:?}")),
        Verdict::Invalid(detail) => Err(format!("invalid header: {detail}")),
    }
}

/// Verifies `header` against the consensus state at its trusted height.
///
/// # Errors
/// Returns [`ClientError::InvalidHeader`] if the header is malformed, on the wrong revision
/// or chain, older than its trust base, too far in the future or not signed by enough
/// trusted validators; [`ClientError::ConsensusStateNotFound`] if the trusted consensus
/// state is missing; [`ClientError::InvalidValidatorSet`] if the trusted validators do not
/// match it; and [`ClientError::TrustingPeriodExpired`] if it has expired.
pub fn verify_header(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
    now_ns: u64,
) -> Result<(), ClientError> {
    header.validate_basic()?;

    let height = header.height();
    ensure!(
        height.revision_number == header.trusted_height.revision_number,
        ClientError::InvalidHeader {
            reason: format!(
                "header height revision {} does not match trusted header revision {}",
                height.revision_number, header.trusted_height.revision_number
            ),
        }
    );
    ensure!(
        height > header.trusted_height,
        ClientError::InvalidHeader {
            reason: format!(
                "header height {height} must be greater than trusted height {}",
                header.trusted_height
            ),
        }
    );
    let chain_id = client_state.chain_id_at(height)?;
    ensure!(
        header.chain_id() == chain_id,
        ClientError::InvalidHeader {
            reason: format!(
                "header chain id {} does not match client chain id {chain_id}",
                header.chain_id()
            ),
        }
    );

    let trusted = load_consensus_state(store, header.trusted_height)?;
    header.check_trusted_next_validator_set(&trusted.next_validators_hash)?;

    ensure!(
        header.time() > trusted.timestamp,
        ClientError::InvalidHeader {
            reason: format!(
                "header time {} must be after trusted consensus state time {}",
                header.time(),
                trusted.timestamp
            ),
        }
    );
    let trusted_ns = time::to_nanos(trusted.timestamp);
    ensure!(
        !client_state.is_expired(trusted_ns, now_ns),
        ClientError::TrustingPeriodExpired {
            reason: format!(
                "trusted consensus state at {} is outside the trusting period",
                header.trusted_height
            ),
        }
    );
    let drift = u64::try_from(client_state.max_clock_drift.as_nanos()).unwrap_or(u64::MAX);
    ensure!(
        time::to_nanos(header.time()) < now_ns.saturating_add(drift),
        ClientError::InvalidHeader {
            reason: format!(
                "header time {} is beyond the max clock drift from host time {now_ns}",
                header.time()
            ),
        }
    );

    verify_with_verifier(
        client_state,
        &trusted,
        header,
        now_ns,
        VerificationMode::Update,
    )
    .map_err(|reason| ClientError::InvalidHeader { reason })
}

/// Checks whether `header` conflicts with the consensus states already stored.
///
/// A header conflicts when a different consensus state is stored at its height, or when
/// its time does not fall strictly between the neighbouring consensus states.
///
/// # Errors
/// Returns an error if a stored consensus state is corrupt.
pub fn check_for_misbehaviour(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
) -> Result<bool, ClientError> {
    let height = header.height();
    let consensus_state = ConsensusState::from(header);

    if let Some(existing) = get_consensus_state(store, height)? {
        return Ok(ConsensusState::from_any(&existing)? != consensus_state);
    }

    let heights = consensus_heights(store);
    if let Some(prev) = heights.iter().rev().find(|h| **h < height) {
        if load_consensus_state(store, *prev)?.timestamp >= consensus_state.timestamp {
            return Ok(true);
        }
    }
    if height < client_state.latest_height {
        if let Some(next) = heights.iter().find(|h| **h > height) {
            if load_consensus_state(store, *next)?.timestamp <= consensus_state.timestamp {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Verifies `header` and computes the resulting client and consensus state.
///
/// A header matching a stored consensus state leaves the client unchanged. A header that
/// conflicts with stored state freezes the client at the header height.
///
/// # Errors
/// Returns an error if [`verify_header`] fails.
pub fn check_header_and_update_state(
    client_state: &ClientState,
    store: &dyn Store,
    header: &Header,
    now_ns: u64,
) -> Result<UpdateOutcome<ClientState, ConsensusState>, ClientError> {
    verify_header(client_state, store, header, now_ns)?;

    let height = header.height();
    if get_consensus_state(store, height)?
        .map(|existing| ConsensusState::from_any(&existing))
        .transpose()?
        .is_some_and(|existing| existing == ConsensusState::from(header))
    {
        return Ok(UpdateOutcome::Unchanged);
    }
    if check_for_misbehaviour(client_state, store, header)? {
        return Ok(UpdateOutcome::Misbehaviour {
            client_state: ClientState {
                frozen_height: height,
                ..client_state.clone()
            },
        });
    }

    Ok(UpdateOutcome::Updated {
        client_state: ClientState {
            latest_height: client_state.latest_height().max(height),
            ..client_state.clone()
        },
        consensus_state: ConsensusState::from(header),
        height,
    })
}
