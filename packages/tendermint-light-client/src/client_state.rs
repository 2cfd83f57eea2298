//! Tendermint client state

use std::time::Duration;

use ibc_light_client_core::{
    client::{ClientStateCommon, ConsensusStateCommon, Status},
    identifier::{is_revision_format, parse_chain_id, set_revision_number},
    ics23::ProofSpec,
    proto::decode_any,
    store::{get_consensus_state, Store},
    Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use tendermint_light_client_verifier::{options::Options, types::TrustThreshold};
use tendermint_proto::google::protobuf::Duration as RawDuration;

use crate::{
    consensus_state::ConsensusState,
    proto::{RawClientState, RawFraction, CLIENT_STATE_TYPE_URL},
    TENDERMINT_CLIENT_TYPE,
};

/// Fraction of the trusted validator power that must sign a header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrustLevel {
    /// Numerator
    pub numerator: u64,
    /// Denominator
    pub denominator: u64,
}

impl TrustLevel {
    /// The minimum trust level, one third.
    pub const ONE_THIRD: Self = Self {
        numerator: 1,
        denominator: 3,
    };

    /// Checks that the level lies in `[1/3, 1]`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidClient`] if the denominator is zero or the level is out of
    /// range.
    pub fn validate(&self) -> Result<(), ClientError> {
        ensure!(
            self.denominator != 0,
            ClientError::InvalidClient {
                reason: "trust level denominator cannot be 0".to_string(),
            }
        );
        let (numerator, denominator) = (
            u128::from(self.numerator),
            u128::from(self.denominator),
        );
        ensure!(
            numerator * 3 >= denominator && numerator <= denominator,
            ClientError::InvalidClient {
                reason: format!(
                    "trust level must be within [1/3, 1], got {}/{}",
                    self.numerator, self.denominator
                ),
            }
        );
        Ok(())
    }
}

impl From<RawFraction> for TrustLevel {
    fn from(raw: RawFraction) -> Self {
        Self {
            numerator: raw.numerator,
            denominator: raw.denominator,
        }
    }
}

impl From<TrustLevel> for RawFraction {
    fn from(level: TrustLevel) -> Self {
        Self {
            numerator: level.numerator,
            denominator: level.denominator,
        }
    }
}

/// State of a tendermint client.
#[allow(clippy::struct_excessive_bools, clippy::derive_partial_eq_without_eq)]
#[derive(Clone, Debug, PartialEq)]
pub struct ClientState {
    /// Chain id of the counterparty
    pub chain_id: String,
    /// Fraction of trusted validator power required to accept a header
    pub trust_level: TrustLevel,
    /// How long a consensus state can be used as a trust base
    pub trusting_period: Duration,
    /// Unbonding period of the counterparty
    pub unbonding_period: Duration,
    /// Tolerated clock skew between the host and the counterparty
    pub max_clock_drift: Duration,
    /// Height at which misbehaviour froze the client, zero when not frozen
    pub frozen_height: Height,
    /// Latest height the client was updated to
    pub latest_height: Height,
    /// Proof specs of the counterparty commitment store
    pub proof_specs: Vec<ProofSpec>,
    /// Key path under which the counterparty commits an upgraded client
    pub upgrade_path: Vec<String>,
    /// Whether governance may revive the client after it expired
    pub allow_update_after_expiry: bool,
    /// Whether governance may revive the client after it was frozen
    pub allow_update_after_misbehaviour: bool,
}

impl ClientState {
    /// Unpacks a client state.
    ///
    /// # Errors
    /// Returns an error if the type url is not the tendermint client state or the value does
    /// not decode.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        decode_any::<RawClientState>(any, CLIENT_STATE_TYPE_URL)?.try_into()
    }

    /// Whether a consensus state produced at `timestamp_ns` is outside the trusting period.
    #[must_use]
    pub fn is_expired(&self, timestamp_ns: u64, now_ns: u64) -> bool {
        let trusting_period = u64::try_from(self.trusting_period.as_nanos()).unwrap_or(u64::MAX);
        now_ns >= timestamp_ns.saturating_add(trusting_period)
    }

    /// Status of the client at `now_ns`.
    ///
    /// # Errors
    /// Returns an error if the stored latest consensus state is corrupt.
    pub fn status(&self, store: &dyn Store, now_ns: u64) -> Result<Status, ClientError> {
        let Some(latest) = get_consensus_state(store, self.latest_height)? else {
            return Ok(Status::Unknown);
        };
        let latest = ConsensusState::from_any(&latest)?;
        Ok(Status::from_flags(
            self.is_frozen(),
            self.is_expired(latest.timestamp(), now_ns),
        ))
    }

    /// Checks the consensus state a client is created with.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidConsensus`] if it is not a tendermint consensus state.
    pub fn initialize(&self, consensus_state: &Any) -> Result<ConsensusState, ClientError> {
        ConsensusState::from_any(consensus_state).map_err(|e| ClientError::InvalidConsensus {
            reason: format!("invalid initial consensus state: {e}"),
        })
    }

    /// The chain id a header at `height` must carry.
    ///
    /// Chain ids in revision format follow the revision of the height.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidChainId`] if the revision cannot be substituted.
    pub fn chain_id_at(&self, height: Height) -> Result<String, ClientError> {
        if is_revision_format(&self.chain_id) {
            set_revision_number(&self.chain_id, height.revision_number)
        } else {
            Ok(self.chain_id.clone())
        }
    }

    /// The verifier options derived from the trust parameters.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidClient`] if the trust level is not accepted by the
    /// verifier.
    pub fn as_light_client_options(&self) -> Result<Options, ClientError> {
        let trust_threshold =
            TrustThreshold::new(self.trust_level.numerator, self.trust_level.denominator)
                .map_err(|e| ClientError::InvalidClient {
                    reason: format!("invalid trust level: {e}"),
                })?;
        Ok(Options {
            trust_threshold,
            trusting_period: self.trusting_period,
            clock_drift: self.max_clock_drift,
        })
    }

    /// The upgrade key path for an upgrade at `upgrade_height`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUpgradeClient`] if upgrades are disabled.
    pub fn upgrade_key_path(&self, upgrade_height: Height) -> Result<Vec<String>, ClientError> {
        let mut key_path = self.upgrade_path.clone();
        let last = key_path
            .last_mut()
            .ok_or_else(|| ClientError::InvalidUpgradeClient {
                reason: "cannot upgrade client, no upgrade path set".to_string(),
            })?;
        last.push_str(&format!("/{}", upgrade_height.revision_height));
        Ok(key_path)
    }
}

impl ClientStateCommon for ClientState {
    fn client_type(&self) -> &'static str {
        TENDERMINT_CLIENT_TYPE
    }

    fn latest_height(&self) -> Height {
        self.latest_height
    }

    fn frozen_height(&self) -> Height {
        self.frozen_height
    }

    fn validate(&self) -> Result<(), ClientError> {
        let invalid = |reason: String| ClientError::InvalidClient { reason };

        ensure!(
            !self.chain_id.trim().is_empty(),
            ClientError::InvalidChainId {
                reason: "chain id cannot be empty".to_string(),
            }
        );
        self.trust_level.validate()?;
        ensure!(
            !self.trusting_period.is_zero(),
            invalid("trusting period must be greater than zero".to_string())
        );
        ensure!(
            !self.unbonding_period.is_zero(),
            invalid("unbonding period must be greater than zero".to_string())
        );
        ensure!(
            !self.max_clock_drift.is_zero(),
            invalid("max clock drift must be greater than zero".to_string())
        );
        ensure!(
            self.trusting_period < self.unbonding_period,
            invalid(format!(
                "trusting period ({:?}) should be < unbonding period ({:?})",
                self.trusting_period, self.unbonding_period
            ))
        );
        ensure!(
            self.latest_height.revision_height != 0,
            ClientError::InvalidHeight {
                reason: "tendermint client's latest height revision height cannot be zero"
                    .to_string(),
            }
        );
        ensure!(
            self.latest_height.revision_number == parse_chain_id(&self.chain_id),
            ClientError::InvalidHeight {
                reason: format!(
                    "latest height revision number must match chain id revision number ({} != {})",
                    self.latest_height.revision_number,
                    parse_chain_id(&self.chain_id)
                ),
            }
        );
        ensure!(
            !self.proof_specs.is_empty(),
            invalid("proof specs cannot be empty for tendermint client".to_string())
        );
        for (i, key) in self.upgrade_path.iter().enumerate() {
            ensure!(
                !key.trim().is_empty(),
                invalid(format!("key in upgrade path at index {i} cannot be empty"))
            );
        }
        Ok(())
    }

    fn proof_specs(&self) -> Vec<ProofSpec> {
        self.proof_specs.clone()
    }

    fn zero_custom_fields(&self) -> Self {
        Self {
            chain_id: self.chain_id.clone(),
            trust_level: TrustLevel::default(),
            trusting_period: Duration::ZERO,
            unbonding_period: self.unbonding_period,
            max_clock_drift: Duration::ZERO,
            frozen_height: Height::zero(),
            latest_height: self.latest_height,
            proof_specs: self.proof_specs.clone(),
            upgrade_path: self.upgrade_path.clone(),
            allow_update_after_expiry: false,
            allow_update_after_misbehaviour: false,
        }
    }

    fn to_any(&self) -> Any {
        Any {
            type_url: CLIENT_STATE_TYPE_URL.to_string(),
            value: RawClientState::from(self.clone()).encode_to_vec(),
        }
    }
}

fn duration_from_raw(raw: Option<RawDuration>, field: &str) -> Result<Duration, ClientError> {
    let raw = raw.unwrap_or_default();
    let seconds = u64::try_from(raw.seconds);
    let nanos = u32::try_from(raw.nanos);
    match (seconds, nanos) {
        (Ok(seconds), Ok(nanos)) if nanos < 1_000_000_000 => Ok(Duration::new(seconds, nanos)),
        _ => Err(ClientError::Decode {
            reason: format!("{field} is not a valid duration"),
        }),
    }
}

fn duration_to_raw(duration: Duration) -> RawDuration {
    RawDuration {
        seconds: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        nanos: i32::try_from(duration.subsec_nanos()).unwrap_or_default(),
    }
}

impl TryFrom<RawClientState> for ClientState {
    type Error = ClientError;

    fn try_from(raw: RawClientState) -> Result<Self, Self::Error> {
        Ok(Self {
            chain_id: raw.chain_id,
            trust_level: raw.trust_level.unwrap_or_default().into(),
            trusting_period: duration_from_raw(raw.trusting_period, "trusting period")?,
            unbonding_period: duration_from_raw(raw.unbonding_period, "unbonding period")?,
            max_clock_drift: duration_from_raw(raw.max_clock_drift, "max clock drift")?,
            frozen_height: raw.frozen_height.map(Into::into).unwrap_or_default(),
            latest_height: raw.latest_height.map(Into::into).unwrap_or_default(),
            proof_specs: raw.proof_specs,
            upgrade_path: raw.upgrade_path,
            allow_update_after_expiry: raw.allow_update_after_expiry,
            allow_update_after_misbehaviour: raw.allow_update_after_misbehaviour,
        })
    }
}

impl From<ClientState> for RawClientState {
    fn from(client_state: ClientState) -> Self {
        Self {
            chain_id: client_state.chain_id,
            trust_level: Some(client_state.trust_level.into()),
            trusting_period: Some(duration_to_raw(client_state.trusting_period)),
            unbonding_period: Some(duration_to_raw(client_state.unbonding_period)),
            max_clock_drift: Some(duration_to_raw(client_state.max_clock_drift)),
            frozen_height: Some(client_state.frozen_height.into()),
            latest_height: Some(client_state.latest_height.into()),
            proof_specs: client_state.proof_specs,
            upgrade_path: client_state.upgrade_path,
            allow_update_after_expiry: client_state.allow_update_after_expiry,
            allow_update_after_misbehaviour: client_state.allow_update_after_misbehaviour,
        }
    }
}

#[cfg(test)]
mod tests {
    use ibc_light_client_core::store::{set_consensus_state, MemoryStore};
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{client_state, consensus_state, CHAIN_ID, NANOS_PER_SECOND};

    #[test]
    fn default_client_state_is_valid() {
        client_state(Height::new(0, 10)).validate().unwrap();
    }

    #[rstest]
    #[case::blank_chain_id(|cs: &mut ClientState| cs.chain_id = "  ".to_string())]
    #[case::zero_denominator(|cs: &mut ClientState| cs.trust_level = TrustLevel { numerator: 1, denominator: 0 })]
    #[case::trust_below_one_third(|cs: &mut ClientState| cs.trust_level = TrustLevel { numerator: 1, denominator: 4 })]
    #[case::trust_above_one(|cs: &mut ClientState| cs.trust_level = TrustLevel { numerator: 4, denominator: 3 })]
    #[case::zero_trusting_period(|cs: &mut ClientState| cs.trusting_period = Duration::ZERO)]
    #[case::zero_unbonding_period(|cs: &mut ClientState| cs.unbonding_period = Duration::ZERO)]
    #[case::zero_clock_drift(|cs: &mut ClientState| cs.max_clock_drift = Duration::ZERO)]
    #[case::trusting_not_below_unbonding(|cs: &mut ClientState| cs.trusting_period = cs.unbonding_period)]
    #[case::zero_latest_height(|cs: &mut ClientState| cs.latest_height = Height::new(0, 0))]
    #[case::revision_mismatch(|cs: &mut ClientState| cs.latest_height = Height::new(1, 10))]
    #[case::no_proof_specs(|cs: &mut ClientState| cs.proof_specs.clear())]
    #[case::blank_upgrade_key(|cs: &mut ClientState| cs.upgrade_path = vec!["upgrade".to_string(), " ".to_string()])]
    fn rejects_invalid_client_state(#[case] mutate: fn(&mut ClientState)) {
        let mut client_state = client_state(Height::new(0, 10));
        mutate(&mut client_state);
        assert!(client_state.validate().is_err());
    }

    #[test]
    fn trust_level_bounds() {
        TrustLevel::ONE_THIRD.validate().unwrap();
        TrustLevel {
            numerator: 1,
            denominator: 1,
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn zero_custom_fields_keeps_chain_chosen_fields() {
        let mut client_state = client_state(Height::new(0, 10));
        client_state.frozen_height = Height::new(0, 5);
        client_state.allow_update_after_expiry = true;
        client_state.allow_update_after_misbehaviour = true;

        let zeroed = client_state.zero_custom_fields();
        assert_eq!(zeroed.trust_level, TrustLevel::default());
        assert_eq!(zeroed.trusting_period, Duration::ZERO);
        assert_eq!(zeroed.max_clock_drift, Duration::ZERO);
        assert!(zeroed.frozen_height.is_zero());
        assert!(!zeroed.allow_update_after_expiry);
        assert!(!zeroed.allow_update_after_misbehaviour);

        assert_eq!(zeroed.chain_id, client_state.chain_id);
        assert_eq!(zeroed.unbonding_period, client_state.unbonding_period);
        assert_eq!(zeroed.latest_height, client_state.latest_height);
        assert_eq!(zeroed.proof_specs, client_state.proof_specs);
        assert_eq!(zeroed.upgrade_path, client_state.upgrade_path);
    }

    #[test]
    fn unpacks_packed_state() {
        let client_state = client_state(Height::new(0, 10));
        assert_eq!(
            ClientState::from_any(&client_state.to_any()).unwrap(),
            client_state
        );
    }

    #[test]
    fn chain_id_follows_header_revision() {
        let mut client_state = client_state(Height::new(0, 10));
        assert_eq!(client_state.chain_id_at(Height::new(3, 1)).unwrap(), CHAIN_ID);

        client_state.chain_id = "gaia-1".to_string();
        assert_eq!(client_state.chain_id_at(Height::new(2, 1)).unwrap(), "gaia-2");
    }

    #[test]
    fn upgrade_key_path_appends_height() {
        let mut client_state = client_state(Height::new(0, 10));
        assert_eq!(
            client_state.upgrade_key_path(Height::new(0, 11)).unwrap(),
            vec!["upgrade".to_string(), "upgradedIBCState/11".to_string()]
        );

        client_state.upgrade_path.clear();
        assert!(matches!(
            client_state.upgrade_key_path(Height::new(0, 11)),
            Err(ClientError::InvalidUpgradeClient { .. })
        ));
    }

    #[test]
    fn status_follows_latest_consensus_state() {
        let height = Height::new(0, 10);
        let mut client_state = client_state(height);
        let mut store = MemoryStore::new();
        assert_eq!(client_state.status(&store, 0).unwrap(), Status::Unknown);

        let consensus_state = consensus_state(100);
        set_consensus_state(&mut store, height, &consensus_state.to_any());
        let trusting_period = u64::try_from(client_state.trusting_period.as_nanos()).unwrap();
        let created = 100 * NANOS_PER_SECOND;

        assert_eq!(client_state.status(&store, created + 1).unwrap(), Status::Active);
        assert_eq!(
            client_state.status(&store, created + trusting_period).unwrap(),
            Status::Expired
        );

        client_state.frozen_height = Height::new(0, 1);
        assert_eq!(client_state.status(&store, created + 1).unwrap(), Status::Frozen);
        assert_eq!(
            client_state.status(&store, created + trusting_period).unwrap(),
            Status::FrozenAndExpired
        );
    }
}
