//! The client keeper: the registry of light clients on the host and the entry point for
//! every client message.

use ibc_light_client_core::{
    client::{
        ClientStateCommon, CommitmentTarget, ConsensusStateCommon, DelayPeriod, HeaderCommon,
        Status, UpdateOutcome,
    },
    commitment::MerklePrefix,
    identifier::{format_client_identifier, parse_client_identifier},
    path::{client_state_path, consensus_state_path},
    store::{
        consensus_heights, export_metadata, import_metadata, set_client_state,
        set_consensus_state, set_processed_time, snapshot_client_store, ClientStore, Store,
    },
    Any, ClientError, Height,
};
use ibc_light_client_utils::ensure;
use prost::Message;
use solomachine_light_client as solomachine;
use tendermint_light_client as tendermint;

use crate::{
    any_client::{AnyClientState, AnyConsensusState, AnyHeader, AnyMisbehaviour},
    events::{ClientEvent, EventType},
    genesis::{
        ClientConsensusStates, ConsensusStateWithHeight, GenesisState, IdentifiedClientState,
        IdentifiedGenesisMetadata,
    },
    localhost::{self, LOCALHOST_CLIENT_ID},
    msgs::{MsgCreateClient, MsgSubmitMisbehaviour, MsgUpdateClient, MsgUpgradeClient},
    params::Params,
    proposal::ClientUpdateProposal,
};

const CLIENTS_PREFIX: &str = "clients/";
const CLIENT_STATE_SUFFIX: &str = "/clientState";

/// Registry of the light clients of a host, on top of the host store.
///
/// Every client owns the `clients/{client_id}/` namespace of the store. The keeper is the
/// only writer of those namespaces.
#[derive(Debug)]
pub struct ClientKeeper<S> {
    store: S,
    host_chain_id: String,
    params: Params,
    next_client_sequence: u64,
    events: Vec<ClientEvent>,
}

impl<S: Store> ClientKeeper<S> {
    /// A keeper with default parameters over `store`.
    #[must_use]
    pub fn new(store: S, host_chain_id: &str) -> Self {
        Self {
            store,
            host_chain_id: host_chain_id.to_string(),
            params: Params::default(),
            next_client_sequence: 0,
            events: vec![],
        }
    }

    /// The host store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The host store, for host writes outside of client namespaces.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Releases the host store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces the parameters.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidParams`] if `params` is invalid.
    pub fn set_params(&mut self, params: Params) -> Result<(), ClientError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Sequence of the next generated client identifier.
    #[must_use]
    pub const fn next_client_sequence(&self) -> u64 {
        self.next_client_sequence
    }

    /// Events emitted since they were last drained.
    #[must_use]
    pub fn events(&self) -> &[ClientEvent] {
        &self.events
    }

    /// Drains the emitted events.
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: ClientEvent) {
        tracing::debug!(
            event = %event.event_type,
            client_id = %event.client_id,
            height = %event.consensus_height,
            "emitted client event"
        );
        self.events.push(event);
    }

    /// Returns `format_client_identifier(client_type, next_client_sequence)` and advances
    /// the sequence.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidClientId`] if the client sequence is exhausted.
    pub fn generate_client_identifier(
        &mut self,
        client_type: &str,
    ) -> Result<String, ClientError> {
        let client_id = format_client_identifier(client_type, self.next_client_sequence);
        self.next_client_sequence = self
            .next_client_sequence
            .checked_add(1)
            .ok_or_else(|| ClientError::InvalidClientId {
                reason: format!("client sequence exhausted at {client_id}"),
            })?;
        Ok(client_id)
    }

    fn read_any(&self, key: &str) -> Result<Option<Any>, ClientError> {
        self.store
            .get(key)
            .map(|bytes| {
                Any::decode(bytes.as_slice()).map_err(|e| ClientError::Decode {
                    reason: format!("stored value under {key:?} is not a packed any: {e}"),
                })
            })
            .transpose()
    }

    fn has_client(&self, client_id: &str) -> bool {
        self.store.get(&client_state_path(client_id)).is_some()
    }

    fn store_client_state(&mut self, client_id: &str, client_state: &AnyClientState) {
        set_client_state(
            &mut ClientStore::new(&mut self.store, client_id),
            &client_state.to_any(),
        );
    }

    fn store_consensus_state(
        &mut self,
        client_id: &str,
        height: Height,
        consensus_state: &Any,
        processed_time_ns: Option<u64>,
    ) {
        let mut client_store = ClientStore::new(&mut self.store, client_id);
        set_consensus_state(&mut client_store, height, consensus_state);
        if let Some(processed_time_ns) = processed_time_ns {
            set_processed_time(&mut client_store, height, processed_time_ns);
        }
    }

    /// The client state stored under `client_id`.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] if there is none, or a decoding error if the
    /// stored state is corrupt.
    pub fn client_state(&self, client_id: &str) -> Result<AnyClientState, ClientError> {
        let any = self
            .read_any(&client_state_path(client_id))?
            .ok_or_else(|| ClientError::ClientNotFound {
                client_id: client_id.to_string(),
            })?;
        AnyClientState::from_any(&any)
    }

    /// All client states, ordered by identifier.
    ///
    /// # Errors
    /// Returns a decoding error if a stored state is corrupt.
    pub fn client_states(&self) -> Result<Vec<(String, AnyClientState)>, ClientError> {
        self.store
            .iterate(CLIENTS_PREFIX)
            .into_iter()
            .filter_map(|(key, value)| {
                let client_id = key
                    .strip_prefix(CLIENTS_PREFIX)?
                    .strip_suffix(CLIENT_STATE_SUFFIX)?;
                (!client_id.contains('/')).then(|| (client_id.to_string(), value))
            })
            .map(|(client_id, value)| -> Result<_, ClientError> {
                let any = Any::decode(value.as_slice())?;
                Ok((client_id, AnyClientState::from_any(&any)?))
            })
            .collect()
    }

    /// The consensus state of `client_id` at `height`.
    ///
    /// # Errors
    /// Returns [`ClientError::ConsensusStateNotFound`] if there is none, or a decoding error
    /// if the stored state is corrupt.
    pub fn consensus_state(
        &self,
        client_id: &str,
        height: Height,
    ) -> Result<AnyConsensusState, ClientError> {
        let any = self
            .read_any(&consensus_state_path(client_id, height))?
            .ok_or(ClientError::ConsensusStateNotFound { height })?;
        AnyConsensusState::from_any(&any)
    }

    /// The consensus state of `client_id` at its latest height.
    ///
    /// # Errors
    /// Returns an error if the client or the consensus state is missing or corrupt.
    pub fn latest_consensus_state(
        &self,
        client_id: &str,
    ) -> Result<(Height, AnyConsensusState), ClientError> {
        let height = self.client_state(client_id)?.latest_height();
        Ok((height, self.consensus_state(client_id, height)?))
    }

    /// All consensus states of `client_id`, ascending by height.
    ///
    /// # Errors
    /// Returns a decoding error if a stored state is corrupt.
    pub fn consensus_states(
        &self,
        client_id: &str,
    ) -> Result<Vec<(Height, AnyConsensusState)>, ClientError> {
        let client_store = snapshot_client_store(&self.store, client_id);
        consensus_heights(&client_store)
            .into_iter()
            .map(|height| -> Result<_, ClientError> {
                Ok((height, self.consensus_state(client_id, height)?))
            })
            .collect()
    }

    /// Status of `client_id` at `now_ns`.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] if the client does not exist, or a decoding
    /// error if its state is corrupt.
    pub fn client_status(&self, client_id: &str, now_ns: u64) -> Result<Status, ClientError> {
        let client_state = self.client_state(client_id)?;
        client_state.status(&snapshot_client_store(&self.store, client_id), now_ns)
    }

    /// Imports clients, consensus states, metadata and parameters, and creates the localhost
    /// client at `block_height` if enabled.
    ///
    /// # Errors
    /// Returns an error if the genesis state is invalid.
    pub fn init_genesis(
        &mut self,
        genesis: &GenesisState,
        block_height: u64,
    ) -> Result<(), ClientError> {
        genesis.validate()?;
        self.params = genesis.params.clone();

        for client in &genesis.clients {
            set_client_state(
                &mut ClientStore::new(&mut self.store, &client.client_id),
                &client.client_state.clone().into(),
            );
        }
        for client_consensus in &genesis.clients_consensus {
            for entry in &client_consensus.consensus_states {
                self.store_consensus_state(
                    &client_consensus.client_id,
                    entry.height,
                    &entry.consensus_state.clone().into(),
                    None,
                );
            }
        }
        for client_metadata in &genesis.clients_metadata {
            import_metadata(
                &mut ClientStore::new(&mut self.store, &client_metadata.client_id),
                &client_metadata.metadata,
            )?;
        }
        self.next_client_sequence = genesis.next_client_sequence;

        if genesis.create_localhost {
            let client_state = localhost::ClientState::new(&self.host_chain_id, block_height);
            client_state.validate()?;
            self.store_client_state(LOCALHOST_CLIENT_ID, &AnyClientState::Localhost(client_state));
        }

        tracing::info!(
            clients = genesis.clients.len(),
            next_client_sequence = genesis.next_client_sequence,
            create_localhost = genesis.create_localhost,
            "imported client genesis"
        );
        Ok(())
    }

    /// Exports the keeper state. The localhost client is recreated from `create_localhost`
    /// and is not listed among the clients.
    ///
    /// # Errors
    /// Returns a decoding error if stored state is corrupt.
    pub fn export_genesis(&self) -> Result<GenesisState, ClientError> {
        let mut genesis = GenesisState {
            params: self.params.clone(),
            next_client_sequence: self.next_client_sequence,
            ..GenesisState::default()
        };

        for (client_id, client_state) in self.client_states()? {
            if let AnyClientState::Localhost(_) = client_state {
                genesis.create_localhost = true;
                continue;
            }
            genesis.clients.push(IdentifiedClientState {
                client_id: client_id.clone(),
                client_state: client_state.to_any().into(),
            });

            let consensus_states: Vec<_> = self
                .consensus_states(&client_id)?
                .into_iter()
                .map(|(height, consensus_state)| ConsensusStateWithHeight {
                    height,
                    consensus_state: consensus_state.to_any().into(),
                })
                .collect();
            if !consensus_states.is_empty() {
                genesis.clients_consensus.push(ClientConsensusStates {
                    client_id: client_id.clone(),
                    consensus_states,
                });
            }

            let metadata = export_metadata(&snapshot_client_store(&self.store, &client_id));
            if !metadata.is_empty() {
                genesis.clients_metadata.push(IdentifiedGenesisMetadata {
                    client_id,
                    metadata,
                });
            }
        }
        Ok(genesis)
    }

    /// Creates a client and stores its initial consensus state at its latest height.
    ///
    /// Returns the identifier of the new client, generated when the message names none. A
    /// chosen identifier advances the client sequence past its own.
    ///
    /// # Errors
    /// Returns an error if the message is invalid, the client type is not allowed, the
    /// consensus state does not initialize the client or the identifier is taken.
    #[tracing::instrument(skip_all)]
    pub fn create_client(&mut self, msg: &MsgCreateClient) -> Result<String, ClientError> {
        msg.validate_basic()?;

        let client_state = AnyClientState::from_any(&msg.client_state)?;
        let consensus_state = AnyConsensusState::from_any(&msg.consensus_state)?;
        let client_type = client_state.client_type();
        ensure!(
            self.params.is_allowed_client(client_type),
            ClientError::InvalidClientType {
                reason: format!("client type {client_type} is not in the allowed client list"),
            }
        );

        match (&client_state, &consensus_state) {
            (
                AnyClientState::SoloMachine(client_state),
                AnyConsensusState::SoloMachine(consensus_state),
            ) => client_state.initialize(consensus_state)?,
            (AnyClientState::Tendermint(client_state), AnyConsensusState::Tendermint(_)) => {
                client_state.initialize(&msg.consensus_state)?;
            }
            _ => {
                return Err(ClientError::InvalidClientType {
                    reason: format!(
                        "cannot initialize {client_type} client with {} consensus state",
                        consensus_state.client_type()
                    ),
                })
            }
        }

        let client_id = if msg.client_id.is_empty() {
            format_client_identifier(client_type, self.next_client_sequence)
        } else {
            msg.client_id.clone()
        };
        ensure!(
            !self.has_client(&client_id),
            ClientError::ClientExists { client_id }
        );
        if msg.client_id.is_empty() {
            self.generate_client_identifier(client_type)?;
        } else {
            // generated identifiers must never collide with a chosen one
            let (_, sequence) = parse_client_identifier(&client_id)?;
            self.next_client_sequence = self.next_client_sequence.max(sequence.saturating_add(1));
        }

        let height = client_state.latest_height();
        self.store_client_state(&client_id, &client_state);
        self.store_consensus_state(&client_id, height, &msg.consensus_state, None);

        tracing::info!(%client_id, client_type, %height, "client created");
        self.emit(ClientEvent::new(
            EventType::CreateClient,
            &client_id,
            client_type,
            height,
        ));
        Ok(client_id)
    }

    /// Updates a client with a header. A Tendermint header that conflicts with stored state
    /// freezes the client instead.
    ///
    /// # Errors
    /// Returns an error if the message is invalid, the client does not exist or is frozen at
    /// or below the header height, or the header does not verify.
    #[tracing::instrument(skip_all, fields(client_id = %msg.client_id))]
    pub fn update_client(
        &mut self,
        msg: &MsgUpdateClient,
        now_ns: u64,
    ) -> Result<(), ClientError> {
        msg.validate_basic()?;
        let client_id = msg.client_id.as_str();
        let client_state = self.client_state(client_id)?;
        let header = AnyHeader::from_any(&msg.header)?;

        ensure!(
            !client_state.is_frozen() || client_state.frozen_height() > header.height(),
            ClientError::ClientFrozen
        );

        match (client_state, header) {
            (AnyClientState::SoloMachine(client_state), AnyHeader::SoloMachine(header)) => {
                let (client_state, consensus_state) =
                    solomachine::update::check_header_and_update_state(&client_state, &header)?;
                let height = header.height();
                self.store_client_state(client_id, &AnyClientState::SoloMachine(client_state));
                self.store_consensus_state(client_id, height, &consensus_state.to_any(), None);
                self.updated(client_id, solomachine::SOLOMACHINE_CLIENT_TYPE, height, msg);
            }
            (AnyClientState::Tendermint(client_state), AnyHeader::Tendermint(header)) => {
                let outcome = tendermint::update::check_header_and_update_state(
                    &client_state,
                    &ClientStore::new(&mut self.store, client_id),
                    &header,
                    now_ns,
                )?;
                self.apply_tendermint_outcome(client_id, outcome, now_ns, header.height(), msg);
            }
            (client_state, header) => {
                return Err(ClientError::InvalidClientType {
                    reason: format!(
                        "cannot update {} client with {} header",
                        client_state.client_type(),
                        header.client_type()
                    ),
                })
            }
        }
        Ok(())
    }

    fn updated(
        &mut self,
        client_id: &str,
        client_type: &str,
        height: Height,
        msg: &MsgUpdateClient,
    ) {
        tracing::info!(client_id, client_type, %height, "client state updated");
        self.emit(
            ClientEvent::new(EventType::UpdateClient, client_id, client_type, height)
                .with_header(&msg.header.value),
        );
    }

    fn apply_tendermint_outcome(
        &mut self,
        client_id: &str,
        outcome: UpdateOutcome<tendermint::ClientState, tendermint::ConsensusState>,
        now_ns: u64,
        header_height: Height,
        msg: &MsgUpdateClient,
    ) {
        let client_type = tendermint::TENDERMINT_CLIENT_TYPE;
        match outcome {
            UpdateOutcome::Updated {
                client_state,
                consensus_state,
                height,
            } => {
                self.store_client_state(client_id, &AnyClientState::Tendermint(client_state));
                self.store_consensus_state(
                    client_id,
                    height,
                    &consensus_state.to_any(),
                    Some(now_ns),
                );
                self.updated(client_id, client_type, height, msg);
            }
            UpdateOutcome::Unchanged => {
                tracing::debug!(client_id, height = %header_height, "header already stored");
                self.updated(client_id, client_type, header_height, msg);
            }
            UpdateOutcome::Misbehaviour { client_state } => {
                self.store_client_state(client_id, &AnyClientState::Tendermint(client_state));
                self.frozen(client_id, client_type, header_height);
            }
        }
    }

    fn frozen(&mut self, client_id: &str, client_type: &str, height: Height) {
        tracing::warn!(client_id, client_type, %height, "client frozen due to misbehaviour");
        self.emit(ClientEvent::new(
            EventType::ClientMisbehaviour,
            client_id,
            client_type,
            height,
        ));
    }

    /// Upgrades a client to a client state the counterparty committed to before upgrading.
    ///
    /// Only the client state is replaced.
    ///
    /// # Errors
    /// Returns an error if the message is invalid, the client does not exist, is frozen or
    /// cannot be upgraded, or the upgrade proof does not verify.
    #[tracing::instrument(skip_all, fields(client_id = %msg.client_id))]
    pub fn upgrade_client(
        &mut self,
        msg: &MsgUpgradeClient,
        now_ns: u64,
    ) -> Result<(), ClientError> {
        msg.validate_basic()?;
        let client_id = msg.client_id.as_str();
        let client_state = self.client_state(client_id)?;
        ensure!(!client_state.is_frozen(), ClientError::ClientFrozen);

        let upgraded = AnyClientState::from_any(&msg.client_state)?;
        upgraded.validate()?;

        let client_state = match (client_state, upgraded) {
            (AnyClientState::Tendermint(client_state), AnyClientState::Tendermint(upgraded)) => {
                tendermint::upgrade::verify_upgrade(
                    &client_state,
                    &ClientStore::new(&mut self.store, client_id),
                    &upgraded,
                    msg.upgrade_height,
                    &msg.proof_upgrade,
                    now_ns,
                )
                .map(AnyClientState::Tendermint)?
            }
            (AnyClientState::SoloMachine(client_state), _) => client_state
                .verify_upgrade()
                .map(|()| AnyClientState::SoloMachine(client_state))?,
            (client_state, upgraded) => {
                return Err(ClientError::InvalidUpgradeClient {
                    reason: format!(
                        "cannot upgrade {} client to {}",
                        client_state.client_type(),
                        upgraded.client_type()
                    ),
                })
            }
        };

        let client_type = client_state.client_type();
        let height = client_state.latest_height();
        self.store_client_state(client_id, &client_state);

        tracing::info!(client_id, client_type, %height, "client upgraded");
        self.emit(ClientEvent::new(
            EventType::UpgradeClient,
            client_id,
            client_type,
            height,
        ));
        Ok(())
    }

    /// Freezes a client with evidence of misbehaviour.
    ///
    /// # Errors
    /// Returns an error if the message is invalid, the client does not exist or is already
    /// frozen at or below the misbehaviour height, or the evidence does not verify.
    #[tracing::instrument(skip_all, fields(client_id = %msg.client_id))]
    pub fn submit_misbehaviour(
        &mut self,
        msg: &MsgSubmitMisbehaviour,
        now_ns: u64,
    ) -> Result<(), ClientError> {
        msg.validate_basic()?;
        let client_id = msg.client_id.as_str();
        let client_state = self.client_state(client_id)?;
        let misbehaviour = AnyMisbehaviour::from_any(&msg.misbehaviour)?;
        let height = misbehaviour.height();

        ensure!(
            !client_state.is_frozen() || client_state.frozen_height() > height,
            ClientError::InvalidMisbehaviour {
                reason: format!(
                    "client is already frozen at {}, not above misbehaviour height {height}",
                    client_state.frozen_height()
                ),
            }
        );

        let client_state = match (client_state, misbehaviour) {
            (
                AnyClientState::SoloMachine(client_state),
                AnyMisbehaviour::SoloMachine(misbehaviour),
            ) => solomachine::update::check_misbehaviour_and_update_state(
                &client_state,
                &misbehaviour,
            )
            .map(AnyClientState::SoloMachine)?,
            (
                AnyClientState::Tendermint(client_state),
                AnyMisbehaviour::Tendermint(misbehaviour),
            ) => tendermint::misbehaviour::check_misbehaviour_and_update_state(
                &client_state,
                &ClientStore::new(&mut self.store, client_id),
                &misbehaviour,
                now_ns,
            )
            .map(AnyClientState::Tendermint)?,
            (client_state, misbehaviour) => {
                return Err(ClientError::InvalidClientType {
                    reason: format!(
                        "cannot submit {} misbehaviour against {} client",
                        misbehaviour.client_type(),
                        client_state.client_type()
                    ),
                })
            }
        };

        self.store_client_state(client_id, &client_state);
        self.frozen(client_id, client_state.client_type(), height);
        Ok(())
    }

    /// Executes a passed [`ClientUpdateProposal`]: the subject takes over the state of the
    /// substitute.
    ///
    /// # Errors
    /// Returns an error if the proposal is invalid, either client is missing, the subject is
    /// not older than `initial_height`, the clients are not of the same recoverable type or
    /// the substitution is rejected by the client.
    #[tracing::instrument(skip_all, fields(subject = %proposal.subject_client_id))]
    pub fn client_update_proposal(
        &mut self,
        proposal: &ClientUpdateProposal,
        now_ns: u64,
    ) -> Result<(), ClientError> {
        proposal.validate_basic()?;
        let subject_id = proposal.subject_client_id.as_str();
        let substitute_id = proposal.substitute_client_id.as_str();
        let subject = self.client_state(subject_id)?;
        let substitute = self.client_state(substitute_id)?;

        ensure!(
            subject.latest_height() < proposal.initial_height,
            ClientError::InvalidHeight {
                reason: format!(
                    "subject latest height {} must be less than initial height {}",
                    subject.latest_height(),
                    proposal.initial_height
                ),
            }
        );

        let client_state = match (subject, substitute) {
            (AnyClientState::SoloMachine(subject), AnyClientState::SoloMachine(substitute)) => {
                let client_state =
                    solomachine::update::check_substitute_and_update_state(&subject, &substitute)?;
                let height = client_state.latest_height();
                self.store_consensus_state(
                    subject_id,
                    height,
                    &client_state.consensus_state.to_any(),
                    None,
                );
                AnyClientState::SoloMachine(client_state)
            }
            (AnyClientState::Tendermint(subject), AnyClientState::Tendermint(substitute)) => {
                let substitute_store = snapshot_client_store(&self.store, substitute_id);
                tendermint::proposal::check_substitute_and_update_state(
                    &subject,
                    &mut ClientStore::new(&mut self.store, subject_id),
                    &substitute,
                    &substitute_store,
                    proposal.initial_height,
                    now_ns,
                )
                .map(AnyClientState::Tendermint)?
            }
            (subject, substitute) => {
                return Err(ClientError::InvalidClient {
                    reason: format!(
                        "cannot substitute {} client {subject_id} with {} client {substitute_id}",
                        subject.client_type(),
                        substitute.client_type()
                    ),
                })
            }
        };

        let client_type = client_state.client_type();
        let height = client_state.latest_height();
        self.store_client_state(subject_id, &client_state);

        tracing::info!(
            client_id = subject_id,
            substitute = substitute_id,
            client_type,
            %height,
            "client updated after proposal"
        );
        self.emit(ClientEvent::new(
            EventType::UpdateClientProposal,
            subject_id,
            client_type,
            height,
        ));
        Ok(())
    }

    /// Applies a governance approved header to a frozen or expired client.
    ///
    /// # Errors
    /// Returns an error if the client does not exist, the header does not decode or
    /// validate, or the client rejects the recovery.
    #[tracing::instrument(skip_all, fields(%client_id))]
    pub fn apply_proposed_header(
        &mut self,
        client_id: &str,
        header: &Any,
        now_ns: u64,
    ) -> Result<(), ClientError> {
        let client_state = self.client_state(client_id)?;
        let header = AnyHeader::from_any(header)?;
        header.validate_basic()?;

        let (client_state, height) = match (client_state, header) {
            (AnyClientState::SoloMachine(client_state), AnyHeader::SoloMachine(header)) => {
                let (client_state, consensus_state) =
                    solomachine::update::check_proposed_header_and_update_state(
                        &client_state,
                        &header,
                    )?;
                let height = client_state.latest_height();
                self.store_consensus_state(client_id, height, &consensus_state.to_any(), None);
                (AnyClientState::SoloMachine(client_state), height)
            }
            (AnyClientState::Tendermint(client_state), AnyHeader::Tendermint(header)) => {
                let outcome = tendermint::proposal::check_proposed_header_and_update_state(
                    &client_state,
                    &ClientStore::new(&mut self.store, client_id),
                    &header,
                    now_ns,
                )?;
                match outcome {
                    UpdateOutcome::Updated {
                        client_state,
                        consensus_state,
                        height,
                    } => {
                        self.store_consensus_state(
                            client_id,
                            height,
                            &consensus_state.to_any(),
                            Some(now_ns),
                        );
                        (AnyClientState::Tendermint(client_state), height)
                    }
                    UpdateOutcome::Misbehaviour { client_state } => {
                        let height = header.height();
                        self.store_client_state(
                            client_id,
                            &AnyClientState::Tendermint(client_state),
                        );
                        self.frozen(client_id, tendermint::TENDERMINT_CLIENT_TYPE, height);
                        return Ok(());
                    }
                    UpdateOutcome::Unchanged => return Ok(()),
                }
            }
            (client_state, header) => {
                return Err(ClientError::InvalidClientType {
                    reason: format!(
                        "cannot update {} client with {} header",
                        client_state.client_type(),
                        header.client_type()
                    ),
                })
            }
        };

        let client_type = client_state.client_type();
        self.store_client_state(client_id, &client_state);
        tracing::info!(client_id, client_type, %height, "client updated after proposal");
        self.emit(ClientEvent::new(
            EventType::UpdateClientProposal,
            client_id,
            client_type,
            height,
        ));
        Ok(())
    }

    /// Moves the localhost client, if there is one, to the host block height.
    ///
    /// # Errors
    /// Returns an error if the stored localhost client is corrupt or the height is zero.
    pub fn begin_block(&mut self, block_height: u64) -> Result<(), ClientError> {
        let Some(any) = self.read_any(&client_state_path(LOCALHOST_CLIENT_ID))? else {
            return Ok(());
        };
        let mut client_state = localhost::ClientState::from_any(&any)?;
        client_state.advance(block_height);
        client_state.validate()?;
        tracing::debug!(height = %client_state.height, "advanced localhost client");
        self.store_client_state(LOCALHOST_CLIENT_ID, &AnyClientState::Localhost(client_state));
        Ok(())
    }

    /// Verifies that `target` is committed by the counterparty of `client_id` at `height`.
    ///
    /// Solo machine clients consume a sequence on success and are persisted. The localhost
    /// client reads the host store and takes no proof.
    ///
    /// # Errors
    /// Returns an error if the client does not exist or the proof does not verify.
    pub fn verify_commitment(
        &mut self,
        client_id: &str,
        height: Height,
        prefix: &MerklePrefix,
        proof: &[u8],
        target: &CommitmentTarget,
        delay: Option<DelayPeriod>,
    ) -> Result<(), ClientError> {
        match self.client_state(client_id)? {
            AnyClientState::SoloMachine(mut client_state) => {
                solomachine::verify::verify_commitment(
                    &mut client_state,
                    height,
                    prefix,
                    proof,
                    target,
                )?;
                self.store_client_state(client_id, &AnyClientState::SoloMachine(client_state));
                Ok(())
            }
            AnyClientState::Tendermint(client_state) => tendermint::verify::verify_commitment(
                &client_state,
                &ClientStore::new(&mut self.store, client_id),
                height,
                prefix,
                proof,
                target,
                delay,
            ),
            AnyClientState::Localhost(client_state) => {
                client_state.verify_commitment(&self.store, target)
            }
        }
    }
}
