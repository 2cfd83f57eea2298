//! Defines the command line interface of `ibc-client`.

use std::path::PathBuf;

use clap::Parser;

/// The command line interface for the client keeper.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "ibc-client",
    version,
    about = "IBC light clients over a genesis file",
    long_about = "Creates, updates, upgrades and queries IBC light clients.\nThe client store is read from and written back to a genesis file."
)]
pub struct ClientCli {
    /// Options shared by every subcommand.
    #[clap(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand. They override the configuration file.
#[derive(Clone, Debug, Default, Parser)]
pub struct GlobalArgs {
    /// JSON configuration file.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Genesis file holding the client store.
    #[clap(long, global = true)]
    pub genesis: Option<PathBuf>,

    /// Chain id of the host, used by the localhost client.
    #[clap(long, global = true)]
    pub host_chain_id: Option<String>,

    /// Log level, e.g. 'debug'.
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    /// Host time in nanoseconds since the unix epoch. [default: system time]
    #[clap(long, global = true)]
    pub now_ns: Option<u64>,

    /// Host block height the command executes at.
    #[clap(long, global = true, default_value_t = 1)]
    pub block_height: u64,
}

/// The subcommands of `ibc-client`.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Read client states, consensus states and parameters.
    #[command(subcommand)]
    Query(query::Cmds),

    /// Submit client messages.
    Tx(tx::Cmd),

    /// Inspect the genesis file.
    #[command(subcommand)]
    Genesis(genesis::Cmds),
}

/// The query subcommands.
pub mod query {
    use ibc_light_client_core::Height;

    use super::Parser;

    /// The query subcommands.
    #[derive(Clone, Debug, Parser)]
    pub enum Cmds {
        /// All client states.
        States,
        /// The client state of one client.
        State {
            /// Client identifier.
            client_id: String,
        },
        /// All consensus states of one client.
        ConsensusStates {
            /// Client identifier.
            client_id: String,
        },
        /// The consensus state of one client at a height.
        ConsensusState {
            /// Client identifier.
            client_id: String,
            /// Height in 'revision_number-revision_height' format.
            #[clap(required_unless_present = "latest_height")]
            height: Option<Height>,
            /// Use the latest height of the client instead.
            #[clap(long, conflicts_with = "height")]
            latest_height: bool,
        },
        /// The client parameters.
        Params,
        /// The status of one client at the host time.
        Status {
            /// Client identifier.
            client_id: String,
        },
    }
}

/// The transaction subcommands.
pub mod tx {
    use std::path::PathBuf;

    use ibc_light_client_core::Height;

    use super::Parser;

    /// Arguments shared by the transaction subcommands.
    #[derive(Clone, Debug, Parser)]
    #[command(about = "Submit client messages")]
    pub struct Cmd {
        /// Bech32 address of the submitter.
        #[clap(long)]
        pub signer: String,

        /// The message to submit.
        #[command(subcommand)]
        pub command: Cmds,
    }

    /// The transaction subcommands.
    #[derive(Clone, Debug, Parser)]
    pub enum Cmds {
        /// Create a client.
        Create {
            /// JSON file with the packed client state.
            client_state: PathBuf,
            /// JSON file with the packed consensus state.
            consensus_state: PathBuf,
            /// Identifier to create the client under. [default: generated]
            #[clap(long, default_value = "")]
            client_id: String,
        },
        /// Update a client with a header.
        Update {
            /// Client identifier.
            client_id: String,
            /// JSON file with the packed header.
            header: PathBuf,
        },
        /// Upgrade a client to a state committed by its counterparty.
        Upgrade {
            /// Client identifier.
            client_id: String,
            /// JSON file with the packed upgraded client state.
            client_state: PathBuf,
            /// Height of the upgrade plan in 'revision_number-revision_height' format.
            upgrade_height: Height,
            /// Hex encoded proof of the upgraded client state.
            proof_upgrade: String,
        },
        /// Submit misbehaviour evidence.
        Misbehaviour {
            /// JSON file with the packed misbehaviour.
            misbehaviour: PathBuf,
        },
        /// Execute a governance proposal.
        #[command(subcommand)]
        Proposal(ProposalCmds),
    }

    /// The proposal subcommands.
    #[derive(Clone, Debug, Parser)]
    pub enum ProposalCmds {
        /// Replace a frozen or expired client with the state of a substitute.
        UpdateClient {
            /// Client to recover.
            subject_client_id: String,
            /// Client whose state the subject takes over.
            substitute_client_id: String,
            /// Height from which consensus states are copied.
            initial_height: Height,
            /// Proposal title.
            #[clap(long)]
            title: String,
            /// Proposal description.
            #[clap(long)]
            description: String,
        },
    }
}

/// The genesis subcommands.
pub mod genesis {
    use super::Parser;

    /// The genesis subcommands.
    #[derive(Clone, Debug, Parser)]
    pub enum Cmds {
        /// Validate the genesis file.
        Validate,
    }
}
