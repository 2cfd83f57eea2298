//! Runners for the subcommands. Every runner loads the client store from the genesis file,
//! executes against a [`ClientKeeper`] and returns its output as JSON.

pub mod genesis;
pub mod query;
pub mod tx;

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context as _, Result};
use ibc_client_keeper::{genesis::PackedAny, ClientKeeper, GenesisState};
use ibc_light_client_core::{store::MemoryStore, Any};
use serde_json::Value;

use crate::cli::{CliConfig, Commands, GlobalArgs};

/// Where the client store lives and the host block the command executes in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    /// Genesis file holding the client store
    pub genesis_file: PathBuf,
    /// Chain id of the host
    pub host_chain_id: String,
    /// Host block height
    pub block_height: u64,
    /// Host time in nanoseconds since the unix epoch
    pub now_ns: u64,
}

impl Context {
    /// Combines the resolved configuration with the per-invocation flags.
    ///
    /// # Errors
    /// Returns an error if no host time is given and the system clock is before the unix
    /// epoch.
    pub fn new(config: &CliConfig, args: &GlobalArgs) -> Result<Self> {
        let now_ns = match args.now_ns {
            Some(now_ns) => now_ns,
            None => u64::try_from(SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos())?,
        };
        Ok(Self {
            genesis_file: config.genesis_file.clone(),
            host_chain_id: config.host_chain_id.clone(),
            block_height: args.block_height,
            now_ns,
        })
    }

    /// Reads the genesis file, or an empty genesis if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_genesis(&self) -> Result<GenesisState> {
        if !self.genesis_file.exists() {
            tracing::info!(path = %self.genesis_file.display(), "no genesis file, starting empty");
            return Ok(GenesisState::default());
        }
        let bytes = fs::read(&self.genesis_file)
            .with_context(|| format!("failed to read {}", self.genesis_file.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid genesis file {}", self.genesis_file.display()))
    }

    /// A keeper initialized from the genesis file.
    ///
    /// # Errors
    /// Returns an error if the genesis file cannot be read or is invalid.
    pub fn load(&self) -> Result<ClientKeeper<MemoryStore>> {
        let genesis = self.read_genesis()?;
        let mut keeper = ClientKeeper::new(MemoryStore::new(), &self.host_chain_id);
        keeper.init_genesis(&genesis, self.block_height)?;
        keeper.take_events();
        Ok(keeper)
    }

    /// Writes the state of `keeper` back to the genesis file.
    ///
    /// # Errors
    /// Returns an error if the state cannot be exported or the file cannot be written.
    pub fn save(&self, keeper: &ClientKeeper<MemoryStore>) -> Result<()> {
        let genesis = keeper.export_genesis()?;
        let bytes = serde_json::to_vec_pretty(&genesis)?;
        fs::write(&self.genesis_file, bytes)
            .with_context(|| format!("failed to write {}", self.genesis_file.display()))?;
        tracing::info!(
            path = %self.genesis_file.display(),
            clients = genesis.clients.len(),
            "genesis file written"
        );
        Ok(())
    }
}

/// Runs `command` in `ctx`.
///
/// # Errors
/// Returns the error of the runner.
pub fn run(ctx: &Context, command: Commands) -> Result<Value> {
    match command {
        Commands::Query(cmd) => query::run(ctx, cmd),
        Commands::Tx(cmd) => tx::run(ctx, cmd),
        Commands::Genesis(cmd) => genesis::run(ctx, &cmd),
    }
}

/// Reads a packed any-value from a JSON file.
fn read_any(path: &Path) -> Result<Any> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let packed: PackedAny = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a packed any", path.display()))?;
    Ok(packed.into())
}
