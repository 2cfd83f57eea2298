//! Runner for the genesis subcommands.

use anyhow::Result;
use serde_json::{json, Value};

use super::Context;
use crate::cli::cmd::genesis::Cmds;

/// Runs a genesis subcommand.
///
/// # Errors
/// Returns an error if the genesis file is missing, cannot be parsed or is invalid.
pub fn run(ctx: &Context, cmd: &Cmds) -> Result<Value> {
    match cmd {
        Cmds::Validate => {
            anyhow::ensure!(
                ctx.genesis_file.exists(),
                "genesis file {} not found",
                ctx.genesis_file.display()
            );
            let genesis = ctx.read_genesis()?;
            genesis.validate()?;
            Ok(json!({
                "valid": true,
                "clients": genesis.clients.len(),
                "create_localhost": genesis.create_localhost,
            }))
        }
    }
}
