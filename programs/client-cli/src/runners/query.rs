//! Runner for the query subcommands.

use anyhow::Result;
use ibc_client_keeper::{
    genesis::{ClientConsensusStates, ConsensusStateWithHeight, IdentifiedClientState},
    AnyClientState, AnyConsensusState,
};
use ibc_light_client_core::Height;
use serde_json::{json, Value};

use super::Context;
use crate::cli::cmd::query::Cmds;

fn identified(client_id: String, client_state: &AnyClientState) -> IdentifiedClientState {
    IdentifiedClientState {
        client_id,
        client_state: client_state.to_any().into(),
    }
}

fn with_height(height: Height, consensus_state: &AnyConsensusState) -> ConsensusStateWithHeight {
    ConsensusStateWithHeight {
        height,
        consensus_state: consensus_state.to_any().into(),
    }
}

/// Runs a query.
///
/// # Errors
/// Returns an error if the genesis file cannot be loaded or the queried state is missing.
pub fn run(ctx: &Context, cmd: Cmds) -> Result<Value> {
    let keeper = ctx.load()?;
    let output = match cmd {
        Cmds::States => {
            let states: Vec<_> = keeper
                .client_states()?
                .into_iter()
                .map(|(client_id, client_state)| identified(client_id, &client_state))
                .collect();
            serde_json::to_value(states)?
        }
        Cmds::State { client_id } => {
            let client_state = keeper.client_state(&client_id)?;
            serde_json::to_value(identified(client_id, &client_state))?
        }
        Cmds::ConsensusStates { client_id } => {
            let consensus_states = keeper
                .consensus_states(&client_id)?
                .into_iter()
                .map(|(height, consensus_state)| with_height(height, &consensus_state))
                .collect();
            serde_json::to_value(ClientConsensusStates {
                client_id,
                consensus_states,
            })?
        }
        Cmds::ConsensusState {
            client_id,
            height,
            latest_height,
        } => {
            let (height, consensus_state) = match height {
                Some(height) if !latest_height => {
                    (height, keeper.consensus_state(&client_id, height)?)
                }
                _ => keeper.latest_consensus_state(&client_id)?,
            };
            serde_json::to_value(with_height(height, &consensus_state))?
        }
        Cmds::Params => serde_json::to_value(keeper.params())?,
        Cmds::Status { client_id } => {
            let status = keeper.client_status(&client_id, ctx.now_ns)?;
            json!({ "client_id": client_id, "status": status })
        }
    };
    Ok(output)
}
