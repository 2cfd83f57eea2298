//! Runner for the transaction subcommands.

use anyhow::{Context as _, Result};
use ibc_client_keeper::{
    msgs::{MsgCreateClient, MsgSubmitMisbehaviour, MsgUpdateClient, MsgUpgradeClient},
    AnyMisbehaviour, ClientUpdateProposal,
};
use serde_json::{json, Value};

use super::{read_any, Context};
use crate::cli::cmd::tx::{Cmd, Cmds, ProposalCmds};

/// Executes a client message and writes the resulting state back to the genesis file.
///
/// Outputs the affected client and the events the message emitted.
///
/// # Errors
/// Returns an error if an input cannot be read or the keeper rejects the message. The
/// genesis file is left untouched on error.
pub fn run(ctx: &Context, cmd: Cmd) -> Result<Value> {
    let mut keeper = ctx.load()?;
    let signer = cmd.signer;

    let client_id = match cmd.command {
        Cmds::Create {
            client_state,
            consensus_state,
            client_id,
        } => keeper.create_client(&MsgCreateClient {
            client_id,
            client_state: read_any(&client_state)?,
            consensus_state: read_any(&consensus_state)?,
            signer,
        })?,
        Cmds::Update { client_id, header } => {
            keeper.update_client(
                &MsgUpdateClient {
                    client_id: client_id.clone(),
                    header: read_any(&header)?,
                    signer,
                },
                ctx.now_ns,
            )?;
            client_id
        }
        Cmds::Upgrade {
            client_id,
            client_state,
            upgrade_height,
            proof_upgrade,
        } => {
            let proof_upgrade =
                hex::decode(proof_upgrade.trim_start_matches("0x")).context("invalid proof hex")?;
            keeper.upgrade_client(
                &MsgUpgradeClient {
                    client_id: client_id.clone(),
                    client_state: read_any(&client_state)?,
                    upgrade_height,
                    proof_upgrade,
                    signer,
                },
                ctx.now_ns,
            )?;
            client_id
        }
        Cmds::Misbehaviour { misbehaviour } => {
            let misbehaviour = read_any(&misbehaviour)?;
            let client_id = AnyMisbehaviour::from_any(&misbehaviour)?
                .client_id()
                .to_string();
            keeper.submit_misbehaviour(
                &MsgSubmitMisbehaviour {
                    client_id: client_id.clone(),
                    misbehaviour,
                    signer,
                },
                ctx.now_ns,
            )?;
            client_id
        }
        Cmds::Proposal(ProposalCmds::UpdateClient {
            subject_client_id,
            substitute_client_id,
            initial_height,
            title,
            description,
        }) => {
            keeper.client_update_proposal(
                &ClientUpdateProposal {
                    title,
                    description,
                    subject_client_id: subject_client_id.clone(),
                    substitute_client_id,
                    initial_height,
                },
                ctx.now_ns,
            )?;
            subject_client_id
        }
    };

    ctx.save(&keeper)?;
    Ok(json!({ "client_id": client_id, "events": keeper.take_events() }))
}
