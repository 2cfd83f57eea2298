use clap::Parser;
use ibc_client_cli::{
    cli::{CliConfig, ClientCli},
    observability::init_subscriber,
    runners::{self, Context},
};

fn main() -> anyhow::Result<()> {
    let cli = ClientCli::parse();
    let config = CliConfig::resolve(&cli.global)?;
    init_subscriber(config.log_level())?;
    tracing::debug!(?config, "configuration resolved");

    let ctx = Context::new(&config, &cli.global)?;
    let output = runners::run(&ctx, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
