pub mod args;
pub mod logging;
mod synths;
mod value;

use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::BlockId},
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::Cli;
use fund_value_sdk::{
    Deployment,
    release::Release,
    state::{ChainState, SnapshotBuilder},
};
use tracing::{debug, info};

use crate::args::Commands;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init(cli.log_format);

    let client = if cli.rpc == args::DEFAULT_RPC_PROVIDER || cli.rpc_throttle.is_some() {
        // Apply throttling with default RPC
        RpcClient::builder()
            .layer(ThrottleLayer::new(cli.rpc_throttle.unwrap_or(args::DEFAULT_RPC_THROTTLING)))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(100));
    let provider = ProviderBuilder::new().connect_client(client);

    let deployment = load_deployment(&cli)?;
    let chain_id = provider.get_chain_id().await.context("fetching chain ID")?;
    anyhow::ensure!(
        chain_id == deployment.chain_id(),
        "deployment is for chain {}, RPC serves chain {}",
        deployment.chain_id(),
        chain_id
    );

    let mut builder = SnapshotBuilder::new(&deployment, provider).with_assets(command_assets(&cli.command));
    if let Some(block) = cli.block {
        builder = builder.at_block(BlockId::number(block));
    }
    let state = builder.build().await.context("building price feed snapshot")?;
    info!(instant = %state.instant(), "snapshot captured");

    let (release, events) = Release::deploy(&deployment, &state).context("deploying price feeds")?;
    for event in &events {
        debug!(%event, "registration");
    }

    match &cli.command {
        Commands::Value { asset, amount, quote } => value::render_value(&release, &state, *asset, amount, *quote)?,
        Commands::Underlying { asset, amount } => value::render_underlying(&release, &state, *asset, amount)?,
        Commands::Gav { holdings, quote } => value::render_gav(&release, &state, holdings, *quote)?,
        Commands::Synths => synths::render(&release, &state)?,
    }

    Ok(())
}

fn load_deployment(cli: &Cli) -> anyhow::Result<Deployment> {
    let Some(path) = &cli.deployment else { return Ok(Deployment::mainnet()) };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading deployment {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing deployment {}", path.display()))
}

/// Assets referenced by the command, decimals of which are captured on top
/// of the deployment assets.
fn command_assets(command: &Commands) -> Vec<Address> {
    match command {
        Commands::Value { asset, quote, .. } => vec![*asset, *quote],
        Commands::Underlying { asset, .. } => vec![*asset],
        Commands::Gav { holdings, quote } => {
            holdings.iter().map(|(asset, _)| *asset).chain(std::iter::once(*quote)).collect()
        },
        Commands::Synths => vec![],
    }
}
