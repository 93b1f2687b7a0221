use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

pub(crate) const DEFAULT_RPC_PROVIDER: &str = "https://ethereum-rpc.publicnode.com";
pub(crate) const DEFAULT_RPC_THROTTLING: u32 = 15;

#[derive(Parser, Debug)]
#[command(name = "fund-value-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to
    #[arg(long, global = true, default_value_t = DEFAULT_RPC_PROVIDER.to_string() )]
    pub rpc: String,

    /// RPC throttling (req/sec) [default: 15 for default RPC provider and
    /// none for custom]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Block number to fetch state at [default: latest block]
    #[arg(long, global = true)]
    pub block: Option<u64>,

    /// Deployment configuration JSON file [default: Ethereum mainnet
    /// deployment]
    #[arg(long, global = true)]
    pub deployment: Option<PathBuf>,

    /// Log output format, level is controlled via `RUST_LOG`
    #[arg(long, global = true, value_enum, default_value_t)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the canonical value of an asset amount in a quote asset
    Value {
        /// Asset to value
        #[arg(long)]
        asset: Address,

        /// Amount in asset units, e.g. `1.5`
        #[arg(long)]
        amount: String,

        /// Primitive asset to quote the value in
        #[arg(long)]
        quote: Address,
    },
    /// Show underlying assets and amounts of a derivative amount
    Underlying {
        /// Derivative asset
        #[arg(long)]
        asset: Address,

        /// Amount in asset units, e.g. `1.5`
        #[arg(long)]
        amount: String,
    },
    /// Show the gross value of a set of holdings in a quote asset
    Gav {
        /// Holding as `<asset>=<amount>`, can be repeated
        #[arg(long = "holding", required = true, value_parser = parse_holding)]
        holdings: Vec<(Address, String)>,

        /// Primitive asset to quote the value in
        #[arg(long)]
        quote: Address,
    },
    /// Show registered Synths with their currency keys and rates
    Synths,
}

fn parse_holding(s: &str) -> Result<(Address, String), String> {
    let (asset, amount) = s.split_once('=').ok_or_else(|| format!("expected <asset>=<amount>, got `{s}`"))?;
    let asset = asset.trim().parse::<Address>().map_err(|err| format!("invalid asset `{asset}`: {err}"))?;
    Ok((asset, amount.trim().to_string()))
}
