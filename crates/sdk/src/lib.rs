//! Fund asset valuation SDK.
//!
//! # Overview
//!
//! Prices the heterogeneous assets a fund can hold and aggregates them into
//! a canonical value in a single quote asset.
//!
//! Use [`state::SnapshotBuilder`] to capture the on-chain inputs of the
//! price feeds (token decimals, Synthetix rates, Chainlink rounds) at a
//! given block, then [`release::Release::deploy`] to wire the feeds from a
//! [`Deployment`] and [`value_interpreter::ValueInterpreter`] to compute
//! values against the snapshot.
//!
//! See `./tests` for examples.
//!
//! # Price feeds
//!
//! * [`feeds::ChainlinkPriceFeed`] prices primitives through Chainlink
//!   aggregators, with either ETH or USD as the rate asset.
//! * [`feeds::SynthetixPriceFeed`] decomposes Synths into sUSD using the
//!   Synthetix exchange rates.
//! * [`feeds::SinglePeggedDerivativePriceFeed`] decomposes a derivative
//!   pegged 1:1 to its underlying, e.g. Lido stETH to WETH.
//! * [`feeds::AggregatedDerivativePriceFeed`] dispatches each derivative to
//!   the feed responsible for it.
//!
//! # Limitations/follow-ups
//!
//! * Only canonical values are supported; "live" values with best-effort
//!   validity are not.
//!
//! * Chain state is read from a snapshot pinned at a single block, values
//!   may differ from a later transaction executed against a newer state.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for release and value types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides a mainnet snapshot fixture as of July 16,
//! 2021 with deterministic oracle rates.

pub mod abi;
pub mod access;
pub mod error;
pub mod feeds;
pub mod num;
pub mod release;
pub mod state;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;
pub mod value_interpreter;

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Deployment of the price feeds on a particular chain.
///
/// Can be loaded from JSON, see [`Deployment::mainnet`] for the default
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    chain_id: u64,
    fund_deployer_owner: Address,
    weth: Address,
    eth_usd_aggregator: Address,
    stale_rate_threshold: u64,
    primitives: Vec<PrimitiveConfig>,
    synthetix: SynthetixConfig,
    #[serde(default)]
    pegged_derivatives: Vec<PeggedDerivativeConfig>,
}

/// Primitive priced through a Chainlink aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveConfig {
    pub asset: Address,
    pub aggregator: Address,
    pub rate_asset: types::RateAsset,
}

/// Synthetix integration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthetixConfig {
    pub address_resolver: Address,
    pub susd: Address,
    pub synths: Vec<Address>,
}

/// Derivative pegged 1:1 to its underlying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeggedDerivativeConfig {
    pub derivative: Address,
    pub underlying: Address,
}

impl Deployment {
    /// Ethereum mainnet.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            fund_deployer_owner: address!("0xb270FE91e8E4b80452fBF1b4704208792A350f53"),
            weth: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            eth_usd_aggregator: address!("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"),
            stale_rate_threshold: 86400,
            primitives: vec![
                PrimitiveConfig {
                    asset: address!("0x6B175474E89094C44Da98b954EedeAC495271d0F"), // DAI
                    aggregator: address!("0xAed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9"),
                    rate_asset: types::RateAsset::Usd,
                },
                PrimitiveConfig {
                    asset: address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // USDC
                    aggregator: address!("0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6"),
                    rate_asset: types::RateAsset::Usd,
                },
                PrimitiveConfig {
                    asset: address!("0x57Ab1ec28D129707052df4dF418D58a2D46d5f51"), // sUSD
                    aggregator: address!("0x8e0b7e6062272B5eF4524250bFFF8e5Bd3497757"),
                    rate_asset: types::RateAsset::Eth,
                },
            ],
            synthetix: SynthetixConfig {
                address_resolver: address!("0x4E3b31eB0E5CB73641EE1E65E7dCEFe520bA3ef2"),
                susd: address!("0x57Ab1ec28D129707052df4dF418D58a2D46d5f51"),
                synths: vec![
                    address!("0xfE18be6b3Bd88A2D2A7f928d00292E7a9963CfC6"), // sBTC
                    address!("0x5e74C9036fb86BD7eCdcb084a0673EFc32eA31cb"), // sETH
                ],
            },
            pegged_derivatives: vec![PeggedDerivativeConfig {
                derivative: address!("0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84"), // stETH
                underlying: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            }],
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn custom(
        chain_id: u64,
        fund_deployer_owner: Address,
        weth: Address,
        eth_usd_aggregator: Address,
        stale_rate_threshold: u64,
        primitives: Vec<PrimitiveConfig>,
        synthetix: SynthetixConfig,
        pegged_derivatives: Vec<PeggedDerivativeConfig>,
    ) -> Self {
        Self {
            chain_id,
            fund_deployer_owner,
            weth,
            eth_usd_aggregator,
            stale_rate_threshold,
            primitives,
            synthetix,
            pegged_derivatives,
        }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    /// Account allowed to mutate the feed registries.
    pub fn fund_deployer_owner(&self) -> Address { self.fund_deployer_owner }

    pub fn weth(&self) -> Address { self.weth }

    pub fn eth_usd_aggregator(&self) -> Address { self.eth_usd_aggregator }

    /// Maximum age of a Chainlink round, in seconds.
    pub fn stale_rate_threshold(&self) -> u64 { self.stale_rate_threshold }

    pub fn primitives(&self) -> &[PrimitiveConfig] { &self.primitives }

    pub fn synthetix(&self) -> &SynthetixConfig { &self.synthetix }

    pub fn pegged_derivatives(&self) -> &[PeggedDerivativeConfig] { &self.pegged_derivatives }

    /// All Chainlink aggregators the deployment reads, ETH/USD included.
    pub fn aggregators(&self) -> Vec<Address> {
        std::iter::once(self.eth_usd_aggregator)
            .chain(self.primitives.iter().map(|p| p.aggregator))
            .collect()
    }

    /// All assets the deployment prices.
    pub fn assets(&self) -> Vec<Address> {
        let mut assets: Vec<_> = std::iter::once(self.weth)
            .chain(self.primitives.iter().map(|p| p.asset))
            .chain(self.synthetix.synths.iter().copied())
            .chain(self.pegged_derivatives.iter().map(|p| p.derivative))
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }
}
