//! Deterministic Ethereum mainnet fixture.
//!
//! Reproduces the price feed inputs of block 12,840,000 (July 16, 2021)
//! with fixed oracle answers, so that valuations are stable across runs:
//!
//! | Source | Answer |
//! | --- | --- |
//! | Synthetix `sBTC` rate | 31932.057293867791638292 sUSD |
//! | Synthetix `sETH` rate | 2000 sUSD |
//! | Chainlink ETH/USD | 2000.00000000 |
//! | Chainlink DAI/USD | 1.00002114 |
//! | Chainlink USDC/USD | 0.99992500 |
//! | Chainlink sUSD/ETH | 0.0005 |
//!
//! At these rates 1 sBTC is worth `31931.382264446721234605` DAI and
//! `31934.452377` USDC.

use alloy::primitives::{Address, U256, address};

use crate::{
    Deployment,
    error::PriceFeedError,
    release::Release,
    state::Snapshot,
    types::{ExchangeRate, FeedEvent, RoundData, StateInstant, currency_key},
};

pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const SUSD: Address = address!("0x57Ab1ec28D129707052df4dF418D58a2D46d5f51");
pub const SBTC: Address = address!("0xfE18be6b3Bd88A2D2A7f928d00292E7a9963CfC6");
pub const SETH: Address = address!("0x5e74C9036fb86BD7eCdcb084a0673EFc32eA31cb");
pub const STETH: Address = address!("0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84");

pub const ETH_USD_AGGREGATOR: Address = address!("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419");
pub const DAI_USD_AGGREGATOR: Address = address!("0xAed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9");
pub const USDC_USD_AGGREGATOR: Address = address!("0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6");
pub const SUSD_ETH_AGGREGATOR: Address = address!("0x8e0b7e6062272B5eF4524250bFFF8e5Bd3497757");

pub const FIXTURE_BLOCK: u64 = 12_840_000;
pub const FIXTURE_TIMESTAMP: u64 = 1_626_393_600;

/// Age of every Chainlink round at the fixture instant, in seconds.
pub const ROUND_AGE: u64 = 600;

pub const SBTC_RATE: u128 = 31_932_057_293_867_791_638_292;
pub const SETH_RATE: u128 = 2_000_000_000_000_000_000_000;
pub const ETH_USD_ANSWER: u64 = 200_000_000_000;
pub const DAI_USD_ANSWER: u64 = 100_002_114;
pub const USDC_USD_ANSWER: u64 = 99_992_500;
pub const SUSD_ETH_ANSWER: u64 = 500_000_000_000_000;

pub fn fixture_instant() -> StateInstant { StateInstant::new(FIXTURE_BLOCK, FIXTURE_TIMESTAMP) }

/// Snapshot of the mainnet price feed inputs, see module docs.
pub fn mainnet_snapshot() -> Snapshot {
    let updated_at = FIXTURE_TIMESTAMP - ROUND_AGE;
    let sbtc = currency_key("sBTC").unwrap_or_default();
    let seth = currency_key("sETH").unwrap_or_default();

    Snapshot::new(fixture_instant())
        .with_decimals(WETH, 18)
        .with_decimals(DAI, 18)
        .with_decimals(USDC, 6)
        .with_decimals(SUSD, 18)
        .with_decimals(SBTC, 18)
        .with_decimals(SETH, 18)
        .with_decimals(STETH, 18)
        .with_currency_key(SBTC, sbtc)
        .with_currency_key(SETH, seth)
        .with_exchange_rate(sbtc, ExchangeRate::valid(U256::from(SBTC_RATE)))
        .with_exchange_rate(seth, ExchangeRate::valid(U256::from(SETH_RATE)))
        .with_round(ETH_USD_AGGREGATOR, RoundData::from_unsigned(U256::from(ETH_USD_ANSWER), updated_at))
        .with_round(DAI_USD_AGGREGATOR, RoundData::from_unsigned(U256::from(DAI_USD_ANSWER), updated_at))
        .with_round(USDC_USD_AGGREGATOR, RoundData::from_unsigned(U256::from(USDC_USD_ANSWER), updated_at))
        .with_round(SUSD_ETH_AGGREGATOR, RoundData::from_unsigned(U256::from(SUSD_ETH_ANSWER), updated_at))
}

/// [`Deployment::mainnet`] deployed against `state`.
pub fn mainnet_release(state: &Snapshot) -> Result<(Release, Vec<FeedEvent>), PriceFeedError> {
    Release::deploy(&Deployment::mainnet(), state)
}
