use std::fmt::Display;

use alloy::primitives::{Address, U256};

use super::{CurrencyKey, RateAsset, currency_key_symbol};

/// Event emitted by a price feed registry mutation.
///
/// Mutating calls return their events in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    SynthAdded {
        synth: Address,
        currency_key: CurrencyKey,
    },
    SynthCurrencyKeyUpdated {
        synth: Address,
        prev_currency_key: CurrencyKey,
        next_currency_key: CurrencyKey,
    },
    DerivativeAdded {
        derivative: Address,
        price_feed: &'static str,
    },
    DerivativeUpdated {
        derivative: Address,
        prev_price_feed: &'static str,
        next_price_feed: &'static str,
    },
    DerivativeRemoved {
        derivative: Address,
    },
    PrimitiveAdded {
        primitive: Address,
        aggregator: Address,
        rate_asset: RateAsset,
        unit: U256,
    },
    PrimitiveUpdated {
        primitive: Address,
        prev_aggregator: Address,
        next_aggregator: Address,
    },
    PrimitiveRemoved {
        primitive: Address,
    },
    StaleRateThresholdSet {
        prev_stale_rate_threshold: u64,
        next_stale_rate_threshold: u64,
    },
    EthUsdAggregatorSet {
        prev_eth_usd_aggregator: Address,
        next_eth_usd_aggregator: Address,
    },
}

impl Display for FeedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedEvent::SynthAdded { synth, currency_key } => {
                write!(f, "SynthAdded {synth} {}", currency_key_symbol(currency_key))
            }
            FeedEvent::SynthCurrencyKeyUpdated { synth, prev_currency_key, next_currency_key } => {
                write!(
                    f,
                    "SynthCurrencyKeyUpdated {synth} {} -> {}",
                    currency_key_symbol(prev_currency_key),
                    currency_key_symbol(next_currency_key)
                )
            }
            FeedEvent::DerivativeAdded { derivative, price_feed } => {
                write!(f, "DerivativeAdded {derivative} via {price_feed}")
            }
            FeedEvent::DerivativeUpdated { derivative, prev_price_feed, next_price_feed } => {
                write!(f, "DerivativeUpdated {derivative} {prev_price_feed} -> {next_price_feed}")
            }
            FeedEvent::DerivativeRemoved { derivative } => write!(f, "DerivativeRemoved {derivative}"),
            FeedEvent::PrimitiveAdded { primitive, aggregator, rate_asset, unit } => {
                write!(f, "PrimitiveAdded {primitive} via {aggregator} ({rate_asset}, unit {unit})")
            }
            FeedEvent::PrimitiveUpdated { primitive, prev_aggregator, next_aggregator } => {
                write!(f, "PrimitiveUpdated {primitive} {prev_aggregator} -> {next_aggregator}")
            }
            FeedEvent::PrimitiveRemoved { primitive } => write!(f, "PrimitiveRemoved {primitive}"),
            FeedEvent::StaleRateThresholdSet {
                prev_stale_rate_threshold,
                next_stale_rate_threshold,
            } => write!(
                f,
                "StaleRateThresholdSet {prev_stale_rate_threshold}s -> {next_stale_rate_threshold}s"
            ),
            FeedEvent::EthUsdAggregatorSet { prev_eth_usd_aggregator, next_eth_usd_aggregator } => {
                write!(f, "EthUsdAggregatorSet {prev_eth_usd_aggregator} -> {next_eth_usd_aggregator}")
            }
        }
    }
}
