use std::fmt::Display;

use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

/// Asset a Chainlink aggregator quotes its rate in.
///
/// ETH rates carry 18 decimals, USD rates 8 decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateAsset {
    Eth,
    Usd,
}

impl Display for RateAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateAsset::Eth => write!(f, "ETH"),
            RateAsset::Usd => write!(f, "USD"),
        }
    }
}

/// Synthetix exchange rate of a currency key, 18 decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeRate {
    rate: U256,
    valid: bool,
}

impl ExchangeRate {
    pub fn new(rate: U256, valid: bool) -> Self { Self { rate, valid } }

    pub fn valid(rate: U256) -> Self { Self { rate, valid: true } }

    pub fn invalid(rate: U256) -> Self { Self { rate, valid: false } }

    pub fn rate(&self) -> U256 { self.rate }

    /// Whether the source considers the rate fresh and usable.
    ///
    /// A zero rate is never valid.
    pub fn is_valid(&self) -> bool { self.valid && !self.rate.is_zero() }
}

/// Latest round reported by a Chainlink aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundData {
    answer: I256,
    updated_at: u64,
}

impl RoundData {
    pub fn new(answer: I256, updated_at: u64) -> Self { Self { answer, updated_at } }

    /// Round as reported by an aggregator, `None` if the update time does
    /// not fit a timestamp.
    pub fn from_aggregator(answer: I256, updated_at: U256) -> Option<Self> {
        u64::try_from(updated_at).ok().map(|updated_at| Self::new(answer, updated_at))
    }

    /// Round with a non-negative answer.
    pub fn from_unsigned(answer: U256, updated_at: u64) -> Self {
        Self { answer: I256::from_raw(answer), updated_at }
    }

    pub fn answer(&self) -> I256 { self.answer }

    /// Unix timestamp (in seconds) of the round.
    pub fn updated_at(&self) -> u64 { self.updated_at }

    /// Answer as a rate, `None` unless strictly positive.
    pub fn rate(&self) -> Option<U256> {
        self.answer.is_positive().then(|| self.answer.into_raw())
    }
}
