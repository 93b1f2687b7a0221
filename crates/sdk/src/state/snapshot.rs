use std::collections::HashMap;

use alloy::primitives::Address;

use super::ChainState;
use crate::types::{CurrencyKey, ExchangeRate, RoundData, StateInstant};

/// In-memory chain state snapshot.
///
/// [`super::SnapshotBuilder`] captures the snapshot from a node at
/// specified/latest block, tests assemble it by hand.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    instant: StateInstant,
    decimals: HashMap<Address, u8>,
    currency_keys: HashMap<Address, CurrencyKey>,
    exchange_rates: HashMap<CurrencyKey, ExchangeRate>,
    rounds: HashMap<Address, RoundData>,
}

impl Snapshot {
    pub fn new(instant: StateInstant) -> Self { Self { instant, ..Default::default() } }

    pub fn with_instant(mut self, instant: StateInstant) -> Self {
        self.instant = instant;
        self
    }

    pub fn with_decimals(mut self, asset: Address, decimals: u8) -> Self {
        self.decimals.insert(asset, decimals);
        self
    }

    pub fn with_currency_key(mut self, synth: Address, currency_key: CurrencyKey) -> Self {
        self.currency_keys.insert(synth, currency_key);
        self
    }

    pub fn without_currency_key(mut self, synth: Address) -> Self {
        self.currency_keys.remove(&synth);
        self
    }

    pub fn with_exchange_rate(mut self, currency_key: CurrencyKey, rate: ExchangeRate) -> Self {
        self.exchange_rates.insert(currency_key, rate);
        self
    }

    pub fn with_round(mut self, aggregator: Address, round: RoundData) -> Self {
        self.rounds.insert(aggregator, round);
        self
    }

    /// Synths with known currency keys.
    pub fn currency_keys(&self) -> &HashMap<Address, CurrencyKey> { &self.currency_keys }

    /// Aggregators with known rounds.
    pub fn rounds(&self) -> &HashMap<Address, RoundData> { &self.rounds }
}

impl ChainState for Snapshot {
    fn instant(&self) -> StateInstant { self.instant }

    fn decimals(&self, asset: Address) -> Option<u8> { self.decimals.get(&asset).copied() }

    fn synth_currency_key(&self, synth: Address) -> Option<CurrencyKey> {
        self.currency_keys.get(&synth).copied().filter(|key| !key.is_zero())
    }

    fn exchange_rate(&self, currency_key: CurrencyKey) -> Option<ExchangeRate> {
        self.exchange_rates.get(&currency_key).copied()
    }

    fn latest_round(&self, aggregator: Address) -> Option<RoundData> {
        self.rounds.get(&aggregator).copied()
    }
}
