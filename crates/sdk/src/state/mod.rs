//! Chain state the price feeds read.
//!
//! Price feeds never query the chain directly, they read through
//! [`ChainState`] so that a valuation is a pure function of its inputs and
//! the state it is given.

mod builder;
mod snapshot;

use alloy::primitives::Address;
pub use builder::SnapshotBuilder;
pub use snapshot::Snapshot;

use crate::types::{CurrencyKey, ExchangeRate, RoundData, StateInstant};

/// Read-only view of chain state at a single instant.
pub trait ChainState: Send + Sync {
    /// Instant the state is consistent with.
    fn instant(&self) -> StateInstant;

    /// Decimals of an ERC20 token, `None` if unknown.
    fn decimals(&self, asset: Address) -> Option<u8>;

    /// Currency key Synthetix currently assigns to a Synth.
    fn synth_currency_key(&self, synth: Address) -> Option<CurrencyKey>;

    /// Synthetix exchange rate of a currency key.
    fn exchange_rate(&self, currency_key: CurrencyKey) -> Option<ExchangeRate>;

    /// Latest round of a Chainlink aggregator.
    fn latest_round(&self, aggregator: Address) -> Option<RoundData>;
}
