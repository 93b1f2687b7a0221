//! Price feeds.
//!
//! Primitive feeds quote base assets directly through an oracle, derivative
//! feeds decompose a derivative into its underlying assets.

mod aggregated;
mod chainlink;
mod pegged;
mod synthetix;

pub use aggregated::{AggregatedDerivativePriceFeed, MAX_RESOLUTION_DEPTH};
use alloy::primitives::{Address, U256};
pub use chainlink::{ChainlinkPriceFeed, PrimitiveInfo};
pub use pegged::SinglePeggedDerivativePriceFeed;
pub use synthetix::SynthetixPriceFeed;

use crate::{error::PriceFeedError, state::ChainState, types::UnderlyingValues};

/// Adapter converting a derivative into its underlying assets.
pub trait DerivativePriceFeed: Send + Sync + std::fmt::Debug {
    /// Name of the feed, used in events and logs.
    fn name(&self) -> &'static str;

    /// Underlying assets and amounts `amount` of `derivative` is worth.
    fn calc_underlying_values(
        &self,
        state: &dyn ChainState,
        derivative: Address,
        amount: U256,
    ) -> Result<UnderlyingValues, PriceFeedError>;

    fn is_supported_asset(&self, asset: Address) -> bool;

    /// Underlying assets `derivative` resolves into, independent of the
    /// amount and rates.
    fn underlying_assets(&self, derivative: Address) -> Vec<Address>;
}

/// Oracle quoting primitives against each other.
pub trait PrimitivePriceFeed: Send + Sync + std::fmt::Debug {
    /// Value of `amount` of `base` in `quote`, scaled to `quote` decimals.
    fn calc_canonical_value(
        &self,
        state: &dyn ChainState,
        base: Address,
        amount: U256,
        quote: Address,
    ) -> Result<U256, PriceFeedError>;

    fn is_supported_asset(&self, asset: Address) -> bool;
}
