//! Canonical asset valuation.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::trace;

use crate::{
    error::PriceFeedError,
    feeds::{AggregatedDerivativePriceFeed, MAX_RESOLUTION_DEPTH, PrimitivePriceFeed},
    state::ChainState,
};

/// Resolves the value of any supported asset in any supported primitive,
/// recursing through derivative layers down to primitives.
///
/// Values are a pure function of the registries and the given
/// [`ChainState`], nothing is cached across calls. Any unsupported asset
/// or invalid rate on the way fails the whole valuation.
#[derive(Clone, Debug)]
pub struct ValueInterpreter {
    primitive_price_feed: Arc<dyn PrimitivePriceFeed>,
    aggregated_derivative_price_feed: Arc<AggregatedDerivativePriceFeed>,
}

impl ValueInterpreter {
    /// Primitives are priced by the feed the derivative registry is kept
    /// disjoint from.
    pub fn new(aggregated_derivative_price_feed: Arc<AggregatedDerivativePriceFeed>) -> Self {
        let primitive_price_feed = aggregated_derivative_price_feed.primitive_price_feed().clone();
        Self { primitive_price_feed, aggregated_derivative_price_feed }
    }

    pub fn primitive_price_feed(&self) -> &Arc<dyn PrimitivePriceFeed> { &self.primitive_price_feed }

    pub fn aggregated_derivative_price_feed(&self) -> &Arc<AggregatedDerivativePriceFeed> {
        &self.aggregated_derivative_price_feed
    }

    /// Value of `amount` of `asset` in `quote`, scaled to `quote` decimals.
    ///
    /// `quote` must be a supported primitive, unless it is `asset` itself.
    pub fn calc_canonical_asset_value(
        &self,
        state: &dyn ChainState,
        asset: Address,
        amount: U256,
        quote: Address,
    ) -> Result<U256, PriceFeedError> {
        if asset == quote {
            return Ok(amount);
        }
        if !self.is_supported_primitive_asset(quote) {
            return Err(PriceFeedError::UnsupportedAsset(quote));
        }
        self.calc_asset_value(state, asset, amount, quote, 0)
    }

    /// Total value of `assets` in `quote`, e.g. gross asset value of fund
    /// holdings.
    pub fn calc_canonical_assets_total_value(
        &self,
        state: &dyn ChainState,
        assets: &[Address],
        amounts: &[U256],
        quote: Address,
    ) -> Result<U256, PriceFeedError> {
        if assets.len() != amounts.len() {
            return Err(PriceFeedError::LengthMismatch);
        }
        assets.iter().zip(amounts).try_fold(U256::ZERO, |total, (&asset, &amount)| {
            let value = self.calc_canonical_asset_value(state, asset, amount, quote)?;
            total.checked_add(value).ok_or(PriceFeedError::Overflow)
        })
    }

    pub fn is_supported_asset(&self, asset: Address) -> bool {
        self.is_supported_primitive_asset(asset) || self.is_supported_derivative_asset(asset)
    }

    pub fn is_supported_primitive_asset(&self, asset: Address) -> bool {
        self.primitive_price_feed.is_supported_asset(asset)
    }

    pub fn is_supported_derivative_asset(&self, asset: Address) -> bool {
        self.aggregated_derivative_price_feed.is_supported_asset(asset)
    }

    fn calc_asset_value(
        &self,
        state: &dyn ChainState,
        asset: Address,
        amount: U256,
        quote: Address,
        depth: usize,
    ) -> Result<U256, PriceFeedError> {
        if asset == quote {
            return Ok(amount);
        }

        if self.is_supported_derivative_asset(asset) {
            if depth == MAX_RESOLUTION_DEPTH {
                return Err(PriceFeedError::DepthExceeded(MAX_RESOLUTION_DEPTH));
            }
            let underlying_values =
                self.aggregated_derivative_price_feed.calc_underlying_values(state, asset, amount)?;
            trace!(%asset, %amount, depth, underlyings = underlying_values.len(), "resolved derivative");
            return underlying_values.iter().try_fold(U256::ZERO, |total, (underlying, underlying_amount)| {
                let value = self.calc_asset_value(state, underlying, underlying_amount, quote, depth + 1)?;
                total.checked_add(value).ok_or(PriceFeedError::Overflow)
            });
        }

        if self.is_supported_primitive_asset(asset) {
            let value = self.primitive_price_feed.calc_canonical_value(state, asset, amount, quote)?;
            trace!(%asset, %amount, %quote, %value, "priced primitive");
            return Ok(value);
        }

        Err(PriceFeedError::UnsupportedAsset(asset))
    }
}
