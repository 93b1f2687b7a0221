use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use itertools::Itertools;
use tracing::debug;

use super::{DerivativePriceFeed, PrimitivePriceFeed};
use crate::{
    access::Authority,
    error::PriceFeedError,
    state::ChainState,
    types::{FeedEvent, UnderlyingValues},
};

/// Maximum number of derivative layers an asset may resolve through.
pub const MAX_RESOLUTION_DEPTH: usize = 8;

type FeedRef = Arc<dyn DerivativePriceFeed>;

/// Registry dispatching each derivative to the feed responsible for it.
///
/// Registrations never create a derivative resolving through itself or
/// through more than [`MAX_RESOLUTION_DEPTH`] derivative layers, and never
/// register an asset the primitive price feed already prices.
#[derive(derive_more::Debug)]
pub struct AggregatedDerivativePriceFeed {
    authority: Arc<dyn Authority>,
    primitive_price_feed: Arc<dyn PrimitivePriceFeed>,
    #[debug("{} derivatives", derivative_to_price_feed.len())]
    derivative_to_price_feed: DashMap<Address, FeedRef>,
}

impl AggregatedDerivativePriceFeed {
    pub fn new(authority: Arc<dyn Authority>, primitive_price_feed: Arc<dyn PrimitivePriceFeed>) -> Self {
        Self { authority, primitive_price_feed, derivative_to_price_feed: DashMap::new() }
    }

    /// Primitive feed derivatives are kept disjoint from.
    pub fn primitive_price_feed(&self) -> &Arc<dyn PrimitivePriceFeed> { &self.primitive_price_feed }

    pub fn get_price_feed_for_derivative(&self, derivative: Address) -> Option<FeedRef> {
        self.derivative_to_price_feed.get(&derivative).map(|feed| feed.clone())
    }

    /// Registered derivatives, in no particular order.
    pub fn derivatives(&self) -> Vec<Address> {
        self.derivative_to_price_feed.iter().map(|entry| *entry.key()).collect()
    }

    /// Emits [`FeedEvent::DerivativeAdded`] per derivative in input order.
    pub fn add_derivatives(
        &self,
        caller: Address,
        derivatives: &[Address],
        price_feeds: &[FeedRef],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.validate_batch(caller, derivatives, price_feeds)?;
        if let Some(derivative) = derivatives
            .iter()
            .duplicates()
            .chain(derivatives.iter().filter(|d| {
                self.is_supported_asset(**d) || self.primitive_price_feed.is_supported_asset(**d)
            }))
            .next()
        {
            return Err(PriceFeedError::AlreadyRegistered(*derivative));
        }
        self.validate_resolution(derivatives, price_feeds)?;

        Ok(derivatives
            .iter()
            .zip(price_feeds)
            .map(|(&derivative, price_feed)| {
                self.derivative_to_price_feed.insert(derivative, price_feed.clone());
                debug!(%derivative, price_feed = price_feed.name(), "derivative added");
                FeedEvent::DerivativeAdded { derivative, price_feed: price_feed.name() }
            })
            .collect())
    }

    /// Replaces the feeds of registered derivatives.
    ///
    /// Emits [`FeedEvent::DerivativeUpdated`] per derivative in input order.
    pub fn update_derivatives(
        &self,
        caller: Address,
        derivatives: &[Address],
        price_feeds: &[FeedRef],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.validate_batch(caller, derivatives, price_feeds)?;
        if let Some(derivative) = derivatives.iter().duplicates().next() {
            return Err(PriceFeedError::InvalidArgument(format!("duplicate derivative: {derivative}")));
        }
        let prev_price_feeds = derivatives
            .iter()
            .map(|&d| self.get_price_feed_for_derivative(d).ok_or(PriceFeedError::NotRegistered(d)))
            .collect::<Result<Vec<_>, _>>()?;
        self.validate_resolution(derivatives, price_feeds)?;

        Ok(derivatives
            .iter()
            .zip(price_feeds)
            .zip(prev_price_feeds)
            .map(|((&derivative, next), prev)| {
                self.derivative_to_price_feed.insert(derivative, next.clone());
                debug!(%derivative, prev = prev.name(), next = next.name(), "derivative updated");
                FeedEvent::DerivativeUpdated {
                    derivative,
                    prev_price_feed: prev.name(),
                    next_price_feed: next.name(),
                }
            })
            .collect())
    }

    /// Emits [`FeedEvent::DerivativeRemoved`] per derivative in input order.
    pub fn remove_derivatives(
        &self,
        caller: Address,
        derivatives: &[Address],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if derivatives.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if let Some(derivative) = derivatives
            .iter()
            .duplicates()
            .chain(derivatives.iter().filter(|d| !self.is_supported_asset(**d)))
            .next()
        {
            return Err(PriceFeedError::NotRegistered(*derivative));
        }

        Ok(derivatives
            .iter()
            .map(|&derivative| {
                self.derivative_to_price_feed.remove(&derivative);
                debug!(%derivative, "derivative removed");
                FeedEvent::DerivativeRemoved { derivative }
            })
            .collect())
    }

    /// Underlying values of `derivative` as reported by its feed,
    /// unchanged.
    pub fn calc_underlying_values(
        &self,
        state: &dyn ChainState,
        derivative: Address,
        amount: U256,
    ) -> Result<UnderlyingValues, PriceFeedError> {
        self.get_price_feed_for_derivative(derivative)
            .ok_or(PriceFeedError::UnsupportedAsset(derivative))?
            .calc_underlying_values(state, derivative, amount)
    }

    pub fn is_supported_asset(&self, asset: Address) -> bool {
        self.derivative_to_price_feed.contains_key(&asset)
    }

    fn validate_batch(
        &self,
        caller: Address,
        derivatives: &[Address],
        price_feeds: &[FeedRef],
    ) -> Result<(), PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if derivatives.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if derivatives.len() != price_feeds.len() {
            return Err(PriceFeedError::LengthMismatch);
        }
        for (derivative, price_feed) in derivatives.iter().zip(price_feeds) {
            if !price_feed.is_supported_asset(*derivative) {
                return Err(PriceFeedError::UnsupportedAsset(*derivative));
            }
        }
        Ok(())
    }

    /// Checks every derivative resolves to non-derivatives within the depth
    /// bound, as if `derivatives` were registered with `price_feeds`.
    ///
    /// Walks the resolution tree of every registered derivative without
    /// memoization, so shared subtrees are revisited once per derivative
    /// reaching them on every add or update.
    fn validate_resolution(
        &self,
        derivatives: &[Address],
        price_feeds: &[FeedRef],
    ) -> Result<(), PriceFeedError> {
        let pending: HashMap<Address, FeedRef> =
            derivatives.iter().copied().zip(price_feeds.iter().cloned()).collect();
        let mut path = Vec::with_capacity(MAX_RESOLUTION_DEPTH);
        for derivative in self.derivatives().into_iter().chain(derivatives.iter().copied()) {
            self.visit(&pending, derivative, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        pending: &HashMap<Address, FeedRef>,
        asset: Address,
        path: &mut Vec<Address>,
    ) -> Result<(), PriceFeedError> {
        let Some(feed) = pending
            .get(&asset)
            .cloned()
            .or_else(|| self.get_price_feed_for_derivative(asset))
        else {
            return Ok(());
        };
        if path.contains(&asset) {
            return Err(PriceFeedError::ResolutionCycle(asset));
        }
        if path.len() == MAX_RESOLUTION_DEPTH {
            return Err(PriceFeedError::DepthExceeded(MAX_RESOLUTION_DEPTH));
        }
        path.push(asset);
        for underlying in feed.underlying_assets(asset) {
            self.visit(pending, underlying, path)?;
        }
        path.pop();
        Ok(())
    }
}
