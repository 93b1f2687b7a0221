use std::sync::{
    Arc, OnceLock, PoisonError, RwLock, Weak,
    atomic::{AtomicU64, Ordering},
};

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use itertools::Itertools;
use tracing::{debug, warn};

use super::{AggregatedDerivativePriceFeed, PrimitivePriceFeed};
use crate::{
    access::Authority,
    error::PriceFeedError,
    num::{self, ETH_UNIT},
    state::ChainState,
    types::{FeedEvent, RateAsset},
};

/// Registration of a primitive priced through a Chainlink aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimitiveInfo {
    pub aggregator: Address,
    pub rate_asset: RateAsset,
    /// `10^decimals` of the primitive.
    pub unit: U256,
}

/// Prices primitives through Chainlink aggregators.
///
/// Each primitive is quoted either in ETH (18 decimals) or in USD
/// (8 decimals); conversions across rate assets go through the ETH/USD
/// aggregator. WETH is always supported at a rate of exactly 1 ETH.
///
/// A rate is valid if the aggregator's latest answer is positive and not
/// older than the stale rate threshold.
#[derive(Debug)]
pub struct ChainlinkPriceFeed {
    authority: Arc<dyn Authority>,
    weth: Address,
    eth_usd_aggregator: RwLock<Address>,
    stale_rate_threshold: AtomicU64,
    primitives: DashMap<Address, PrimitiveInfo>,
    derivative_registry: OnceLock<Weak<AggregatedDerivativePriceFeed>>,
}

impl ChainlinkPriceFeed {
    pub fn new(
        authority: Arc<dyn Authority>,
        state: &dyn ChainState,
        weth: Address,
        eth_usd_aggregator: Address,
        stale_rate_threshold: u64,
    ) -> Result<Self, PriceFeedError> {
        validate_aggregator(state, eth_usd_aggregator, weth)?;
        Ok(Self {
            authority,
            weth,
            eth_usd_aggregator: RwLock::new(eth_usd_aggregator),
            stale_rate_threshold: AtomicU64::new(stale_rate_threshold),
            primitives: DashMap::new(),
            derivative_registry: OnceLock::new(),
        })
    }

    /// Links the registry of derivatives that primitives must stay disjoint
    /// from. Can be bound once.
    pub fn bind_derivative_registry(
        &self,
        registry: &Arc<AggregatedDerivativePriceFeed>,
    ) -> Result<(), PriceFeedError> {
        self.derivative_registry
            .set(Arc::downgrade(registry))
            .map_err(|_| PriceFeedError::InvalidArgument("derivative registry already bound".to_string()))
    }

    fn is_registered_derivative(&self, asset: Address) -> bool {
        self.derivative_registry
            .get()
            .and_then(Weak::upgrade)
            .is_some_and(|registry| registry.is_supported_asset(asset))
    }

    pub fn weth(&self) -> Address { self.weth }

    pub fn eth_usd_aggregator(&self) -> Address {
        *self.eth_usd_aggregator.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum age of a round, in seconds.
    pub fn stale_rate_threshold(&self) -> u64 { self.stale_rate_threshold.load(Ordering::Acquire) }

    pub fn get_primitive_info(&self, primitive: Address) -> Option<PrimitiveInfo> {
        self.primitives.get(&primitive).map(|info| *info)
    }

    /// Registered primitives, WETH excluded, in no particular order.
    pub fn primitives(&self) -> Vec<Address> {
        self.primitives.iter().map(|entry| *entry.key()).collect()
    }

    /// Registers primitives with their aggregators.
    ///
    /// Units are derived from the token decimals, aggregators must report
    /// a positive answer. Emits [`FeedEvent::PrimitiveAdded`] per primitive
    /// in input order.
    pub fn add_primitives(
        &self,
        caller: Address,
        state: &dyn ChainState,
        primitives: &[Address],
        aggregators: &[Address],
        rate_assets: &[RateAsset],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if primitives.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if primitives.len() != aggregators.len() || primitives.len() != rate_assets.len() {
            return Err(PriceFeedError::LengthMismatch);
        }
        if let Some(primitive) = primitives.iter().duplicates().next() {
            return Err(PriceFeedError::AlreadyRegistered(*primitive));
        }

        let additions = primitives
            .iter()
            .zip(aggregators)
            .zip(rate_assets)
            .map(|((&primitive, &aggregator), &rate_asset)| {
                if self.is_supported_asset(primitive) || self.is_registered_derivative(primitive) {
                    return Err(PriceFeedError::AlreadyRegistered(primitive));
                }
                let decimals =
                    state.decimals(primitive).ok_or(PriceFeedError::UnknownDecimals(primitive))?;
                let unit = num::Converter::new(decimals)?.unit();
                validate_aggregator(state, aggregator, primitive)?;
                Ok((primitive, PrimitiveInfo { aggregator, rate_asset, unit }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(additions
            .into_iter()
            .map(|(primitive, info)| {
                self.primitives.insert(primitive, info);
                debug!(%primitive, aggregator = %info.aggregator, rate_asset = %info.rate_asset, "primitive added");
                FeedEvent::PrimitiveAdded {
                    primitive,
                    aggregator: info.aggregator,
                    rate_asset: info.rate_asset,
                    unit: info.unit,
                }
            })
            .collect())
    }

    /// Points registered primitives to new aggregators, keeping their rate
    /// assets. Emits [`FeedEvent::PrimitiveUpdated`] per primitive.
    pub fn update_primitives(
        &self,
        caller: Address,
        state: &dyn ChainState,
        primitives: &[Address],
        aggregators: &[Address],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if primitives.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if primitives.len() != aggregators.len() {
            return Err(PriceFeedError::LengthMismatch);
        }
        if let Some(primitive) = primitives.iter().duplicates().next() {
            return Err(PriceFeedError::NoChange(*primitive));
        }

        let updates = primitives
            .iter()
            .zip(aggregators)
            .map(|(&primitive, &aggregator)| {
                let info = self
                    .get_primitive_info(primitive)
                    .ok_or(PriceFeedError::NotRegistered(primitive))?;
                if info.aggregator == aggregator {
                    return Err(PriceFeedError::NoChange(primitive));
                }
                validate_aggregator(state, aggregator, primitive)?;
                Ok((primitive, info, aggregator))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(updates
            .into_iter()
            .map(|(primitive, info, next_aggregator)| {
                self.primitives.insert(primitive, PrimitiveInfo { aggregator: next_aggregator, ..info });
                debug!(%primitive, prev = %info.aggregator, next = %next_aggregator, "primitive updated");
                FeedEvent::PrimitiveUpdated {
                    primitive,
                    prev_aggregator: info.aggregator,
                    next_aggregator,
                }
            })
            .collect())
    }

    /// Emits [`FeedEvent::PrimitiveRemoved`] per primitive.
    pub fn remove_primitives(
        &self,
        caller: Address,
        primitives: &[Address],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if primitives.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if let Some(primitive) = primitives
            .iter()
            .duplicates()
            .chain(primitives.iter().filter(|p| !self.primitives.contains_key(*p)))
            .next()
        {
            return Err(PriceFeedError::NotRegistered(*primitive));
        }

        Ok(primitives
            .iter()
            .map(|&primitive| {
                self.primitives.remove(&primitive);
                debug!(%primitive, "primitive removed");
                FeedEvent::PrimitiveRemoved { primitive }
            })
            .collect())
    }

    pub fn set_stale_rate_threshold(
        &self,
        caller: Address,
        next_stale_rate_threshold: u64,
    ) -> Result<FeedEvent, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        let prev_stale_rate_threshold =
            self.stale_rate_threshold.swap(next_stale_rate_threshold, Ordering::AcqRel);
        if prev_stale_rate_threshold == next_stale_rate_threshold {
            return Err(PriceFeedError::InvalidArgument(format!(
                "stale rate threshold already set to {next_stale_rate_threshold}"
            )));
        }
        debug!(prev = prev_stale_rate_threshold, next = next_stale_rate_threshold, "stale rate threshold set");
        Ok(FeedEvent::StaleRateThresholdSet { prev_stale_rate_threshold, next_stale_rate_threshold })
    }

    pub fn set_eth_usd_aggregator(
        &self,
        caller: Address,
        state: &dyn ChainState,
        next_eth_usd_aggregator: Address,
    ) -> Result<FeedEvent, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        let mut eth_usd_aggregator =
            self.eth_usd_aggregator.write().unwrap_or_else(PoisonError::into_inner);
        if *eth_usd_aggregator == next_eth_usd_aggregator {
            return Err(PriceFeedError::NoChange(next_eth_usd_aggregator));
        }
        validate_aggregator(state, next_eth_usd_aggregator, self.weth)?;
        let prev_eth_usd_aggregator = std::mem::replace(&mut *eth_usd_aggregator, next_eth_usd_aggregator);
        debug!(prev = %prev_eth_usd_aggregator, next = %next_eth_usd_aggregator, "ETH/USD aggregator set");
        Ok(FeedEvent::EthUsdAggregatorSet { prev_eth_usd_aggregator, next_eth_usd_aggregator })
    }

    /// Rate, rate asset and unit of a supported primitive.
    fn rate_info(
        &self,
        state: &dyn ChainState,
        primitive: Address,
    ) -> Result<(U256, RateAsset, U256), PriceFeedError> {
        if primitive == self.weth {
            return Ok((ETH_UNIT, RateAsset::Eth, ETH_UNIT));
        }
        let info = self
            .get_primitive_info(primitive)
            .ok_or(PriceFeedError::UnsupportedAsset(primitive))?;
        let rate = self.validated_rate(state, info.aggregator, primitive)?;
        Ok((rate, info.rate_asset, info.unit))
    }

    /// Latest answer of `aggregator`, failing with
    /// [`PriceFeedError::InvalidRate`] of `asset` if missing, non-positive
    /// or stale.
    fn validated_rate(
        &self,
        state: &dyn ChainState,
        aggregator: Address,
        asset: Address,
    ) -> Result<U256, PriceFeedError> {
        let round = state.latest_round(aggregator).ok_or(PriceFeedError::InvalidRate(asset))?;
        let rate = round.rate().ok_or(PriceFeedError::InvalidRate(asset))?;
        let age = state.instant().block_timestamp().saturating_sub(round.updated_at());
        if age > self.stale_rate_threshold() {
            warn!(%asset, %aggregator, age, "stale rate");
            return Err(PriceFeedError::InvalidRate(asset));
        }
        Ok(rate)
    }
}

impl PrimitivePriceFeed for ChainlinkPriceFeed {
    fn calc_canonical_value(
        &self,
        state: &dyn ChainState,
        base: Address,
        amount: U256,
        quote: Address,
    ) -> Result<U256, PriceFeedError> {
        let (base_rate, base_rate_asset, base_unit) = self.rate_info(state, base)?;
        let (quote_rate, quote_rate_asset, quote_unit) = self.rate_info(state, quote)?;

        match (base_rate_asset, quote_rate_asset) {
            (RateAsset::Eth, RateAsset::Usd) => {
                let eth_usd_rate = self.validated_rate(state, self.eth_usd_aggregator(), base)?;
                num::mul_div(
                    &[amount, base_rate, eth_usd_rate, quote_unit],
                    &[base_unit, quote_rate, ETH_UNIT],
                )
            }
            (RateAsset::Usd, RateAsset::Eth) => {
                let eth_usd_rate = self.validated_rate(state, self.eth_usd_aggregator(), base)?;
                num::mul_div(
                    &[amount, base_rate, ETH_UNIT, quote_unit],
                    &[base_unit, quote_rate, eth_usd_rate],
                )
            }
            _ => num::mul_div(&[amount, base_rate, quote_unit], &[base_unit, quote_rate]),
        }
    }

    fn is_supported_asset(&self, asset: Address) -> bool {
        asset == self.weth || self.primitives.contains_key(&asset)
    }
}

/// Aggregator must currently report a positive answer.
fn validate_aggregator(
    state: &dyn ChainState,
    aggregator: Address,
    asset: Address,
) -> Result<(), PriceFeedError> {
    state
        .latest_round(aggregator)
        .and_then(|round| round.rate())
        .map(|_| ())
        .ok_or(PriceFeedError::InvalidRate(asset))
}
