use std::sync::Arc;

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use itertools::Itertools;
use tracing::{debug, warn};

use super::DerivativePriceFeed;
use crate::{
    access::Authority,
    error::PriceFeedError,
    num::{self, ETH_UNIT},
    state::ChainState,
    types::{CurrencyKey, ExchangeRate, FeedEvent, UnderlyingValues, currency_key_symbol},
};

/// Prices Synths in sUSD through the Synthetix exchange rates.
///
/// Currency keys are cached per Synth at registration, as resolving them
/// is a call through the Synth proxy. Synthetix can repoint a key without
/// notice, hence [`Self::update_synth_currency_keys`] is open to anyone,
/// while [`Self::add_synths`] is reserved to the owner.
#[derive(derive_more::Debug)]
pub struct SynthetixPriceFeed {
    authority: Arc<dyn Authority>,
    susd: Address,
    #[debug("{} synths", synth_to_currency_key.len())]
    synth_to_currency_key: DashMap<Address, CurrencyKey>,
}

impl SynthetixPriceFeed {
    pub fn new(authority: Arc<dyn Authority>, susd: Address) -> Self {
        Self { authority, susd, synth_to_currency_key: DashMap::new() }
    }

    /// sUSD, the single underlying of every Synth.
    pub fn susd(&self) -> Address { self.susd }

    /// Registers Synths with their current currency keys.
    ///
    /// The batch is validated as a whole, nothing is registered on
    /// failure. Emits [`FeedEvent::SynthAdded`] per Synth in input order.
    pub fn add_synths(
        &self,
        caller: Address,
        state: &dyn ChainState,
        synths: &[Address],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.authority.ensure_owner(caller)?;
        if synths.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if let Some(synth) = synths.iter().duplicates().next() {
            return Err(PriceFeedError::AlreadyRegistered(*synth));
        }

        let currency_keys = synths
            .iter()
            .map(|&synth| {
                if self.is_supported_asset(synth) {
                    return Err(PriceFeedError::AlreadyRegistered(synth));
                }
                let key = state
                    .synth_currency_key(synth)
                    .ok_or(PriceFeedError::MissingCurrencyKey(synth))?;
                Ok((synth, key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(currency_keys
            .into_iter()
            .map(|(synth, currency_key)| {
                self.synth_to_currency_key.insert(synth, currency_key);
                debug!(%synth, currency_key = %currency_key_symbol(&currency_key), "synth added");
                FeedEvent::SynthAdded { synth, currency_key }
            })
            .collect())
    }

    /// Resyncs cached currency keys with Synthetix, callable by anyone.
    ///
    /// Every Synth must be registered and its key must have changed.
    /// Emits [`FeedEvent::SynthCurrencyKeyUpdated`] per Synth in input
    /// order.
    pub fn update_synth_currency_keys(
        &self,
        state: &dyn ChainState,
        synths: &[Address],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        if synths.is_empty() {
            return Err(PriceFeedError::EmptyInput);
        }
        if let Some(synth) = synths.iter().duplicates().next() {
            return Err(PriceFeedError::NoChange(*synth));
        }

        let updates = synths
            .iter()
            .map(|&synth| {
                let prev = self
                    .get_currency_key_for_synth(synth)
                    .ok_or(PriceFeedError::NotRegistered(synth))?;
                let next = state
                    .synth_currency_key(synth)
                    .ok_or(PriceFeedError::MissingCurrencyKey(synth))?;
                if prev == next {
                    return Err(PriceFeedError::NoChange(synth));
                }
                Ok((synth, prev, next))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(updates
            .into_iter()
            .map(|(synth, prev_currency_key, next_currency_key)| {
                self.synth_to_currency_key.insert(synth, next_currency_key);
                debug!(
                    %synth,
                    prev = %currency_key_symbol(&prev_currency_key),
                    next = %currency_key_symbol(&next_currency_key),
                    "synth currency key updated"
                );
                FeedEvent::SynthCurrencyKeyUpdated { synth, prev_currency_key, next_currency_key }
            })
            .collect())
    }

    pub fn get_currency_key_for_synth(&self, synth: Address) -> Option<CurrencyKey> {
        self.synth_to_currency_key.get(&synth).map(|key| *key)
    }

    /// Currency keys aligned to `synths`, `None` for unregistered ones.
    pub fn get_currency_keys_for_synths(&self, synths: &[Address]) -> Vec<Option<CurrencyKey>> {
        synths.iter().map(|synth| self.get_currency_key_for_synth(*synth)).collect()
    }

    /// Registered Synths, in no particular order.
    pub fn synths(&self) -> Vec<Address> {
        self.synth_to_currency_key.iter().map(|entry| *entry.key()).collect()
    }
}

impl DerivativePriceFeed for SynthetixPriceFeed {
    fn name(&self) -> &'static str { "SynthetixPriceFeed" }

    fn calc_underlying_values(
        &self,
        state: &dyn ChainState,
        derivative: Address,
        amount: U256,
    ) -> Result<UnderlyingValues, PriceFeedError> {
        let currency_key = self
            .get_currency_key_for_synth(derivative)
            .ok_or(PriceFeedError::UnsupportedAsset(derivative))?;
        let rate = state
            .exchange_rate(currency_key)
            .filter(ExchangeRate::is_valid)
            .ok_or_else(|| {
                warn!(synth = %derivative, currency_key = %currency_key_symbol(&currency_key), "invalid synth rate");
                PriceFeedError::InvalidRate(derivative)
            })?;

        let susd_amount = num::mul_div(&[amount, rate.rate()], &[ETH_UNIT])?;
        Ok(UnderlyingValues::single(self.susd, susd_amount))
    }

    fn is_supported_asset(&self, asset: Address) -> bool {
        self.synth_to_currency_key.contains_key(&asset)
    }

    fn underlying_assets(&self, derivative: Address) -> Vec<Address> {
        if self.is_supported_asset(derivative) { vec![self.susd] } else { vec![] }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        access::FundDeployerOwner,
        state::Snapshot,
        types::{StateInstant, currency_key},
    };

    const OWNER: Address = address!("0x00000000000000000000000000000000000000aa");
    const STRANGER: Address = address!("0x00000000000000000000000000000000000000bb");
    const SUSD: Address = address!("0x0000000000000000000000000000000000000010");
    const SBTC: Address = address!("0x0000000000000000000000000000000000000011");
    const SETH: Address = address!("0x0000000000000000000000000000000000000012");
    const DAI: Address = address!("0x0000000000000000000000000000000000000013");

    fn feed() -> SynthetixPriceFeed {
        SynthetixPriceFeed::new(Arc::new(FundDeployerOwner::new(OWNER)), SUSD)
    }

    fn snapshot() -> Snapshot {
        let sbtc = currency_key("sBTC").unwrap();
        let seth = currency_key("sETH").unwrap();
        Snapshot::new(StateInstant::new(1, 1_000))
            .with_currency_key(SBTC, sbtc)
            .with_currency_key(SETH, seth)
            .with_exchange_rate(sbtc, ExchangeRate::valid(U256::from(32_000) * ETH_UNIT))
            .with_exchange_rate(seth, ExchangeRate::valid(U256::from(1_900) * ETH_UNIT))
    }

    #[test]
    fn test_add_synths_not_owner() {
        let feed = feed();
        let err = feed.add_synths(STRANGER, &snapshot(), &[SBTC, SETH]).unwrap_err();
        assert!(matches!(err, PriceFeedError::Unauthorized(caller) if caller == STRANGER));
        assert!(!feed.is_supported_asset(SBTC));
    }

    #[test]
    fn test_add_synths_empty() {
        assert!(matches!(feed().add_synths(OWNER, &snapshot(), &[]), Err(PriceFeedError::EmptyInput)));
    }

    #[test]
    fn test_add_synths_events_in_order() {
        let feed = feed();
        let state = snapshot();
        assert!(!feed.is_supported_asset(SETH));
        assert!(!feed.is_supported_asset(SBTC));

        let events = feed.add_synths(OWNER, &state, &[SETH, SBTC]).unwrap();
        assert_eq!(
            events,
            vec![
                FeedEvent::SynthAdded { synth: SETH, currency_key: currency_key("sETH").unwrap() },
                FeedEvent::SynthAdded { synth: SBTC, currency_key: currency_key("sBTC").unwrap() },
            ]
        );
        assert!(feed.is_supported_asset(SETH));
        assert!(feed.is_supported_asset(SBTC));
        assert_eq!(
            feed.get_currency_keys_for_synths(&[SBTC, DAI, SETH]),
            vec![Some(currency_key("sBTC").unwrap()), None, Some(currency_key("sETH").unwrap())]
        );
    }

    #[test]
    fn test_add_synths_already_set() {
        let feed = feed();
        let state = snapshot();
        feed.add_synths(OWNER, &state, &[SBTC]).unwrap();
        assert!(matches!(
            feed.add_synths(OWNER, &state, &[SBTC]),
            Err(PriceFeedError::AlreadyRegistered(s)) if s == SBTC
        ));
        // Batch is atomic, sETH is not registered alongside the failing sBTC
        assert!(matches!(
            feed.add_synths(OWNER, &state, &[SETH, SBTC]),
            Err(PriceFeedError::AlreadyRegistered(s)) if s == SBTC
        ));
        assert!(!feed.is_supported_asset(SETH));
        assert!(matches!(
            feed.add_synths(OWNER, &state, &[SETH, SETH]),
            Err(PriceFeedError::AlreadyRegistered(s)) if s == SETH
        ));
    }

    #[test]
    fn test_add_synths_without_currency_key() {
        assert!(matches!(
            feed().add_synths(OWNER, &snapshot(), &[DAI]),
            Err(PriceFeedError::MissingCurrencyKey(a)) if a == DAI
        ));
    }

    #[test]
    fn test_update_synth_currency_keys() {
        let feed = feed();
        let state = snapshot();
        feed.add_synths(OWNER, &state, &[SBTC, SETH]).unwrap();

        assert!(matches!(feed.update_synth_currency_keys(&state, &[]), Err(PriceFeedError::EmptyInput)));
        assert!(matches!(
            feed.update_synth_currency_keys(&state, &[DAI]),
            Err(PriceFeedError::NotRegistered(a)) if a == DAI
        ));
        assert!(matches!(
            feed.update_synth_currency_keys(&state, &[SBTC]),
            Err(PriceFeedError::NoChange(a)) if a == SBTC
        ));

        let alt_sbtc = currency_key("sMOCK1-ALT").unwrap();
        let alt_seth = currency_key("sMOCK2-ALT").unwrap();
        let repointed = state.with_currency_key(SBTC, alt_sbtc).with_currency_key(SETH, alt_seth);
        let events = feed.update_synth_currency_keys(&repointed, &[SBTC, SETH]).unwrap();
        assert_eq!(
            events,
            vec![
                FeedEvent::SynthCurrencyKeyUpdated {
                    synth: SBTC,
                    prev_currency_key: currency_key("sBTC").unwrap(),
                    next_currency_key: alt_sbtc,
                },
                FeedEvent::SynthCurrencyKeyUpdated {
                    synth: SETH,
                    prev_currency_key: currency_key("sETH").unwrap(),
                    next_currency_key: alt_seth,
                },
            ]
        );
        assert_eq!(feed.get_currency_key_for_synth(SBTC), Some(alt_sbtc));
        assert!(feed.is_supported_asset(SBTC));
    }

    #[test]
    fn test_calc_underlying_values() {
        let feed = feed();
        let state = snapshot();
        feed.add_synths(OWNER, &state, &[SBTC]).unwrap();

        let values = feed.calc_underlying_values(&state, SBTC, ETH_UNIT).unwrap();
        assert_eq!(values.underlyings(), &[SUSD]);
        assert_eq!(values.amounts(), &[U256::from(32_000) * ETH_UNIT]);

        // Truncating division, 1 wei of sBTC is worth 32000 wei of sUSD
        let values = feed.calc_underlying_values(&state, SBTC, U256::from(1)).unwrap();
        assert_eq!(values.amounts(), &[U256::from(32_000)]);

        assert!(matches!(
            feed.calc_underlying_values(&state, SETH, ETH_UNIT),
            Err(PriceFeedError::UnsupportedAsset(a)) if a == SETH
        ));
    }

    #[test]
    fn test_calc_underlying_values_linear() {
        let feed = feed();
        let state = snapshot();
        feed.add_synths(OWNER, &state, &[SBTC]).unwrap();

        for amount in [U256::from(3), U256::from(123_456_789), ETH_UNIT * U256::from(7)] {
            let single = feed.calc_underlying_values(&state, SBTC, amount).unwrap();
            let double = feed.calc_underlying_values(&state, SBTC, amount * U256::from(2)).unwrap();
            assert_eq!(double.amounts()[0], single.amounts()[0] * U256::from(2));
        }
    }

    #[test]
    fn test_calc_underlying_values_invalid_rate() {
        let feed = feed();
        let state = snapshot();
        feed.add_synths(OWNER, &state, &[SBTC]).unwrap();

        let key = currency_key("sBTC").unwrap();
        for rate in [ExchangeRate::invalid(ETH_UNIT), ExchangeRate::valid(U256::ZERO)] {
            let state = snapshot().with_exchange_rate(key, rate);
            let err = feed.calc_underlying_values(&state, SBTC, ETH_UNIT).unwrap_err();
            assert!(matches!(err, PriceFeedError::InvalidRate(a) if a == SBTC));
            assert!(err.is_retryable());
        }
    }
}
