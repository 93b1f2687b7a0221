use std::sync::Arc;

use alloy::primitives::{Address, U256, address};
use fund_value_sdk::{
    Deployment,
    access::FundDeployerOwner,
    error::PriceFeedError,
    feeds::{DerivativePriceFeed, SynthetixPriceFeed},
    num::ETH_UNIT,
    testing::{self, SBTC, SETH, SUSD, USDC},
    types::{ExchangeRate, FeedEvent, UnderlyingValues, currency_key},
};

const SLINK: Address = address!("0xbBC455cb4F1B9e4bFC4B73970d360c8f032EfEE6");

fn owner() -> Address { Deployment::mainnet().fund_deployer_owner() }

fn synthetix_price_feed() -> SynthetixPriceFeed {
    SynthetixPriceFeed::new(Arc::new(FundDeployerOwner::new(owner())), SUSD)
}

#[test]
fn test_add_synths_emits_events_in_order() {
    let state = testing::mainnet_snapshot();
    let feed = synthetix_price_feed();

    let events = feed.add_synths(owner(), &state, &[SBTC, SETH]).unwrap();
    assert_eq!(
        events,
        vec![
            FeedEvent::SynthAdded { synth: SBTC, currency_key: currency_key("sBTC").unwrap() },
            FeedEvent::SynthAdded { synth: SETH, currency_key: currency_key("sETH").unwrap() },
        ]
    );
    assert_eq!(
        feed.get_currency_keys_for_synths(&[SETH, SLINK]),
        vec![Some(currency_key("sETH").unwrap()), None]
    );

    assert!(matches!(
        feed.add_synths(owner(), &state, &[SBTC]),
        Err(PriceFeedError::AlreadyRegistered(a)) if a == SBTC
    ));
    assert!(matches!(
        feed.update_synth_currency_keys(&state, &[SBTC]),
        Err(PriceFeedError::NoChange(a)) if a == SBTC
    ));
}

#[test]
fn test_add_synths_validation() {
    let state = testing::mainnet_snapshot();
    let feed = synthetix_price_feed();

    assert!(matches!(feed.add_synths(Address::ZERO, &state, &[SBTC]), Err(PriceFeedError::Unauthorized(_))));
    assert!(matches!(feed.add_synths(owner(), &state, &[]), Err(PriceFeedError::EmptyInput)));
    // sLINK has no currency key in the fixture, the whole batch is rejected
    assert!(matches!(
        feed.add_synths(owner(), &state, &[SBTC, SLINK]),
        Err(PriceFeedError::MissingCurrencyKey(a)) if a == SLINK
    ));
    assert!(!feed.is_supported_asset(SBTC));
}

#[test]
fn test_update_synth_currency_keys() {
    let state = testing::mainnet_snapshot();
    let feed = synthetix_price_feed();
    feed.add_synths(owner(), &state, &[SBTC, SETH]).unwrap();

    let migrated = state.clone().with_currency_key(SETH, currency_key("sETH2").unwrap());
    assert!(matches!(
        feed.update_synth_currency_keys(&migrated, &[SBTC, SETH]),
        Err(PriceFeedError::NoChange(a)) if a == SBTC
    ));
    // Anyone may sync the keys
    let events = feed.update_synth_currency_keys(&migrated, &[SETH]).unwrap();
    assert_eq!(
        events,
        vec![FeedEvent::SynthCurrencyKeyUpdated {
            synth: SETH,
            prev_currency_key: currency_key("sETH").unwrap(),
            next_currency_key: currency_key("sETH2").unwrap(),
        }]
    );
    assert_eq!(feed.get_currency_key_for_synth(SETH), Some(currency_key("sETH2").unwrap()));
    assert!(matches!(
        feed.update_synth_currency_keys(&migrated, &[SLINK]),
        Err(PriceFeedError::NotRegistered(a)) if a == SLINK
    ));
}

#[test]
fn test_calc_underlying_values() {
    let state = testing::mainnet_snapshot();
    let feed = synthetix_price_feed();
    feed.add_synths(owner(), &state, &[SBTC]).unwrap();

    assert_eq!(
        feed.calc_underlying_values(&state, SBTC, ETH_UNIT).unwrap(),
        UnderlyingValues::single(SUSD, U256::from(testing::SBTC_RATE))
    );
    assert_eq!(feed.underlying_assets(SBTC), vec![SUSD]);

    let zero_rate = state.clone().with_exchange_rate(currency_key("sBTC").unwrap(), ExchangeRate::valid(U256::ZERO));
    assert!(matches!(
        feed.calc_underlying_values(&zero_rate, SBTC, ETH_UNIT),
        Err(PriceFeedError::InvalidRate(a)) if a == SBTC
    ));
    assert!(matches!(
        feed.calc_underlying_values(&state, SETH, ETH_UNIT),
        Err(PriceFeedError::UnsupportedAsset(a)) if a == SETH
    ));
}

/// Tests that a newly listed Synth becomes supported by the release at
/// once.
#[test]
fn test_list_synth_on_release() {
    let slink_key = currency_key("sLINK").unwrap();
    let state = testing::mainnet_snapshot()
        .with_decimals(SLINK, 18)
        .with_currency_key(SLINK, slink_key)
        .with_exchange_rate(slink_key, ExchangeRate::valid(U256::from(20) * ETH_UNIT));
    let (release, _) = testing::mainnet_release(&state).unwrap();
    let vi = release.value_interpreter();

    assert!(!vi.is_supported_asset(SLINK));
    assert!(matches!(
        vi.calc_canonical_asset_value(&state, SLINK, ETH_UNIT, USDC),
        Err(PriceFeedError::UnsupportedAsset(a)) if a == SLINK
    ));

    release.synthetix_price_feed().add_synths(owner(), &state, &[SLINK]).unwrap();
    let feed: Arc<dyn DerivativePriceFeed> = release.synthetix_price_feed().clone();
    let events = release.add_derivatives(owner(), &[SLINK], &[feed]).unwrap();
    assert_eq!(events, vec![FeedEvent::DerivativeAdded { derivative: SLINK, price_feed: "SynthetixPriceFeed" }]);

    assert!(vi.is_supported_derivative_asset(SLINK));
    // 20 sUSD at 0.0005 ETH, 2000 USD per ETH, 0.999925 USD per USDC
    assert_eq!(vi.calc_canonical_asset_value(&state, SLINK, ETH_UNIT, USDC).unwrap(), U256::from(20_001_500u64));
}
