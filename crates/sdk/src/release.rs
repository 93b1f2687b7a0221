use std::sync::Arc;

use alloy::primitives::Address;
use tracing::info;

use crate::{
    Deployment,
    access::FundDeployerOwner,
    error::PriceFeedError,
    feeds::{
        AggregatedDerivativePriceFeed, ChainlinkPriceFeed, DerivativePriceFeed,
        SinglePeggedDerivativePriceFeed, SynthetixPriceFeed,
    },
    state::ChainState,
    types::{FeedEvent, RateAsset},
    value_interpreter::ValueInterpreter,
};

/// Set of price feeds wired together from a [`Deployment`].
///
/// Chainlink feed is the primitive price feed, Synthetix and pegged
/// derivative feeds are registered in the aggregated derivative price feed,
/// and [`ValueInterpreter`] resolves values across all of them.
#[derive(Clone, Debug)]
pub struct Release {
    deployment: Deployment,
    authority: Arc<FundDeployerOwner>,
    chainlink_price_feed: Arc<ChainlinkPriceFeed>,
    synthetix_price_feed: Arc<SynthetixPriceFeed>,
    aggregated_derivative_price_feed: Arc<AggregatedDerivativePriceFeed>,
    value_interpreter: ValueInterpreter,
}

impl Release {
    /// Deploys the feeds and registers every asset of the deployment, with
    /// the fund deployer owner as the caller.
    ///
    /// Returns the release with all the events emitted during registration.
    pub fn deploy(
        deployment: &Deployment,
        state: &dyn ChainState,
    ) -> Result<(Self, Vec<FeedEvent>), PriceFeedError> {
        let owner = deployment.fund_deployer_owner();
        let authority = Arc::new(FundDeployerOwner::new(owner));
        let chainlink_price_feed = Arc::new(ChainlinkPriceFeed::new(
            authority.clone(),
            state,
            deployment.weth(),
            deployment.eth_usd_aggregator(),
            deployment.stale_rate_threshold(),
        )?);
        let synthetix_price_feed =
            Arc::new(SynthetixPriceFeed::new(authority.clone(), deployment.synthetix().susd));
        let aggregated_derivative_price_feed = Arc::new(AggregatedDerivativePriceFeed::new(
            authority.clone(),
            chainlink_price_feed.clone(),
        ));
        chainlink_price_feed.bind_derivative_registry(&aggregated_derivative_price_feed)?;
        let value_interpreter = ValueInterpreter::new(aggregated_derivative_price_feed.clone());
        let release = Self {
            deployment: deployment.clone(),
            authority,
            chainlink_price_feed,
            synthetix_price_feed,
            aggregated_derivative_price_feed,
            value_interpreter,
        };

        let mut events = Vec::new();

        let primitives = deployment.primitives();
        if !primitives.is_empty() {
            let assets: Vec<_> = primitives.iter().map(|p| p.asset).collect();
            let aggregators: Vec<_> = primitives.iter().map(|p| p.aggregator).collect();
            let rate_assets: Vec<_> = primitives.iter().map(|p| p.rate_asset).collect();
            events.extend(release.add_primitives(owner, state, &assets, &aggregators, &rate_assets)?);
        }

        let synths = &deployment.synthetix().synths;
        if !synths.is_empty() {
            events.extend(release.synthetix_price_feed.add_synths(owner, state, synths)?);
        }

        let mut derivatives = synths.clone();
        let synthetix_price_feed: Arc<dyn DerivativePriceFeed> = release.synthetix_price_feed.clone();
        let mut price_feeds = vec![synthetix_price_feed; synths.len()];
        for pegged in deployment.pegged_derivatives() {
            derivatives.push(pegged.derivative);
            price_feeds.push(Arc::new(SinglePeggedDerivativePriceFeed::new(
                state,
                pegged.derivative,
                pegged.underlying,
            )?));
        }
        if !derivatives.is_empty() {
            events.extend(release.add_derivatives(owner, &derivatives, &price_feeds)?);
        }

        info!(
            chain_id = deployment.chain_id(),
            primitives = primitives.len(),
            derivatives = derivatives.len(),
            events = events.len(),
            "release deployed"
        );
        Ok((release, events))
    }

    pub fn deployment(&self) -> &Deployment { &self.deployment }

    pub fn authority(&self) -> &Arc<FundDeployerOwner> { &self.authority }

    pub fn chainlink_price_feed(&self) -> &Arc<ChainlinkPriceFeed> { &self.chainlink_price_feed }

    pub fn synthetix_price_feed(&self) -> &Arc<SynthetixPriceFeed> { &self.synthetix_price_feed }

    pub fn aggregated_derivative_price_feed(&self) -> &Arc<AggregatedDerivativePriceFeed> {
        &self.aggregated_derivative_price_feed
    }

    pub fn value_interpreter(&self) -> &ValueInterpreter { &self.value_interpreter }

    /// Registers primitives in the Chainlink feed. Assets registered as
    /// derivatives are rejected by the feed itself.
    pub fn add_primitives(
        &self,
        caller: Address,
        state: &dyn ChainState,
        primitives: &[Address],
        aggregators: &[Address],
        rate_assets: &[RateAsset],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.chainlink_price_feed.add_primitives(caller, state, primitives, aggregators, rate_assets)
    }

    /// Registers derivatives in the aggregated feed. Assets priced as
    /// primitives are rejected by the feed itself.
    pub fn add_derivatives(
        &self,
        caller: Address,
        derivatives: &[Address],
        price_feeds: &[Arc<dyn DerivativePriceFeed>],
    ) -> Result<Vec<FeedEvent>, PriceFeedError> {
        self.aggregated_derivative_price_feed.add_derivatives(caller, derivatives, price_feeds)
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;
        use tabled::{Table, builder::Builder, settings::Style};

        writeln!(
            f,
            "{} chain {} | owner {} | stale rate threshold {}s",
            "Release".blue(),
            self.deployment.chain_id(),
            self.authority.owner(),
            self.chainlink_price_feed.stale_rate_threshold(),
        )?;

        let mut builder = Builder::default();
        builder.push_record(["Asset", "Kind", "Source"]);
        let weth = self.chainlink_price_feed.weth();
        builder.push_record([weth.to_string(), "primitive".green().to_string(), "1 ETH".to_string()]);
        let mut primitives = self.chainlink_price_feed.primitives();
        primitives.sort();
        for primitive in primitives {
            if let Some(info) = self.chainlink_price_feed.get_primitive_info(primitive) {
                builder.push_record([
                    primitive.to_string(),
                    "primitive".green().to_string(),
                    format!("{} ({})", info.aggregator, info.rate_asset),
                ]);
            }
        }
        let mut derivatives = self.aggregated_derivative_price_feed.derivatives();
        derivatives.sort();
        for derivative in derivatives {
            if let Some(feed) = self.aggregated_derivative_price_feed.get_price_feed_for_derivative(derivative) {
                builder.push_record([
                    derivative.to_string(),
                    "derivative".yellow().to_string(),
                    feed.name().to_string(),
                ]);
            }
        }
        let mut table: Table = builder.build();
        table.with(Style::sharp());
        table.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{U256, address};

    use super::*;
    use crate::{
        PrimitiveConfig, SynthetixConfig,
        state::Snapshot,
        types::{RoundData, StateInstant},
    };

    const OWNER: Address = address!("0x00000000000000000000000000000000000000aa");
    const WETH: Address = address!("0x0000000000000000000000000000000000000071");
    const DAI: Address = address!("0x0000000000000000000000000000000000000072");
    const STETH: Address = address!("0x0000000000000000000000000000000000000073");
    const ETH_USD: Address = address!("0x0000000000000000000000000000000000000081");
    const DAI_USD: Address = address!("0x0000000000000000000000000000000000000082");

    fn deployment(pegged: Vec<crate::PeggedDerivativeConfig>) -> Deployment {
        Deployment::custom(
            31337,
            OWNER,
            WETH,
            ETH_USD,
            3_600,
            vec![PrimitiveConfig { asset: DAI, aggregator: DAI_USD, rate_asset: RateAsset::Usd }],
            SynthetixConfig { address_resolver: Address::ZERO, susd: Address::ZERO, synths: vec![] },
            pegged,
        )
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(StateInstant::new(1, 1_000))
            .with_decimals(WETH, 18)
            .with_decimals(DAI, 18)
            .with_decimals(STETH, 18)
            .with_round(ETH_USD, RoundData::from_unsigned(U256::from(200_000_000_000u64), 1_000))
            .with_round(DAI_USD, RoundData::from_unsigned(U256::from(100_000_000u64), 1_000))
    }

    #[test]
    fn test_deploy_without_synths() {
        let state = snapshot();
        let (release, events) = Release::deploy(
            &deployment(vec![crate::PeggedDerivativeConfig { derivative: STETH, underlying: WETH }]),
            &state,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], FeedEvent::PrimitiveAdded { primitive, .. } if primitive == DAI));
        assert!(matches!(events[1], FeedEvent::DerivativeAdded { derivative, .. } if derivative == STETH));
        assert!(release.synthetix_price_feed().synths().is_empty());

        let vi = release.value_interpreter();
        assert!(vi.is_supported_primitive_asset(WETH));
        assert!(vi.is_supported_derivative_asset(STETH));
        assert_eq!(
            vi.calc_canonical_asset_value(&state, STETH, U256::from(10).pow(U256::from(18)), DAI).unwrap(),
            U256::from(2_000) * U256::from(10).pow(U256::from(18))
        );
    }

    #[test]
    fn test_derivative_primitive_exclusivity() {
        let state = snapshot();
        let (release, _) = Release::deploy(
            &deployment(vec![crate::PeggedDerivativeConfig { derivative: STETH, underlying: WETH }]),
            &state,
        )
        .unwrap();

        assert!(matches!(
            release.add_primitives(OWNER, &state, &[STETH], &[DAI_USD], &[RateAsset::Usd]),
            Err(PriceFeedError::AlreadyRegistered(a)) if a == STETH
        ));
        let feed: Arc<dyn DerivativePriceFeed> =
            Arc::new(SinglePeggedDerivativePriceFeed::new(&state, DAI, STETH).unwrap());
        assert!(matches!(
            release.add_derivatives(OWNER, &[DAI], &[feed.clone()]),
            Err(PriceFeedError::AlreadyRegistered(a)) if a == DAI
        ));
        assert!(matches!(
            release.add_derivatives(Address::ZERO, &[DAI], &[feed]),
            Err(PriceFeedError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_registries_enforce_exclusivity() {
        let state = snapshot();
        let (release, _) = Release::deploy(
            &deployment(vec![crate::PeggedDerivativeConfig { derivative: STETH, underlying: WETH }]),
            &state,
        )
        .unwrap();

        let feed: Arc<dyn DerivativePriceFeed> =
            Arc::new(SinglePeggedDerivativePriceFeed::new(&state, DAI, WETH).unwrap());
        assert!(matches!(
            release.aggregated_derivative_price_feed().add_derivatives(OWNER, &[DAI], &[feed]),
            Err(PriceFeedError::AlreadyRegistered(a)) if a == DAI
        ));
        assert!(!release.value_interpreter().is_supported_derivative_asset(DAI));
        assert!(matches!(
            release.chainlink_price_feed().add_primitives(OWNER, &state, &[STETH], &[DAI_USD], &[RateAsset::Usd]),
            Err(PriceFeedError::AlreadyRegistered(a)) if a == STETH
        ));
        assert!(!release.value_interpreter().is_supported_primitive_asset(STETH));

        // 1 DAI keeps its USD price instead of resolving through WETH
        let one = U256::from(10).pow(U256::from(18));
        assert_eq!(
            release.value_interpreter().calc_canonical_asset_value(&state, DAI, one * U256::from(2_000), WETH).unwrap(),
            one
        );
        assert!(matches!(
            release.chainlink_price_feed().bind_derivative_registry(release.aggregated_derivative_price_feed()),
            Err(PriceFeedError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deploy_rejects_invalid_eth_usd_aggregator() {
        let state = snapshot().with_round(ETH_USD, RoundData::from_unsigned(U256::ZERO, 1_000));
        assert!(matches!(
            Release::deploy(&deployment(vec![]), &state),
            Err(PriceFeedError::InvalidRate(a)) if a == WETH
        ));
    }
}
