use alloy::{
    eips::BlockId,
    primitives::Address,
    providers::Provider,
};
use futures::future::try_join_all;
use tracing::{debug, warn};

use super::Snapshot;
use crate::{
    Deployment,
    abi::{
        IChainlinkAggregator, IERC20, ISynthetixAddressResolver, ISynthetixExchangeRates,
        ISynthetixProxyERC20, ISynthetixSynth,
    },
    error::PriceFeedError,
    types::{self, ExchangeRate, RoundData, StateInstant},
};

/// Captures a [`Snapshot`] of everything the price feeds of a
/// [`Deployment`] read, at a single block.
pub struct SnapshotBuilder<P> {
    deployment: Deployment,
    provider: P,
    block: BlockId,
    assets: Vec<Address>,
    synths: Vec<Address>,
}

impl<P: Provider> SnapshotBuilder<P> {
    pub fn new(deployment: &Deployment, provider: P) -> Self {
        Self {
            deployment: deployment.clone(),
            provider,
            block: BlockId::latest(),
            assets: deployment.assets(),
            synths: deployment.synthetix().synths.clone(),
        }
    }

    /// Block to capture the state at [default: latest block].
    pub fn at_block(mut self, block: BlockId) -> Self {
        self.block = block;
        self
    }

    /// Additional tokens to capture decimals of.
    pub fn with_assets(mut self, assets: impl IntoIterator<Item = Address>) -> Self {
        self.assets.extend(assets);
        self.assets.sort();
        self.assets.dedup();
        self
    }

    /// Additional Synths to capture currency keys and rates of, e.g. ones
    /// to be registered after deployment.
    pub fn with_synths(mut self, synths: impl IntoIterator<Item = Address>) -> Self {
        self.synths.extend(synths);
        self.synths.sort();
        self.synths.dedup();
        self
    }

    pub async fn build(self) -> Result<Snapshot, PriceFeedError> {
        let provider = &self.provider;
        let header = provider
            .get_block(self.block)
            .await?
            .ok_or_else(|| PriceFeedError::InvalidArgument(format!("block is not available: {:?}", self.block)))?
            .header;
        let instant = StateInstant::new(header.number, header.timestamp);
        // Pin all reads to the resolved block, `latest` may move meanwhile
        let at = BlockId::number(instant.block_number());
        debug!(%instant, assets = self.assets.len(), synths = self.synths.len(), "capturing snapshot");

        let decimals = try_join_all(self.assets.iter().map(|asset| async move {
            let decimals = IERC20::new(*asset, provider).decimals().block(at).call().await?;
            Ok::<_, PriceFeedError>((*asset, decimals))
        }))
        .await?;

        let currency_keys = try_join_all(self.synths.iter().map(|synth| async move {
            let target = ISynthetixProxyERC20::new(*synth, provider).target().block(at).call().await?;
            let key = ISynthetixSynth::new(target, provider).currencyKey().block(at).call().await?;
            Ok::<_, PriceFeedError>((*synth, key))
        }))
        .await?;

        let exchange_rates_address = ISynthetixAddressResolver::new(
            self.deployment.synthetix().address_resolver,
            provider,
        )
        .requireAndGetAddress(types::currency_key("ExchangeRates")?, "Missing ExchangeRates".to_string())
        .block(at)
        .call()
        .await?;
        let exchange_rates = ISynthetixExchangeRates::new(exchange_rates_address, provider);
        let rates = try_join_all(
            currency_keys
                .iter()
                .filter(|(_, key)| !key.is_zero())
                .map(|(_, key)| {
                    let exchange_rates = &exchange_rates;
                    async move {
                        let r = exchange_rates.rateAndInvalid(*key).block(at).call().await?;
                        Ok::<_, PriceFeedError>((*key, ExchangeRate::new(r.rate, !r.isInvalid)))
                    }
                }),
        )
        .await?;

        let rounds = try_join_all(self.deployment.aggregators().into_iter().map(|aggregator| async move {
            let r = IChainlinkAggregator::new(aggregator, provider)
                .latestRoundData()
                .block(at)
                .call()
                .await?;
            let round = RoundData::from_aggregator(r.answer, r.updatedAt);
            if round.is_none() {
                warn!(%aggregator, updated_at = %r.updatedAt, "skipping round with out of range update time");
            }
            Ok::<_, PriceFeedError>((aggregator, round))
        }))
        .await?;

        let mut snapshot = Snapshot::new(instant);
        for (asset, d) in decimals {
            snapshot = snapshot.with_decimals(asset, d);
        }
        for (synth, key) in currency_keys {
            snapshot = snapshot.with_currency_key(synth, key);
        }
        for (key, rate) in rates {
            snapshot = snapshot.with_exchange_rate(key, rate);
        }
        for (aggregator, round) in rounds.into_iter().filter_map(|(a, r)| Some((a, r?))) {
            debug!(%aggregator, answer = %round.answer(), updated_at = round.updated_at(), "captured round");
            snapshot = snapshot.with_round(aggregator, round);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        providers::ProviderBuilder, rpc::client::RpcClient, transports::layers::RetryBackoffLayer,
    };

    use super::*;
    use crate::state::ChainState;

    #[tokio::test]
    #[ignore = "requires Ethereum mainnet RPC"]
    async fn test_snapshot_mainnet() {
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect("https://ethereum-rpc.publicnode.com")
            .await
            .unwrap();
        let provider = ProviderBuilder::new().connect_client(client);

        let mainnet = Deployment::mainnet();
        let snapshot = SnapshotBuilder::new(&mainnet, provider).build().await.unwrap();

        assert!(snapshot.instant().block_number() > 0);
        assert_eq!(snapshot.decimals(mainnet.weth()), Some(18));
        assert!(snapshot.latest_round(mainnet.eth_usd_aggregator()).is_some());
    }
}
