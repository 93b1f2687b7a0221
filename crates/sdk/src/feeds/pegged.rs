use alloy::primitives::{Address, U256};

use super::DerivativePriceFeed;
use crate::{error::PriceFeedError, state::ChainState, types::UnderlyingValues};

/// Prices a derivative pegged 1:1 to its underlying, e.g. Lido stETH to
/// WETH.
#[derive(Clone, Copy, Debug)]
pub struct SinglePeggedDerivativePriceFeed {
    derivative: Address,
    underlying: Address,
}

impl SinglePeggedDerivativePriceFeed {
    /// Both assets must be distinct and have the same decimals, so that
    /// raw amounts convert 1:1.
    pub fn new(
        state: &dyn ChainState,
        derivative: Address,
        underlying: Address,
    ) -> Result<Self, PriceFeedError> {
        if derivative == underlying {
            return Err(PriceFeedError::InvalidArgument(format!(
                "derivative is pegged to itself: {derivative}"
            )));
        }
        let derivative_decimals =
            state.decimals(derivative).ok_or(PriceFeedError::UnknownDecimals(derivative))?;
        let underlying_decimals =
            state.decimals(underlying).ok_or(PriceFeedError::UnknownDecimals(underlying))?;
        if derivative_decimals != underlying_decimals {
            return Err(PriceFeedError::InvalidArgument(format!(
                "unequal decimals of {derivative} ({derivative_decimals}) and {underlying} ({underlying_decimals})"
            )));
        }
        Ok(Self { derivative, underlying })
    }

    pub fn derivative(&self) -> Address { self.derivative }

    pub fn underlying(&self) -> Address { self.underlying }
}

impl DerivativePriceFeed for SinglePeggedDerivativePriceFeed {
    fn name(&self) -> &'static str { "SinglePeggedDerivativePriceFeed" }

    fn calc_underlying_values(
        &self,
        _state: &dyn ChainState,
        derivative: Address,
        amount: U256,
    ) -> Result<UnderlyingValues, PriceFeedError> {
        if !self.is_supported_asset(derivative) {
            return Err(PriceFeedError::UnsupportedAsset(derivative));
        }
        Ok(UnderlyingValues::single(self.underlying, amount))
    }

    fn is_supported_asset(&self, asset: Address) -> bool { asset == self.derivative }

    fn underlying_assets(&self, derivative: Address) -> Vec<Address> {
        if self.is_supported_asset(derivative) { vec![self.underlying] } else { vec![] }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{state::Snapshot, types::StateInstant};

    const STETH: Address = address!("0x0000000000000000000000000000000000000021");
    const WETH: Address = address!("0x0000000000000000000000000000000000000022");
    const USDC: Address = address!("0x0000000000000000000000000000000000000023");

    fn snapshot() -> Snapshot {
        Snapshot::new(StateInstant::default())
            .with_decimals(STETH, 18)
            .with_decimals(WETH, 18)
            .with_decimals(USDC, 6)
    }

    #[test]
    fn test_pegged_one_to_one() {
        let state = snapshot();
        let feed = SinglePeggedDerivativePriceFeed::new(&state, STETH, WETH).unwrap();
        let values = feed.calc_underlying_values(&state, STETH, U256::from(42)).unwrap();
        assert_eq!(values, UnderlyingValues::single(WETH, U256::from(42)));
        assert_eq!(feed.underlying_assets(STETH), vec![WETH]);
        assert!(feed.underlying_assets(WETH).is_empty());
        assert!(matches!(
            feed.calc_underlying_values(&state, WETH, U256::from(1)),
            Err(PriceFeedError::UnsupportedAsset(a)) if a == WETH
        ));
    }

    #[test]
    fn test_pegged_invalid_config() {
        let state = snapshot();
        assert!(matches!(
            SinglePeggedDerivativePriceFeed::new(&state, STETH, STETH),
            Err(PriceFeedError::InvalidArgument(_))
        ));
        assert!(matches!(
            SinglePeggedDerivativePriceFeed::new(&state, STETH, USDC),
            Err(PriceFeedError::InvalidArgument(_))
        ));
        assert!(matches!(
            SinglePeggedDerivativePriceFeed::new(&Snapshot::default(), STETH, WETH),
            Err(PriceFeedError::UnknownDecimals(a)) if a == STETH
        ));
    }
}
