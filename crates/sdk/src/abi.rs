//! Solidity interfaces of the external contracts the snapshot reads.

#![allow(clippy::too_many_arguments)]

alloy::sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
    }

    #[sol(rpc)]
    interface ISynthetixAddressResolver {
        function requireAndGetAddress(bytes32 name, string calldata reason) external view returns (address);
    }

    #[sol(rpc)]
    interface ISynthetixProxyERC20 {
        function target() external view returns (address);
    }

    #[sol(rpc)]
    interface ISynthetixSynth {
        function currencyKey() external view returns (bytes32);
    }

    #[sol(rpc)]
    interface ISynthetixExchangeRates {
        function rateAndInvalid(bytes32 currencyKey) external view returns (uint256 rate, bool isInvalid);
    }

    #[sol(rpc)]
    interface IChainlinkAggregator {
        function latestRoundData()
            external
            view
            returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
    }
}
