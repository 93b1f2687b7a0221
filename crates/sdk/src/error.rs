use alloy::primitives::Address;
use thiserror::Error;

/// Failure of a price feed operation.
///
/// Every failure aborts the whole call, valuations never fall back to a
/// partial or zero value.
#[derive(Debug, Error)]
pub enum PriceFeedError {
    /// Caller is not the owner allowed to mutate the registry.
    #[error("unauthorized caller: {0}")]
    Unauthorized(Address),

    /// Batch operation was given zero elements.
    #[error("empty input")]
    EmptyInput,

    #[error("asset already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("asset not registered: {0}")]
    NotRegistered(Address),

    /// Update would not change the stored value.
    #[error("no change for asset: {0}")]
    NoChange(Address),

    /// No feed or registration found for the asset.
    #[error("unsupported asset: {0}")]
    UnsupportedAsset(Address),

    /// Rate source reports a missing, invalid or stale rate for the asset.
    #[error("invalid rate for asset: {0}")]
    InvalidRate(Address),

    /// Synthetix reports no currency key for the Synth.
    #[error("missing currency key for synth: {0}")]
    MissingCurrencyKey(Address),

    #[error("unknown decimals of asset: {0}")]
    UnknownDecimals(Address),

    #[error("array length mismatch")]
    LengthMismatch,

    /// Registering the derivative would make it resolve through itself.
    #[error("derivative resolution cycle through: {0}")]
    ResolutionCycle(Address),

    #[error("derivative resolution deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),
}

impl PriceFeedError {
    /// Whether the same call may succeed later against a newer chain state.
    ///
    /// Registry preconditions are deterministic, rates and RPC failures
    /// are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PriceFeedError::InvalidRate(_)
                | PriceFeedError::Contract(_)
                | PriceFeedError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(PriceFeedError::InvalidRate(Address::ZERO).is_retryable());
        assert!(!PriceFeedError::AlreadyRegistered(Address::ZERO).is_retryable());
        assert!(!PriceFeedError::NoChange(Address::ZERO).is_retryable());
        assert!(!PriceFeedError::EmptyInput.is_retryable());
    }
}
