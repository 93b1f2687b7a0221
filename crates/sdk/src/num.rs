//! Fixed-point integer helpers.

use alloy::primitives::{
    U256,
    utils::{ParseUnits, format_units, parse_units},
};

use crate::error::PriceFeedError;

/// 1e18, unit of ETH rates and Synthetix exchange rates.
pub const ETH_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Maximum number of token decimals supported.
pub const MAX_DECIMALS: u8 = 18;

/// Computes `Π numerators / Π denominators` as a single truncating
/// division, so no precision is lost to intermediate rounding.
///
/// Fails with [`PriceFeedError::Overflow`] if any product exceeds 256 bits
/// or the denominator is zero.
pub fn mul_div(numerators: &[U256], denominators: &[U256]) -> Result<U256, PriceFeedError> {
    let product = |factors: &[U256]| {
        factors
            .iter()
            .try_fold(U256::from(1), |acc, f| acc.checked_mul(*f))
            .ok_or(PriceFeedError::Overflow)
    };
    let numerator = product(numerators)?;
    let denominator = product(denominators)?;
    numerator.checked_div(denominator).ok_or(PriceFeedError::Overflow)
}

/// Converter between raw token amounts and their decimal representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    /// Fails for more than [`MAX_DECIMALS`] decimals.
    pub fn new(decimals: u8) -> Result<Self, PriceFeedError> {
        if decimals > MAX_DECIMALS {
            return Err(PriceFeedError::InvalidArgument(format!(
                "unsupported number of decimals: {decimals}"
            )));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Raw amount of one whole token, `10^decimals`.
    pub fn unit(&self) -> U256 { U256::from(10).pow(U256::from(self.decimals)) }

    /// Formats raw amount as a decimal string.
    pub fn format(&self, amount: U256) -> String {
        format_units(amount, self.decimals).unwrap_or_else(|_| amount.to_string())
    }

    /// Parses a decimal string into raw amount.
    pub fn parse(&self, amount: &str) -> Result<U256, PriceFeedError> {
        match parse_units(amount, self.decimals) {
            Ok(ParseUnits::U256(value)) => Ok(value),
            Ok(ParseUnits::I256(_)) | Err(_) => Err(PriceFeedError::InvalidArgument(format!(
                "invalid amount: {amount}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_truncates_once() {
        // (10 * 10) / (3 * 3) = 11, truncating each step would give 9
        let v = mul_div(&[U256::from(10), U256::from(10)], &[U256::from(3), U256::from(3)]).unwrap();
        assert_eq!(v, U256::from(11));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert!(matches!(mul_div(&[U256::MAX, U256::from(2)], &[U256::from(1)]), Err(PriceFeedError::Overflow)));
        assert!(matches!(mul_div(&[U256::from(1)], &[U256::ZERO]), Err(PriceFeedError::Overflow)));
    }

    #[test]
    fn test_converter() {
        assert_eq!(ETH_UNIT, U256::from(10).pow(U256::from(18)));

        let usdc = Converter::new(6).unwrap();
        assert_eq!(usdc.unit(), U256::from(1_000_000));
        assert_eq!(usdc.parse("1.5").unwrap(), U256::from(1_500_000));
        assert_eq!(usdc.format(U256::from(31934452377u64)), "31934.452377");
        assert!(usdc.parse("abc").is_err());
        assert!(Converter::new(19).is_err());
    }
}
