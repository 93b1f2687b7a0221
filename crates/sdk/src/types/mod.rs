mod event;
mod rate;

use std::fmt::Display;

use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
pub use event::*;
pub use rate::*;

use crate::error::PriceFeedError;

/// Synthetix internal identifier of a Synth's exchange rate entry,
/// e.g. `"sBTC"` right-padded with zero bytes.
pub type CurrencyKey = B256;

/// Encodes a Synthetix currency key from its symbol.
///
/// Symbols longer than 31 bytes cannot be encoded.
pub fn currency_key(symbol: &str) -> Result<CurrencyKey, PriceFeedError> {
    if symbol.len() > 31 {
        return Err(PriceFeedError::InvalidArgument(format!(
            "currency key symbol is too long: {symbol}"
        )));
    }
    Ok(B256::right_padding_from(symbol.as_bytes()))
}

/// Decodes the symbol of a currency key, lossy for non-UTF-8 keys.
pub fn currency_key_symbol(key: &CurrencyKey) -> String {
    let len = key.iter().position(|b| *b == 0).unwrap_or(key.len());
    String::from_utf8_lossy(&key[..len]).into_owned()
}

/// Underlying assets and amounts a derivative amount decomposes into,
/// index aligned.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct UnderlyingValues {
    underlyings: Vec<Address>,
    amounts: Vec<U256>,
}

impl UnderlyingValues {
    pub fn new(underlyings: Vec<Address>, amounts: Vec<U256>) -> Result<Self, PriceFeedError> {
        if underlyings.len() != amounts.len() {
            return Err(PriceFeedError::LengthMismatch);
        }
        Ok(Self { underlyings, amounts })
    }

    /// Single underlying asset.
    pub fn single(underlying: Address, amount: U256) -> Self {
        Self { underlyings: vec![underlying], amounts: vec![amount] }
    }

    pub fn underlyings(&self) -> &[Address] { &self.underlyings }

    pub fn amounts(&self) -> &[U256] { &self.amounts }

    pub fn len(&self) -> usize { self.underlyings.len() }

    pub fn is_empty(&self) -> bool { self.underlyings.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.underlyings.iter().copied().zip(self.amounts.iter().copied())
    }
}

#[cfg(feature = "display")]
impl Display for UnderlyingValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use tabled::{Table, builder::Builder, settings::Style};

        let mut builder = Builder::default();
        builder.push_record(["Underlying", "Amount"]);
        for (underlying, amount) in self.iter() {
            builder.push_record([underlying.to_string(), amount.to_string()]);
        }
        let mut table: Table = builder.build();
        table.with(Style::sharp());
        table.fmt(f)
    }
}

/// Instant in chain history the state is up to date with.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct StateInstant {
    block_number: u64,
    block_timestamp: u64,
}

impl StateInstant {
    pub fn new(block_number: u64, block_timestamp: u64) -> Self {
        Self { block_number, block_timestamp }
    }

    pub fn block_number(&self) -> u64 { self.block_number }

    pub fn block_timestamp(&self) -> u64 { self.block_timestamp }
}

impl Display for StateInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(ts) = DateTime::<Utc>::from_timestamp(self.block_timestamp as i64, 0) else {
            return write!(f, "#{} @ {}", self.block_number, self.block_timestamp);
        };
        let ts = ts.format("%Y-%m-%d %H:%M:%S");
        if self.block_number > 0 {
            write!(f, "#{} @ {}", self.block_number, ts)
        } else {
            write!(f, "{}", ts)
        }
    }
}
