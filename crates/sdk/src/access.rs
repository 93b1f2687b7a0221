//! Registry access control.

use alloy::primitives::Address;

use crate::error::PriceFeedError;

/// Decides whether a caller may mutate the price feed registries.
pub trait Authority: Send + Sync + std::fmt::Debug {
    fn is_authorized_owner(&self, caller: Address) -> bool;

    /// Fails with [`PriceFeedError::Unauthorized`] unless `caller` is
    /// authorized.
    fn ensure_owner(&self, caller: Address) -> Result<(), PriceFeedError> {
        if self.is_authorized_owner(caller) {
            Ok(())
        } else {
            Err(PriceFeedError::Unauthorized(caller))
        }
    }
}

/// Authorizes the owner of the fund deployer only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FundDeployerOwner(Address);

impl FundDeployerOwner {
    pub fn new(owner: Address) -> Self { Self(owner) }

    pub fn owner(&self) -> Address { self.0 }
}

impl Authority for FundDeployerOwner {
    fn is_authorized_owner(&self, caller: Address) -> bool { !caller.is_zero() && caller == self.0 }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_fund_deployer_owner() {
        let owner = address!("0x00000000000000000000000000000000000000aa");
        let authority = FundDeployerOwner::new(owner);
        assert!(authority.ensure_owner(owner).is_ok());
        assert!(matches!(
            authority.ensure_owner(Address::ZERO),
            Err(PriceFeedError::Unauthorized(a)) if a.is_zero()
        ));
        assert!(!FundDeployerOwner::new(Address::ZERO).is_authorized_owner(Address::ZERO));
    }
}
