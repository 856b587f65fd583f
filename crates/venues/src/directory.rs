//! Venue descriptors and the configured venue directory.
//!
//! The directory is populated once at configuration time and is the only
//! authority on which addresses are venues and what kind each one is. An
//! address it does not know is an unknown venue; there is no default-kind
//! fallback.

use std::collections::HashMap;

use alloy::primitives::{Address, B256, U256};

use crate::derive::{compute_pool_address, sort_tokens, POOL_INIT_CODE_HASH};
use crate::errors::ExecutionError;
use crate::plan::{RouteInstruction, VenueKind, VenueRef};

/// Static metadata of one venue.
#[derive(Debug, Clone, Copy)]
pub struct VenueDescriptor {
    pub address: Address,
    pub kind: VenueKind,
    /// Canonical token pair, lower address first.
    pub token0: Address,
    pub token1: Address,
    /// Fee in pips (hundredths of a bip over 1e6). First-class for
    /// concentrated-liquidity venues; 3000 by convention elsewhere.
    pub fee_pips: u32,
    /// Stable-curve flag for stable-swap venues.
    pub stable: bool,
}

impl VenueDescriptor {
    pub fn new(
        address: Address,
        kind: VenueKind,
        token_a: Address,
        token_b: Address,
        fee_pips: u32,
    ) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            address,
            kind,
            token0,
            token1,
            fee_pips,
            stable: false,
        }
    }

    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    /// Whether this venue holds `asset` on either side.
    pub fn holds(&self, asset: Address) -> bool {
        asset == self.token0 || asset == self.token1
    }

    /// The flash fee owed on `amount`, rounded up.
    ///
    /// Only meaningful for venues that declare their fee in the callback.
    pub fn flash_fee(&self, amount: U256) -> Option<U256> {
        let pips = U256::from(self.fee_pips);
        let denom = U256::from(1_000_000u64);
        let product = amount.checked_mul(pips)?;
        // ceil(amount * pips / 1e6)
        product
            .checked_add(denom - U256::from(1u64))
            .map(|n| n / denom)
    }
}

/// Registry of configured venues, keyed by address.
#[derive(Debug, Clone)]
pub struct VenueDirectory {
    venues: HashMap<Address, VenueDescriptor>,
    factory: Address,
    init_code_hash: B256,
}

impl VenueDirectory {
    pub fn new(factory: Address) -> Self {
        Self {
            venues: HashMap::new(),
            factory,
            init_code_hash: POOL_INIT_CODE_HASH,
        }
    }

    pub fn with_init_code_hash(mut self, hash: B256) -> Self {
        self.init_code_hash = hash;
        self
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Register one venue. Later registrations of the same address win.
    pub fn register(&mut self, descriptor: VenueDescriptor) {
        self.venues.insert(descriptor.address, descriptor);
    }

    /// Look up a venue by address.
    pub fn resolve(&self, address: Address) -> Result<&VenueDescriptor, ExecutionError> {
        self.venues
            .get(&address)
            .ok_or(ExecutionError::UnknownVenue(address))
    }

    /// The two assets a venue holds.
    pub fn asset_pair(&self, venue: Address) -> Result<(Address, Address), ExecutionError> {
        let descriptor = self.resolve(venue)?;
        Ok((descriptor.token0, descriptor.token1))
    }

    /// Resolve a route instruction to its venue descriptor.
    ///
    /// Derived references go through CREATE2 address computation first; a
    /// descriptor whose registered kind disagrees with the route's declared
    /// kind is rejected rather than dispatched on a guess.
    pub fn resolve_route(
        &self,
        route: &RouteInstruction,
    ) -> Result<&VenueDescriptor, ExecutionError> {
        let address = match route.venue {
            VenueRef::Direct(addr) => addr,
            VenueRef::Derived {
                token_a,
                token_b,
                fee_tier,
            } => compute_pool_address(self.factory, token_a, token_b, fee_tier, self.init_code_hash),
        };
        let descriptor = self.resolve(address)?;
        if descriptor.kind != route.venue_kind {
            return Err(ExecutionError::UnknownVenue(address));
        }
        Ok(descriptor)
    }

    /// Find a venue of `kind` holding the (a, b) pair, for stable-swap legs.
    pub fn find_pair(&self, kind: VenueKind, a: Address, b: Address) -> Option<&VenueDescriptor> {
        let (token0, token1) = sort_tokens(a, b);
        self.venues
            .values()
            .find(|v| v.kind == kind && v.token0 == token0 && v.token1 == token1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_unknown_address_is_an_error() {
        let directory = VenueDirectory::new(addr(0xaa));
        let err = directory.resolve(addr(1)).unwrap_err();
        assert_eq!(err, ExecutionError::UnknownVenue(addr(1)));
    }

    #[test]
    fn test_kind_mismatch_is_unknown_venue() {
        let mut directory = VenueDirectory::new(addr(0xaa));
        let pool = addr(5);
        directory.register(VenueDescriptor::new(
            pool,
            VenueKind::ConstantProduct,
            addr(1),
            addr(2),
            3000,
        ));
        let route = RouteInstruction {
            venue_kind: VenueKind::ConcentratedLiquidity,
            venue: VenueRef::Direct(pool),
            token_in: addr(1),
            token_out: addr(2),
            min_out: U256::ZERO,
            legs: Vec::new(),
        };
        assert_eq!(
            directory.resolve_route(&route).unwrap_err(),
            ExecutionError::UnknownVenue(pool)
        );
    }

    #[test]
    fn test_derived_route_resolution() {
        let factory = addr(0xaa);
        let (a, b) = (addr(1), addr(2));
        let pool = compute_pool_address(factory, a, b, 500, POOL_INIT_CODE_HASH);
        let mut directory = VenueDirectory::new(factory);
        directory.register(VenueDescriptor::new(
            pool,
            VenueKind::ConcentratedLiquidity,
            a,
            b,
            500,
        ));
        let route = RouteInstruction {
            venue_kind: VenueKind::ConcentratedLiquidity,
            venue: VenueRef::Derived {
                token_a: a,
                token_b: b,
                fee_tier: 500,
            },
            token_in: a,
            token_out: b,
            min_out: U256::ZERO,
            legs: Vec::new(),
        };
        assert_eq!(directory.resolve_route(&route).unwrap().address, pool);
    }

    #[test]
    fn test_flash_fee_rounds_up() {
        let descriptor = VenueDescriptor::new(
            addr(5),
            VenueKind::ConcentratedLiquidity,
            addr(1),
            addr(2),
            500,
        );
        // 1_000_000 * 500 / 1e6 = 500 exactly
        assert_eq!(
            descriptor.flash_fee(U256::from(1_000_000u64)),
            Some(U256::from(500u64))
        );
        // 1_000_001 * 500 / 1e6 = 500.0005 -> 501
        assert_eq!(
            descriptor.flash_fee(U256::from(1_000_001u64)),
            Some(U256::from(501u64))
        );
    }
}
