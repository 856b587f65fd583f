//! Exchange venue adapters.
//!
//! One adapter per venue kind, behind a common capability trait. The
//! registry is populated at configuration time and is the only dispatch
//! path; the engine never compares router addresses inline, and a kind
//! with no adapter is a hard failure, not a fallback.
//!
//! Adapters apply no output floor of their own: the plan's `min_out` is
//! carried but profitability is enforced globally by the engine after
//! repayment, never per hop.

pub mod concentrated;
pub mod constant_product;
pub mod stable_swap;

pub use concentrated::ConcentratedLiquidityAdapter;
pub use constant_product::ConstantProductAdapter;
pub use stable_swap::StableSwapAdapter;

use std::collections::HashMap;

use alloy::primitives::{Address, U256};

use crate::directory::{VenueDescriptor, VenueDirectory};
use crate::errors::ExecutionError;
use crate::ledger::Ledger;
use crate::plan::{RouteInstruction, VenueKind};

/// Exchange capability: swap an exact input through one venue.
pub trait VenueAdapter: Send + Sync {
    /// The venue kind this adapter serves.
    fn kind(&self) -> VenueKind;

    /// Execute `route` with `amount_in` on behalf of `holder`, returning the
    /// nominal output amount. Input is pulled through the holder's
    /// allowance; output is pushed back to the holder.
    fn execute(
        &self,
        ledger: &mut Ledger,
        venues: &VenueDirectory,
        route: &RouteInstruction,
        holder: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError>;
}

impl std::fmt::Debug for dyn VenueAdapter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VenueAdapter({:?})", self.kind())
    }
}

/// Registry mapping venue kinds to adapter implementations.
pub struct AdapterRegistry {
    adapters: HashMap<VenueKind, Box<dyn VenueAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with all three standard adapters installed.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ConstantProductAdapter));
        registry.register(Box::new(ConcentratedLiquidityAdapter));
        registry.register(Box::new(StableSwapAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn VenueAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Adapter serving `kind`, or a hard failure if none is configured.
    pub fn adapter_for(&self, kind: VenueKind) -> Result<&dyn VenueAdapter, ExecutionError> {
        self.adapters
            .get(&kind)
            .map(|a| a.as_ref())
            .ok_or(ExecutionError::AdapterUnavailable(kind))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Orient a pool's reserves for a swap of `token_in` into `token_out`.
///
/// Returns (reserve_in, reserve_out, zero_for_one).
pub(crate) fn oriented_reserves(
    ledger: &Ledger,
    descriptor: &VenueDescriptor,
    token_in: Address,
    token_out: Address,
) -> Result<(U256, U256, bool), ExecutionError> {
    let reserves = ledger.reserves(descriptor.address)?;
    if token_in == descriptor.token0 && token_out == descriptor.token1 {
        Ok((reserves.reserve0, reserves.reserve1, true))
    } else if token_in == descriptor.token1 && token_out == descriptor.token0 {
        Ok((reserves.reserve1, reserves.reserve0, false))
    } else {
        let foreign = if descriptor.holds(token_in) {
            token_out
        } else {
            token_in
        };
        Err(ExecutionError::AssetNotInVenue {
            venue: descriptor.address,
            asset: foreign,
        })
    }
}

/// Settle one pool swap against the ledger: pull the input through the
/// holder's allowance, push the output, and write back the moved reserves.
pub(crate) fn settle_swap(
    ledger: &mut Ledger,
    descriptor: &VenueDescriptor,
    holder: Address,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<(), ExecutionError> {
    let pool = descriptor.address;
    let outcome = ledger.transfer_from(token_in, holder, pool, pool, amount_in)?;
    if !outcome.is_success() {
        return Err(ExecutionError::TransferFailed(token_in));
    }
    let outcome = ledger.transfer(token_out, pool, holder, amount_out)?;
    if !outcome.is_success() {
        return Err(ExecutionError::TransferFailed(token_out));
    }

    let mut reserves = ledger.reserves(pool)?;
    let (reserve_in, reserve_out) = if zero_for_one {
        (&mut reserves.reserve0, &mut reserves.reserve1)
    } else {
        (&mut reserves.reserve1, &mut reserves.reserve0)
    };
    *reserve_in = reserve_in
        .checked_add(amount_in)
        .ok_or(ExecutionError::ArithmeticOverflow("reserve credit"))?;
    *reserve_out = reserve_out
        .checked_sub(amount_out)
        .ok_or(ExecutionError::ArithmeticOverflow("reserve debit"))?;
    ledger.set_reserves(pool, reserves);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::VenueRef;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_missing_adapter_names_the_kind() {
        let mut registry = AdapterRegistry::new();
        registry.register(Box::new(ConstantProductAdapter));
        assert!(registry.adapter_for(VenueKind::ConstantProduct).is_ok());
        assert_eq!(
            registry.adapter_for(VenueKind::StableSwap).unwrap_err(),
            ExecutionError::AdapterUnavailable(VenueKind::StableSwap)
        );
    }

    #[test]
    fn test_dust_input_settles_with_zero_output() {
        // No per-hop floor: a dust trade against deep reserves yields zero
        // output and still settles; only the global profit check may abort.
        let (weth, usdc) = (addr(1), addr(2));
        let pool = addr(5);
        let holder = addr(10);

        let mut ledger = Ledger::new();
        ledger.seed_pool(
            pool,
            weth,
            U256::from(u64::MAX),
            usdc,
            U256::from(1_000u64),
        );
        ledger.mint(weth, holder, U256::from(1u64));
        ledger.approve(weth, holder, pool, U256::MAX);

        let mut venues = VenueDirectory::new(addr(0xaa));
        venues.register(VenueDescriptor::new(
            pool,
            VenueKind::ConstantProduct,
            weth,
            usdc,
            3000,
        ));

        let route = RouteInstruction {
            venue_kind: VenueKind::ConstantProduct,
            venue: VenueRef::Direct(pool),
            token_in: weth,
            token_out: usdc,
            min_out: U256::ZERO,
            legs: Vec::new(),
        };
        let out = ConstantProductAdapter
            .execute(&mut ledger, &venues, &route, holder, U256::from(1u64))
            .unwrap();
        assert_eq!(out, U256::ZERO);
        assert_eq!(ledger.balance_of(weth, holder), U256::ZERO);
        assert_eq!(ledger.balance_of(usdc, holder), U256::ZERO);
        assert_eq!(ledger.reserves(pool).unwrap().reserve1, U256::from(1_000u64));
    }
}
