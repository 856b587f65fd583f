//! Stable-swap venue adapter.
//!
//! Routing is an explicit list of (from, to, stable, factory) legs rather
//! than a bare asset path; each leg is settled against its own pool. Stable
//! pairs trade with a reduced 5 bp fee, volatile legs with the standard
//! 0.30% constant-product fee.

use alloy::primitives::{Address, U256};
use tracing::debug;

use super::constant_product::constant_product_out;
use super::{oriented_reserves, settle_swap, VenueAdapter};
use crate::directory::VenueDirectory;
use crate::errors::ExecutionError;
use crate::ledger::Ledger;
use crate::plan::{RouteInstruction, VenueKind};

/// Stable-pair fee: 5 bp kept out of every 10_000 parts.
pub const STABLE_FEE_KEEP: u64 = 9_995;
/// Stable-pair fee denominator.
pub const STABLE_FEE_DENOMINATOR: u64 = 10_000;

/// Output of one stable-curve leg: 5 bp off the input, then the
/// constant-product invariant.
pub fn stable_leg_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, ExecutionError> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(U256::ZERO);
    }
    let after_fee = amount_in
        .checked_mul(U256::from(STABLE_FEE_KEEP))
        .ok_or(ExecutionError::ArithmeticOverflow("stable fee"))?
        / U256::from(STABLE_FEE_DENOMINATOR);
    let numerator = after_fee
        .checked_mul(reserve_out)
        .ok_or(ExecutionError::ArithmeticOverflow("numerator"))?;
    let denominator = reserve_in
        .checked_add(after_fee)
        .ok_or(ExecutionError::ArithmeticOverflow("denominator"))?;
    Ok(numerator / denominator)
}

/// Adapter for stable-swap venues.
pub struct StableSwapAdapter;

impl VenueAdapter for StableSwapAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::StableSwap
    }

    fn execute(
        &self,
        ledger: &mut Ledger,
        venues: &VenueDirectory,
        route: &RouteInstruction,
        holder: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError> {
        if route.legs.is_empty() {
            return Err(ExecutionError::PlanDecode(
                "stable-swap route carries no legs".into(),
            ));
        }
        let first = &route.legs[0];
        let last = &route.legs[route.legs.len() - 1];
        if first.from != route.token_in || last.to != route.token_out {
            return Err(ExecutionError::PlanDecode(
                "stable-swap legs do not span the hop's asset pair".into(),
            ));
        }
        for pair in route.legs.windows(2) {
            if pair[0].to != pair[1].from {
                return Err(ExecutionError::PlanDecode(
                    "stable-swap legs are not contiguous".into(),
                ));
            }
        }

        let mut amount = amount_in;
        for leg in &route.legs {
            let descriptor = *venues
                .find_pair(VenueKind::StableSwap, leg.from, leg.to)
                .ok_or(ExecutionError::UnknownVenue(leg.factory))?;
            let (reserve_in, reserve_out, zero_for_one) =
                oriented_reserves(ledger, &descriptor, leg.from, leg.to)?;
            let amount_out = if leg.stable {
                stable_leg_out(amount, reserve_in, reserve_out)?
            } else {
                constant_product_out(amount, reserve_in, reserve_out)?
            };
            settle_swap(
                ledger,
                &descriptor,
                holder,
                leg.from,
                leg.to,
                amount,
                amount_out,
                zero_for_one,
            )?;
            debug!(
                pool = %descriptor.address,
                stable = leg.stable,
                amount_in = %amount,
                amount_out = %amount_out,
                "stable-swap leg"
            );
            amount = amount_out;
        }
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::VenueDescriptor;
    use crate::plan::{StableLegRoute, VenueRef};

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_stable_leg_out_known_value() {
        // 5 bp on 1_000_000 leaves 999_500;
        // 999_500 * 50e6 / (50e6 + 999_500) = 979_911
        let out = stable_leg_out(
            U256::from(1_000_000u64),
            U256::from(50_000_000u64),
            U256::from(50_000_000u64),
        )
        .unwrap();
        assert_eq!(out, U256::from(979_911u64));
    }

    #[test]
    fn test_execute_single_stable_leg() {
        let factory = addr(0xaa);
        let (usdc, dai) = (addr(2), addr(3));
        let pool = addr(6);
        let holder = addr(10);

        let mut ledger = Ledger::new();
        ledger.seed_pool(
            pool,
            usdc,
            U256::from(50_000_000u64),
            dai,
            U256::from(50_000_000u64),
        );
        ledger.mint(usdc, holder, U256::from(1_000_000u64));
        ledger.approve(usdc, holder, pool, U256::MAX);

        let mut venues = VenueDirectory::new(factory);
        venues.register(
            VenueDescriptor::new(pool, VenueKind::StableSwap, usdc, dai, 500).with_stable(true),
        );

        let route = RouteInstruction {
            venue_kind: VenueKind::StableSwap,
            venue: VenueRef::Direct(pool),
            token_in: usdc,
            token_out: dai,
            min_out: U256::ZERO,
            legs: vec![StableLegRoute {
                from: usdc,
                to: dai,
                stable: true,
                factory,
            }],
        };
        let out = StableSwapAdapter
            .execute(&mut ledger, &venues, &route, holder, U256::from(1_000_000u64))
            .unwrap();
        assert_eq!(out, U256::from(979_911u64));
        assert_eq!(ledger.balance_of(dai, holder), U256::from(979_911u64));
    }

    #[test]
    fn test_discontiguous_legs_rejected() {
        let factory = addr(0xaa);
        let route = RouteInstruction {
            venue_kind: VenueKind::StableSwap,
            venue: VenueRef::Direct(addr(6)),
            token_in: addr(2),
            token_out: addr(4),
            min_out: U256::ZERO,
            legs: vec![
                StableLegRoute {
                    from: addr(2),
                    to: addr(3),
                    stable: true,
                    factory,
                },
                StableLegRoute {
                    from: addr(5),
                    to: addr(4),
                    stable: true,
                    factory,
                },
            ],
        };
        let mut ledger = Ledger::new();
        let venues = VenueDirectory::new(factory);
        let err = StableSwapAdapter
            .execute(&mut ledger, &venues, &route, addr(10), U256::from(1u64))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::PlanDecode(_)));
    }
}
