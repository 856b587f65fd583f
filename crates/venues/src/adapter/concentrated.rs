//! Concentrated-liquidity venue adapter.
//!
//! The fee tier is a first-class pool parameter (pips over 1e6: 100, 500,
//! 3000, 10000). The simulated curve charges the tier on the input and then
//! applies the constant-product invariant over the pooled reserves; full
//! tick-range math lives with the off-chain planner, not here.

use alloy::primitives::{Address, U256};
use tracing::debug;

use super::{oriented_reserves, settle_swap, VenueAdapter};
use crate::directory::VenueDirectory;
use crate::errors::ExecutionError;
use crate::ledger::Ledger;
use crate::plan::{RouteInstruction, VenueKind};

/// Pips denominator: fee tiers are expressed over 1e6.
pub const PIPS_DENOMINATOR: u64 = 1_000_000;

/// Output of a fee-tiered swap: the tier is deducted from the input, then
/// the remaining amount trades at the constant-product price.
pub fn tiered_swap_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee_pips: u32,
) -> Result<U256, ExecutionError> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(U256::ZERO);
    }
    let keep = PIPS_DENOMINATOR
        .checked_sub(u64::from(fee_pips))
        .map(U256::from)
        .ok_or(ExecutionError::ArithmeticOverflow("fee tier"))?;
    let after_fee = amount_in
        .checked_mul(keep)
        .ok_or(ExecutionError::ArithmeticOverflow("fee deduction"))?
        / U256::from(PIPS_DENOMINATOR);
    let numerator = after_fee
        .checked_mul(reserve_out)
        .ok_or(ExecutionError::ArithmeticOverflow("numerator"))?;
    let denominator = reserve_in
        .checked_add(after_fee)
        .ok_or(ExecutionError::ArithmeticOverflow("denominator"))?;
    Ok(numerator / denominator)
}

/// Adapter for concentrated-liquidity pools.
pub struct ConcentratedLiquidityAdapter;

impl VenueAdapter for ConcentratedLiquidityAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::ConcentratedLiquidity
    }

    fn execute(
        &self,
        ledger: &mut Ledger,
        venues: &VenueDirectory,
        route: &RouteInstruction,
        holder: Address,
        amount_in: U256,
    ) -> Result<U256, ExecutionError> {
        let descriptor = *venues.resolve_route(route)?;
        let (reserve_in, reserve_out, zero_for_one) =
            oriented_reserves(ledger, &descriptor, route.token_in, route.token_out)?;
        let amount_out = tiered_swap_out(amount_in, reserve_in, reserve_out, descriptor.fee_pips)?;
        settle_swap(
            ledger,
            &descriptor,
            holder,
            route.token_in,
            route.token_out,
            amount_in,
            amount_out,
            zero_for_one,
        )?;
        debug!(
            pool = %descriptor.address,
            fee_pips = descriptor.fee_pips,
            amount_in = %amount_in,
            amount_out = %amount_out,
            "concentrated-liquidity swap"
        );
        Ok(amount_out)
    }
}
