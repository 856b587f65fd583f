//! Constant-product (x·y = k) venue adapter, 0.30% fee convention.

use alloy::primitives::{Address, U256};
use tracing::debug;

use super::{oriented_reserves, settle_swap, VenueAdapter};
use crate::directory::VenueDirectory;
use crate::errors::ExecutionError;
use crate::ledger::Ledger;
use crate::plan::{RouteInstruction, VenueKind};

/// Fee numerator of the 0.30% convention: 997 parts of the input trade.
pub const FEE_NUMERATOR: u64 = 997;
/// Fee denominator of the 0.30% convention.
pub const FEE_DENOMINATOR: u64 = 1000;

/// Exact integer output of a constant-product swap:
/// `(in·997·reserveOut) / (reserveIn·1000 + in·997)`.
pub fn constant_product_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, ExecutionError> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(U256::ZERO);
    }
    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(FEE_NUMERATOR))
        .ok_or(ExecutionError::ArithmeticOverflow("amount_in * fee"))?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(ExecutionError::ArithmeticOverflow("numerator"))?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(ExecutionError::ArithmeticOverflow("denominator"))?;
    Ok(numerator / denominator)
}

/// Repayment a constant-product pool demands on a flash borrow:
/// `floor(amount·1000/997) + 1`. The `+1` keeps integer truncation from
/// ever under-shooting the pool's side of the trade.
pub fn flash_repayment(amount: U256) -> Result<U256, ExecutionError> {
    let scaled = amount
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .ok_or(ExecutionError::ArithmeticOverflow("flash repayment"))?;
    (scaled / U256::from(FEE_NUMERATOR))
        .checked_add(U256::from(1u64))
        .ok_or(ExecutionError::ArithmeticOverflow("flash repayment"))
}

/// Adapter for constant-product pools.
pub struct ConstantProductAdapter;

impl VenueAdapter for ConstantProductAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::ConstantProduct
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
        let amount_out = constant_product_out(amount_in, reserve_in, reserve_out)?;
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
            amount_in = %amount_in,
            amount_out = %amount_out,
            "constant-product swap"
        );
        Ok(amount_out)
    }
}
