//! Flash-loan borrowing.
//!
//! The callback here is not an asynchronous event: the lending venue pays
//! the principal out and immediately invokes the receiver on the same call
//! stack, before `flash_borrow` returns. By the time the callback returns,
//! the venue's balance must have grown back to principal plus fee, or the
//! borrow fails and the caller discards every effect.
//!
//! Two venue families lend:
//! - constant-product pools charge the implicit 0.30% convention and pass
//!   an initiator argument through to the callback;
//! - concentrated-liquidity pools declare the fee in the callback and pass
//!   no initiator.

use alloy::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::adapter::constant_product;
use crate::directory::VenueDirectory;
use crate::errors::ExecutionError;
use crate::ledger::Ledger;
use crate::plan::VenueKind;

/// Everything the lending venue hands to the borrower's callback.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    /// Identity of the venue making the callback.
    pub caller: Address,
    /// Initiating identity, for venue families that report one.
    pub initiator: Option<Address>,
    /// Fee owed on top of the principal, for venues that declare it.
    pub declared_fee: Option<U256>,
    /// The payload handed to the venue at initiation, passed through
    /// untouched.
    pub data: Bytes,
}

/// Borrower half of a flash loan.
pub trait FlashLoanReceiver {
    /// Invoked synchronously by the lending venue mid-borrow.
    fn on_flash_loan(
        &mut self,
        ledger: &mut Ledger,
        venues: &VenueDirectory,
        ctx: CallbackContext,
    ) -> Result<(), ExecutionError>;
}

/// Borrow `amount` of `asset` from `pool`, run the receiver's callback, and
/// verify repayment.
///
/// `recipient` receives the principal; `initiator` is the identity the
/// venue reports to the callback for families that pass one.
#[allow(clippy::too_many_arguments)]
pub fn flash_borrow(
    ledger: &mut Ledger,
    venues: &VenueDirectory,
    pool: Address,
    recipient: Address,
    initiator: Address,
    asset: Address,
    amount: U256,
    payload: Bytes,
    receiver: &mut dyn FlashLoanReceiver,
) -> Result<(), ExecutionError> {
    let descriptor = *venues.resolve(pool)?;
    if !descriptor.holds(asset) {
        return Err(ExecutionError::AssetNotInVenue { venue: pool, asset });
    }

    let (owed, declared_fee, reported_initiator) = match descriptor.kind {
        VenueKind::ConcentratedLiquidity => {
            let fee = descriptor
                .flash_fee(amount)
                .ok_or(ExecutionError::ArithmeticOverflow("flash fee"))?;
            let owed = amount
                .checked_add(fee)
                .ok_or(ExecutionError::ArithmeticOverflow("amount owed"))?;
            (owed, Some(fee), None)
        }
        VenueKind::ConstantProduct => {
            (constant_product::flash_repayment(amount)?, None, Some(initiator))
        }
        VenueKind::StableSwap => return Err(ExecutionError::UnknownVenue(pool)),
    };

    let balance_before = ledger.balance_of(asset, pool);
    if balance_before < amount {
        return Err(ExecutionError::InsufficientLiquidity(pool));
    }
    let outcome = ledger.transfer(asset, pool, recipient, amount)?;
    if !outcome.is_success() {
        return Err(ExecutionError::TransferFailed(asset));
    }
    debug!(pool = %pool, asset = %asset, amount = %amount, "flash loan paid out");

    receiver.on_flash_loan(
        ledger,
        venues,
        CallbackContext {
            caller: pool,
            initiator: reported_initiator,
            declared_fee,
            data: payload,
        },
    )?;

    // balance_before already covered the principal, so this cannot wrap.
    let floor = balance_before - amount;
    let required = floor
        .checked_add(owed)
        .ok_or(ExecutionError::ArithmeticOverflow("required balance"))?;
    let balance_after = ledger.balance_of(asset, pool);
    if balance_after < required {
        return Err(ExecutionError::InsufficientRepayment {
            venue: pool,
            required: owed,
            received: balance_after.saturating_sub(floor),
        });
    }

    // Fold the fee growth into the borrowed side's reserves.
    let growth = balance_after - balance_before;
    let mut reserves = ledger.reserves(pool)?;
    if asset == descriptor.token0 {
        reserves.reserve0 = reserves.reserve0.saturating_add(growth);
    } else {
        reserves.reserve1 = reserves.reserve1.saturating_add(growth);
    }
    ledger.set_reserves(pool, reserves);

    debug!(pool = %pool, owed = %owed, repaid = %(balance_after - floor), "flash loan settled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::VenueDescriptor;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    /// Receiver that repays a fixed amount out of its own balance.
    struct Repayer {
        repay: U256,
        seen_fee: Option<U256>,
        seen_initiator: Option<Address>,
    }

    impl FlashLoanReceiver for Repayer {
        fn on_flash_loan(
            &mut self,
            ledger: &mut Ledger,
            _venues: &VenueDirectory,
            ctx: CallbackContext,
        ) -> Result<(), ExecutionError> {
            self.seen_fee = ctx.declared_fee;
            self.seen_initiator = ctx.initiator;
            let asset: Address = addr(1);
            let me = addr(10);
            ledger.transfer(asset, me, ctx.caller, self.repay)?;
            Ok(())
        }
    }

    fn world() -> (Ledger, VenueDirectory, Address) {
        let (weth, usdc) = (addr(1), addr(2));
        let pool = addr(5);
        let mut ledger = Ledger::new();
        ledger.seed_pool(
            pool,
            weth,
            U256::from(100_000_000u64),
            usdc,
            U256::from(400_000_000u64),
        );
        // Pre-fund the receiver so it can repay without trading.
        ledger.mint(weth, addr(10), U256::from(10_000_000u64));
        let mut venues = VenueDirectory::new(addr(0xaa));
        venues.register(VenueDescriptor::new(
            pool,
            VenueKind::ConcentratedLiquidity,
            weth,
            usdc,
            500,
        ));
        (ledger, venues, pool)
    }

    #[test]
    fn test_declared_fee_borrow_settles() {
        let (mut ledger, venues, pool) = world();
        let mut receiver = Repayer {
            repay: U256::from(1_000_500u64),
            seen_fee: None,
            seen_initiator: None,
        };
        flash_borrow(
            &mut ledger,
            &venues,
            pool,
            addr(10),
            addr(10),
            addr(1),
            U256::from(1_000_000u64),
            Bytes::new(),
            &mut receiver,
        )
        .unwrap();
        assert_eq!(receiver.seen_fee, Some(U256::from(500u64)));
        assert_eq!(receiver.seen_initiator, None);
        // Pool grew by exactly the fee; reserves follow.
        assert_eq!(
            ledger.balance_of(addr(1), pool),
            U256::from(100_000_500u64)
        );
        assert_eq!(
            ledger.reserves(pool).unwrap().reserve0,
            U256::from(100_000_500u64)
        );
    }

    #[test]
    fn test_short_repayment_fails() {
        let (mut ledger, venues, pool) = world();
        let mut receiver = Repayer {
            repay: U256::from(1_000_499u64),
            seen_fee: None,
            seen_initiator: None,
        };
        let err = flash_borrow(
            &mut ledger,
            &venues,
            pool,
            addr(10),
            addr(10),
            addr(1),
            U256::from(1_000_000u64),
            Bytes::new(),
            &mut receiver,
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::InsufficientRepayment { .. }));
    }

    #[test]
    fn test_initiator_reported_by_constant_product_family() {
        let (weth, usdc) = (addr(1), addr(2));
        let pool = addr(6);
        let mut ledger = Ledger::new();
        ledger.seed_pool(
            pool,
            weth,
            U256::from(100_000_000u64),
            usdc,
            U256::from(400_000_000u64),
        );
        ledger.mint(weth, addr(10), U256::from(10_000_000u64));
        let mut venues = VenueDirectory::new(addr(0xaa));
        venues.register(VenueDescriptor::new(
            pool,
            VenueKind::ConstantProduct,
            weth,
            usdc,
            3000,
        ));

        // floor(1_000_000 * 1000 / 997) + 1 = 1_003_010
        let mut receiver = Repayer {
            repay: U256::from(1_003_010u64),
            seen_fee: None,
            seen_initiator: None,
        };
        flash_borrow(
            &mut ledger,
            &venues,
            pool,
            addr(10),
            addr(77),
            weth,
            U256::from(1_000_000u64),
            Bytes::new(),
            &mut receiver,
        )
        .unwrap();
        assert_eq!(receiver.seen_initiator, Some(addr(77)));
        assert_eq!(receiver.seen_fee, None);
    }

    #[test]
    fn test_asset_not_in_venue() {
        let (mut ledger, venues, pool) = world();
        let mut receiver = Repayer {
            repay: U256::ZERO,
            seen_fee: None,
            seen_initiator: None,
        };
        let err = flash_borrow(
            &mut ledger,
            &venues,
            pool,
            addr(10),
            addr(10),
            addr(9),
            U256::from(1u64),
            Bytes::new(),
            &mut receiver,
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::AssetNotInVenue { .. }));
    }
}
