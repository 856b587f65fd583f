//! Fee and profit arithmetic.
//!
//! Pure checked U256 helpers; monetary amounts never wrap silently.

use alloy::primitives::U256;
use flashbot_venues::ExecutionError;

/// Default fixed-rate flash fee numerator (0.30%).
pub const DEFAULT_FLASH_FEE_NUMERATOR: u64 = 3;
/// Default fixed-rate flash fee denominator.
pub const DEFAULT_FLASH_FEE_DENOMINATOR: u64 = 1000;

/// Repayment under the fixed-rate fee model:
/// `floor(amount · den / (den − num)) + 1`.
///
/// The `+1` bias guarantees the repayment never under-shoots the venue's
/// demand through integer truncation. For the 0.30% convention this is
/// `floor(amount · 1000 / 997) + 1`.
#[inline]
pub fn fixed_rate_repayment(
    amount: U256,
    fee_numerator: u64,
    fee_denominator: u64,
) -> Result<U256, ExecutionError> {
    if fee_numerator >= fee_denominator {
        return Err(ExecutionError::ArithmeticOverflow("fee rate"));
    }
    let spread = U256::from(fee_denominator - fee_numerator);
    let scaled = amount
        .checked_mul(U256::from(fee_denominator))
        .ok_or(ExecutionError::ArithmeticOverflow("repayment scaling"))?;
    (scaled / spread)
        .checked_add(U256::from(1u64))
        .ok_or(ExecutionError::ArithmeticOverflow("repayment bias"))
}

/// Repayment under the declared-fee model: principal plus the fee the venue
/// itself reported in the callback.
#[inline]
pub fn declared_fee_repayment(amount: U256, fee: U256) -> Result<U256, ExecutionError> {
    amount
        .checked_add(fee)
        .ok_or(ExecutionError::ArithmeticOverflow("declared fee"))
}

/// Surplus of an execution: `balance_after − balance_before`, failing with
/// `NoProfit` instead of wrapping when the execution ended underwater.
#[inline]
pub fn checked_profit(balance_after: U256, balance_before: U256) -> Result<U256, ExecutionError> {
    if balance_after < balance_before {
        return Err(ExecutionError::NoProfit);
    }
    // Safe: the comparison above rules out underflow.
    Ok(balance_after - balance_before)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rate_repayment_exact() {
        // floor(1_000_000 * 1000 / 997) + 1 = 1_003_010
        let owed = fixed_rate_repayment(
            U256::from(1_000_000u64),
            DEFAULT_FLASH_FEE_NUMERATOR,
            DEFAULT_FLASH_FEE_DENOMINATOR,
        )
        .unwrap();
        assert_eq!(owed, U256::from(1_003_010u64));
    }

    #[test]
    fn test_fixed_rate_bias_never_undershoots() {
        // Even a 1-wei borrow owes at least 1 wei of fee headroom.
        let owed = fixed_rate_repayment(U256::from(1u64), 3, 1000).unwrap();
        assert_eq!(owed, U256::from(2u64));
    }

    #[test]
    fn test_fixed_rate_rejects_degenerate_rate() {
        let err = fixed_rate_repayment(U256::from(1u64), 1000, 1000).unwrap_err();
        assert!(matches!(err, ExecutionError::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_fixed_rate_overflow_detected() {
        let err = fixed_rate_repayment(U256::MAX, 3, 1000).unwrap_err();
        assert!(matches!(err, ExecutionError::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_declared_fee_repayment() {
        let owed =
            declared_fee_repayment(U256::from(1_000_000u64), U256::from(500u64)).unwrap();
        assert_eq!(owed, U256::from(1_000_500u64));
        assert!(declared_fee_repayment(U256::MAX, U256::from(1u64)).is_err());
    }

    #[test]
    fn test_checked_profit() {
        let profit =
            checked_profit(U256::from(1_002_000u64), U256::from(1_000_000u64)).unwrap();
        assert_eq!(profit, U256::from(2_000u64));
        assert_eq!(
            checked_profit(U256::from(1u64), U256::from(2u64)).unwrap_err(),
            ExecutionError::NoProfit
        );
    }
}
