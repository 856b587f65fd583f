//! Deterministic pool address derivation.
//!
//! Concentrated-liquidity venues are addressed without any lookup call: the
//! factory deploys pools with CREATE2, so the address is a pure function of
//! the canonically ordered token pair, the fee tier, and the factory's
//! init-code template hash. A stale template hash does not crash anything;
//! it derives an address with no venue behind it, which surfaces later as
//! an unknown-venue failure.

use alloy::primitives::{b256, keccak256, Address, B256, U256};
use alloy::sol_types::SolValue;

/// Canonical pool init code hash used by the factory's CREATE2 template.
pub const POOL_INIT_CODE_HASH: B256 =
    b256!("e34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54");

/// Order a token pair canonically: lower address first.
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Derive a pool address from its (tokenA, tokenB, feeTier) triple.
///
/// `salt = keccak256(abi.encode(token0, token1, fee))`;
/// `address = keccak256(0xff ‖ factory ‖ salt ‖ initCodeHash)[12..]`.
pub fn compute_pool_address(
    factory: Address,
    token_a: Address,
    token_b: Address,
    fee_tier: u32,
    init_code_hash: B256,
) -> Address {
    let (token0, token1) = sort_tokens(token_a, token_b);
    // uint24 occupies a full word under abi.encode, so encoding the fee as
    // uint256 is byte-identical to the factory's salt preimage.
    let salt = keccak256((token0, token1, U256::from(fee_tier)).abi_encode());

    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(factory.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..85].copy_from_slice(init_code_hash.as_slice());
    Address::from_slice(&keccak256(preimage)[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_usdc_weth_pool() {
        // Canonical 0.30% USDC/WETH pool on Ethereum mainnet.
        let factory: Address = "0x1F98431c8aD98523631AE4a59f267346ea31F984".parse().unwrap();
        let usdc: Address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap();
        let weth: Address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".parse().unwrap();
        let expected: Address = "0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8".parse().unwrap();

        let derived = compute_pool_address(factory, usdc, weth, 3000, POOL_INIT_CODE_HASH);
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_order_invariant() {
        let factory = Address::repeat_byte(0xaa);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_eq!(
            compute_pool_address(factory, a, b, 500, POOL_INIT_CODE_HASH),
            compute_pool_address(factory, b, a, 500, POOL_INIT_CODE_HASH),
        );
        assert_eq!(sort_tokens(b, a), (a, b));
    }

    #[test]
    fn test_fee_tier_changes_address() {
        let factory = Address::repeat_byte(0xaa);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_ne!(
            compute_pool_address(factory, a, b, 500, POOL_INIT_CODE_HASH),
            compute_pool_address(factory, a, b, 3000, POOL_INIT_CODE_HASH),
        );
    }
}
