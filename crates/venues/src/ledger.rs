//! Transactional host-state ledger.
//!
//! All mutable chain-shaped state lives here: per-holder asset balances,
//! spend allowances, pool reserves, and per-asset transfer semantics. The
//! engine never mutates live state directly during an execution: it forks
//! the ledger, runs the whole borrow/swap/repay sequence against the scratch
//! copy, and commits the scratch only when every invariant holds. Dropping
//! the scratch is the rollback.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};

use crate::errors::ExecutionError;

/// How an asset's transfer primitive reports its result.
///
/// Not every token follows the conventional bool-returning interface; the
/// two deviant styles here are the ones the engine must tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferStyle {
    /// Returns `true` on success, reverts on failure.
    #[default]
    Standard,
    /// Returns no value at all; absence of a revert means success.
    NoReturn,
    /// Returns `false` on failure instead of reverting.
    ReturnsFalse,
}

impl TransferStyle {
    /// Parse from a config string.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "no-return" | "no_return" | "noreturn" => Self::NoReturn,
            "returns-false" | "returns_false" | "returnsfalse" => Self::ReturnsFalse,
            _ => Self::Standard,
        }
    }
}

/// Observable result of a transfer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Explicit success return.
    Succeeded,
    /// No return value; callers must treat this as success.
    NoReturnValue,
    /// Explicit `false`; callers must treat this as failure.
    ReturnedFalse,
}

impl TransferOutcome {
    /// Whether the outcome is to be taken as success.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::ReturnedFalse)
    }
}

/// Reserve pair of a pool, in the pool's canonical token order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolReserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

/// Host balance/allowance/reserve state.
///
/// `fork()` yields an independent scratch copy; committing is a plain
/// assignment over the live ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// (asset, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (asset, owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// pool -> reserves
    reserves: HashMap<Address, PoolReserves>,
    /// asset -> transfer reporting style
    transfer_styles: HashMap<Address, TransferStyle>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fork an independent scratch copy of the full state.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Declare an asset's transfer reporting style. Unregistered assets
    /// behave as [`TransferStyle::Standard`].
    pub fn register_asset(&mut self, asset: Address, style: TransferStyle) {
        self.transfer_styles.insert(asset, style);
    }

    /// Current balance of `holder` in `asset` (zero if never credited).
    pub fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Credit `holder` with `amount` of `asset` (host-level seeding).
    pub fn mint(&mut self, asset: Address, holder: Address, amount: U256) {
        let entry = self.balances.entry((asset, holder)).or_insert(U256::ZERO);
        *entry = entry.saturating_add(amount);
    }

    /// Seed a pool's reserves and matching balances in one step.
    pub fn seed_pool(
        &mut self,
        pool: Address,
        token0: Address,
        reserve0: U256,
        token1: Address,
        reserve1: U256,
    ) {
        self.mint(token0, pool, reserve0);
        self.mint(token1, pool, reserve1);
        self.reserves.insert(pool, PoolReserves { reserve0, reserve1 });
    }

    /// Reserves of `pool`, or an unknown-venue failure if never seeded.
    pub fn reserves(&self, pool: Address) -> Result<PoolReserves, ExecutionError> {
        self.reserves
            .get(&pool)
            .copied()
            .ok_or(ExecutionError::UnknownVenue(pool))
    }

    /// Overwrite `pool`'s reserves after a swap or flash settlement.
    pub fn set_reserves(&mut self, pool: Address, reserves: PoolReserves) {
        self.reserves.insert(pool, reserves);
    }

    /// Grant `spender` an allowance over `owner`'s `asset`.
    pub fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((asset, owner, spender), amount);
    }

    /// Remaining allowance for (`asset`, `owner`, `spender`).
    pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Move `amount` of `asset` from `from` to `to`, honoring the asset's
    /// declared transfer style.
    ///
    /// A `ReturnsFalse` asset reports shortfalls as
    /// [`TransferOutcome::ReturnedFalse`] instead of failing the call; the
    /// other styles revert with `InsufficientBalance`.
    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferOutcome, ExecutionError> {
        let style = self
            .transfer_styles
            .get(&asset)
            .copied()
            .unwrap_or_default();
        let from_balance = self.balance_of(asset, from);
        if from_balance < amount {
            return match style {
                TransferStyle::ReturnsFalse => Ok(TransferOutcome::ReturnedFalse),
                _ => Err(ExecutionError::InsufficientBalance {
                    asset,
                    holder: from,
                }),
            };
        }
        self.balances.insert((asset, from), from_balance - amount);
        let to_balance = self.balance_of(asset, to);
        self.balances
            .insert((asset, to), to_balance.saturating_add(amount));
        Ok(match style {
            TransferStyle::Standard | TransferStyle::ReturnsFalse => TransferOutcome::Succeeded,
            TransferStyle::NoReturn => TransferOutcome::NoReturnValue,
        })
    }

    /// Spend `owner`'s `asset` through an allowance held by `spender`.
    ///
    /// Decrements the allowance unless it is `U256::MAX` (the customary
    /// unlimited approval).
    pub fn transfer_from(
        &mut self,
        asset: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferOutcome, ExecutionError> {
        let allowed = self.allowance(asset, owner, spender);
        if allowed < amount {
            return Err(ExecutionError::InsufficientBalance {
                asset,
                holder: owner,
            });
        }
        if allowed != U256::MAX {
            self.allowances
                .insert((asset, owner, spender), allowed - amount);
        }
        self.transfer(asset, owner, to, amount)
    }
}
