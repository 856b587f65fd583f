//! Flashbot venue layer.
//!
//! This crate provides:
//! - The transactional host-state ledger (balances, allowances, reserves,
//!   transfer semantics) with fork/commit discipline
//! - The tagged swap-plan payload codec and callback header codec
//! - Venue descriptors, the configured venue directory, and CREATE2 pool
//!   address derivation
//! - Exchange adapters for the three venue kinds behind a common registry
//! - Flash-loan borrowing with the nested synchronous callback
//!
//! The execution engine lives in `flashbot-engine` and drives everything
//! here through the `FlashLoanReceiver` callback.

mod adapter;
mod derive;
mod directory;
mod errors;
mod ledger;
mod lending;
mod plan;

pub use adapter::{
    AdapterRegistry, ConcentratedLiquidityAdapter, ConstantProductAdapter, StableSwapAdapter,
    VenueAdapter,
};
pub use adapter::{concentrated, constant_product, stable_swap};
pub use derive::{compute_pool_address, sort_tokens, POOL_INIT_CODE_HASH};
pub use directory::{VenueDescriptor, VenueDirectory};
pub use errors::ExecutionError;
pub use ledger::{Ledger, PoolReserves, TransferOutcome, TransferStyle};
pub use lending::{flash_borrow, CallbackContext, FlashLoanReceiver};
pub use plan::{
    decode_callback_data, encode_callback_data, PlanBuilder, RouteInstruction, StableLegRoute,
    SwapPlan, VenueKind, VenueRef, PLAN_TAG_SINGLE_HOP, PLAN_TAG_TWO_HOP,
};
