//! Failure taxonomy for flash-loan executions.
//!
//! Every variant is fatal to the attempt: the engine discards the scratch
//! ledger and the live state stays untouched. Nothing here is retried or
//! partially committed.

use alloy::primitives::Address;
use thiserror::Error;

use crate::plan::VenueKind;

/// Execution failure.
///
/// Shared between the host-state layer (venues, ledger, codec) and the
/// execution engine, so that a single `?` chain runs from an adapter swap
/// all the way up to the initiating call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Privileged operation attempted by a non-authority caller.
    #[error("caller {0} is not the authority")]
    CallerNotAuthorized(Address),

    /// Callback arrived from an identity other than the recorded lending venue.
    #[error("callback origin {got} does not match recorded lending venue {expected}")]
    InvalidCallbackOrigin { expected: Address, got: Address },

    /// Callback initiator argument does not match the engine's own identity.
    #[error("callback initiator {0} is not this engine")]
    SpoofedInitiator(Address),

    /// Requested borrow asset matches neither side of the lending venue.
    #[error("asset {asset} is not held by venue {venue}")]
    AssetNotInVenue { venue: Address, asset: Address },

    /// Lending venue balance was not restored to principal plus fee.
    #[error("venue {venue} repayment short: required {required}, received {received}")]
    InsufficientRepayment {
        venue: Address,
        required: alloy::primitives::U256,
        received: alloy::primitives::U256,
    },

    /// Post-repayment balance fell below the pre-loan balance.
    #[error("execution ended below the pre-loan balance")]
    NoProfit,

    /// Surplus exists but is under the configured minimum.
    #[error("profit {profit} below threshold {threshold}")]
    ProfitBelowThreshold {
        profit: alloy::primitives::U256,
        threshold: alloy::primitives::U256,
    },

    /// Asset transfer signalled failure (explicit false return).
    #[error("transfer of asset {0} failed")]
    TransferFailed(Address),

    /// Zero-address authority or recipient.
    #[error("zero address is not a valid target")]
    InvalidTarget,

    /// Address resolves to no registered venue, or its registered kind
    /// disagrees with the route's declared kind.
    #[error("address {0} is not a registered venue of the expected kind")]
    UnknownVenue(Address),

    /// No adapter is registered for a venue kind named by the plan.
    #[error("no adapter registered for venue kind {0:?}")]
    AdapterUnavailable(VenueKind),

    /// Loan initiation attempted while an execution is already in flight.
    #[error("execution already in flight")]
    ReentrantExecution,

    /// Callback received with no active loan session.
    #[error("no active loan session")]
    NoActiveSession,

    /// Swap-plan payload failed to decode.
    #[error("swap plan decode failed: {0}")]
    PlanDecode(String),

    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Pool cannot cover the requested output.
    #[error("pool {0} has insufficient liquidity")]
    InsufficientLiquidity(Address),

    /// Holder balance or allowance cannot cover the requested amount.
    #[error("insufficient balance of asset {asset} for {holder}")]
    InsufficientBalance { asset: Address, holder: Address },
}
