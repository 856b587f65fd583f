//! Swap-plan payload codec.
//!
//! The plan travels as an opaque byte payload from the planner through the
//! lending venue and back into the engine's callback. The format is an
//! explicit discriminated union: a leading format tag (one byte) followed by
//! the ABI encoding of the hop structs. Nothing is ever inferred from the
//! payload length.
//!
//! Callback headers use the same mechanism: the engine ABI-encodes
//! `CallbackData { asset, amount, plan }` at initiation and decodes it when
//! the venue hands it back.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolValue;
use smallvec::SmallVec;

use crate::errors::ExecutionError;

/// Format tag for a single-hop plan.
pub const PLAN_TAG_SINGLE_HOP: u8 = 1;
/// Format tag for a two-hop plan.
pub const PLAN_TAG_TWO_HOP: u8 = 2;

/// Exchange venue family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VenueKind {
    /// x·y = k pool with the fixed 0.30% (997/1000) fee convention.
    ConstantProduct = 0,
    /// Pool whose fee tier is a first-class parameter (pips over 1e6).
    ConcentratedLiquidity = 1,
    /// Pool routed through an explicit (from, to, stable, factory) hop list.
    StableSwap = 2,
}

impl VenueKind {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Get venue kind from ID.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::ConstantProduct),
            1 => Some(Self::ConcentratedLiquidity),
            2 => Some(Self::StableSwap),
            _ => None,
        }
    }

    /// Parse from a config string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "constant-product" | "constant_product" | "v2" => Some(Self::ConstantProduct),
            "concentrated" | "concentrated-liquidity" | "v3" => Some(Self::ConcentratedLiquidity),
            "stable" | "stable-swap" | "solidly" => Some(Self::StableSwap),
            _ => None,
        }
    }
}

/// How a hop names its venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueRef {
    /// Explicit venue address.
    Direct(Address),
    /// Canonical (tokenA, tokenB, feeTier) triple; the address is derived
    /// deterministically from the factory's CREATE2 scheme.
    Derived {
        token_a: Address,
        token_b: Address,
        fee_tier: u32,
    },
}

/// One leg of a stable-swap route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableLegRoute {
    pub from: Address,
    pub to: Address,
    pub stable: bool,
    pub factory: Address,
}

/// One hop of a swap plan. Immutable once decoded; consumed left-to-right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInstruction {
    pub venue_kind: VenueKind,
    pub venue: VenueRef,
    pub token_in: Address,
    pub token_out: Address,
    /// Carried for wire compatibility; engine-produced plans always set
    /// zero; profitability is enforced globally, never per hop.
    pub min_out: U256,
    /// Stable-swap routing legs; empty for the other venue kinds.
    pub legs: Vec<StableLegRoute>,
}

/// Ordered 1–2 hop swap plan. Exists only for the duration of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub hops: SmallVec<[RouteInstruction; 2]>,
}

// ABI encoding helper types
sol! {
    /// One leg of a stable-swap route.
    #[derive(Debug)]
    struct StableLeg {
        address fromToken;
        address toToken;
        bool stable;
        address factory;
    }

    /// Wire form of one hop.
    #[derive(Debug)]
    struct HopData {
        uint8 venueKind;
        bool derived;
        address venue;
        address tokenA;
        address tokenB;
        uint32 feeTier;
        address tokenIn;
        address tokenOut;
        uint256 minOut;
        StableLeg[] legs;
    }

    /// Body of a plan payload (everything after the format tag).
    #[derive(Debug)]
    struct PlanBody {
        HopData[] hops;
    }

    /// Header handed through the lending venue into the callback.
    #[derive(Debug)]
    struct CallbackData {
        address asset;
        uint256 amount;
        bytes plan;
    }
}

impl SwapPlan {
    pub fn new(hops: SmallVec<[RouteInstruction; 2]>) -> Self {
        Self { hops }
    }

    /// Encode as a tagged payload: format byte, then the ABI body.
    pub fn encode(&self) -> Result<Bytes, ExecutionError> {
        let tag = match self.hops.len() {
            1 => PLAN_TAG_SINGLE_HOP,
            2 => PLAN_TAG_TWO_HOP,
            n => {
                return Err(ExecutionError::PlanDecode(format!(
                    "plan must have 1 or 2 hops, got {n}"
                )))
            }
        };
        let body = PlanBody {
            hops: self.hops.iter().map(hop_to_wire).collect(),
        };
        let mut out = Vec::with_capacity(1 + 32 * 8 * self.hops.len());
        out.push(tag);
        out.extend_from_slice(&body.abi_encode());
        Ok(Bytes::from(out))
    }

    /// Decode a tagged payload. Unknown tags, truncated bodies, and hop
    /// counts that disagree with the tag are all decode failures.
    pub fn decode(payload: &[u8]) -> Result<Self, ExecutionError> {
        let (&tag, body) = payload
            .split_first()
            .ok_or_else(|| ExecutionError::PlanDecode("empty payload".into()))?;
        let expected_hops = match tag {
            PLAN_TAG_SINGLE_HOP => 1,
            PLAN_TAG_TWO_HOP => 2,
            other => {
                return Err(ExecutionError::PlanDecode(format!(
                    "unknown format tag {other}"
                )))
            }
        };
        let body = PlanBody::abi_decode(body, true)
            .map_err(|e| ExecutionError::PlanDecode(e.to_string()))?;
        if body.hops.len() != expected_hops {
            return Err(ExecutionError::PlanDecode(format!(
                "tag {tag} promises {expected_hops} hops, body has {}",
                body.hops.len()
            )));
        }
        let hops = body
            .hops
            .iter()
            .map(hop_from_wire)
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(Self { hops })
    }
}

fn hop_to_wire(hop: &RouteInstruction) -> HopData {
    let (derived, venue, token_a, token_b, fee_tier) = match hop.venue {
        VenueRef::Direct(addr) => (false, addr, Address::ZERO, Address::ZERO, 0u32),
        VenueRef::Derived {
            token_a,
            token_b,
            fee_tier,
        } => (true, Address::ZERO, token_a, token_b, fee_tier),
    };
    HopData {
        venueKind: hop.venue_kind.id(),
        derived,
        venue,
        tokenA: token_a,
        tokenB: token_b,
        feeTier: fee_tier,
        tokenIn: hop.token_in,
        tokenOut: hop.token_out,
        minOut: hop.min_out,
        legs: hop
            .legs
            .iter()
            .map(|leg| StableLeg {
                fromToken: leg.from,
                toToken: leg.to,
                stable: leg.stable,
                factory: leg.factory,
            })
            .collect(),
    }
}

fn hop_from_wire(hop: &HopData) -> Result<RouteInstruction, ExecutionError> {
    let venue_kind = VenueKind::from_id(hop.venueKind)
        .ok_or_else(|| ExecutionError::PlanDecode(format!("unknown venue kind {}", hop.venueKind)))?;
    let venue = if hop.derived {
        VenueRef::Derived {
            token_a: hop.tokenA,
            token_b: hop.tokenB,
            fee_tier: hop.feeTier,
        }
    } else {
        VenueRef::Direct(hop.venue)
    };
    Ok(RouteInstruction {
        venue_kind,
        venue,
        token_in: hop.tokenIn,
        token_out: hop.tokenOut,
        min_out: hop.minOut,
        legs: hop
            .legs
            .iter()
            .map(|leg| StableLegRoute {
                from: leg.fromToken,
                to: leg.toToken,
                stable: leg.stable,
                factory: leg.factory,
            })
            .collect(),
    })
}

/// Encode the callback header carried through the lending venue.
pub fn encode_callback_data(asset: Address, amount: U256, plan: Bytes) -> Bytes {
    Bytes::from(
        CallbackData {
            asset,
            amount,
            plan,
        }
        .abi_encode(),
    )
}

/// Decode the callback header. Produced by this engine at initiation, so a
/// failure here means the venue corrupted the passthrough.
pub fn decode_callback_data(data: &[u8]) -> Result<(Address, U256, Bytes), ExecutionError> {
    let decoded = CallbackData::abi_decode(data, true)
        .map_err(|e| ExecutionError::PlanDecode(e.to_string()))?;
    Ok((decoded.asset, decoded.amount, decoded.plan))
}

/// Builder for assembling swap plans.
///
/// Provides a fluent API mirroring the shapes the planner produces.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    hops: SmallVec<[RouteInstruction; 2]>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant-product hop through an explicit pool address.
    pub fn constant_product_hop(mut self, pool: Address, token_in: Address, token_out: Address) -> Self {
        self.hops.push(RouteInstruction {
            venue_kind: VenueKind::ConstantProduct,
            venue: VenueRef::Direct(pool),
            token_in,
            token_out,
            min_out: U256::ZERO,
            legs: Vec::new(),
        });
        self
    }

    /// Add a concentrated-liquidity hop addressed by its canonical
    /// (tokenA, tokenB, feeTier) triple.
    pub fn concentrated_hop(
        mut self,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
    ) -> Self {
        self.hops.push(RouteInstruction {
            venue_kind: VenueKind::ConcentratedLiquidity,
            venue: VenueRef::Derived {
                token_a: token_in,
                token_b: token_out,
                fee_tier,
            },
            token_in,
            token_out,
            min_out: U256::ZERO,
            legs: Vec::new(),
        });
        self
    }

    /// Add a stable-swap hop with its explicit routing legs.
    pub fn stable_hop(
        mut self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        legs: Vec<StableLegRoute>,
    ) -> Self {
        self.hops.push(RouteInstruction {
            venue_kind: VenueKind::StableSwap,
            venue: VenueRef::Direct(pool),
            token_in,
            token_out,
            min_out: U256::ZERO,
            legs,
        });
        self
    }

    pub fn build(self) -> SwapPlan {
        SwapPlan { hops: self.hops }
    }
}
