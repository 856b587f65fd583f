//! Flash-loan arbitrage engine.
//!
//! This crate contains the orchestration layer:
//!
//! - `engine` - the execution engine and its loan callback
//! - `session` - single-flight loan session tracking
//! - `authority` - caller authorization
//! - `math` - repayment and profit arithmetic
//! - `audit` - execution journal
//! - `config` - TOML/env configuration
//!
//! Venue semantics (ledger, adapters, plan codec, lending) live in
//! `flashbot-venues`.

pub mod audit;
pub mod authority;
pub mod config;
pub mod engine;
pub mod math;
pub mod session;

pub use audit::{AuditRecord, Journal};
pub use authority::AuthorityGate;
pub use config::{AssetConfig, EngineConfig, VenueEntry, CONFIG_ENV};
pub use engine::{ExecutionEngine, World};
pub use session::{LoanSession, SessionSlot, SessionStatus};

pub use flashbot_venues::ExecutionError;
