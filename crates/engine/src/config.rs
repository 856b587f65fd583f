//! Engine configuration.
//!
//! TOML-backed configuration for the engine identity, authority, profit
//! threshold, fee convention, and the venue/asset registries. Every field
//! has a default so a bare config file (or none at all) still yields a
//! runnable simulated deployment.

use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use flashbot_venues::{
    Ledger, TransferStyle, VenueDescriptor, VenueDirectory, VenueKind, POOL_INIT_CODE_HASH,
};

/// Environment variable naming a config file path.
pub const CONFIG_ENV: &str = "FLASHBOT_CONFIG";

/// Main configuration structure for the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The engine's own identity (flash-loan recipient and swap holder).
    #[serde(default = "default_engine_address")]
    pub engine_address: Address,

    /// The single identity permitted to initiate and administer.
    #[serde(default = "default_authority")]
    pub authority: Address,

    /// Minimum surplus below which an execution is forced to fail.
    #[serde(default)]
    pub min_profit_threshold: U256,

    /// Fixed-rate flash fee numerator (0.30% convention: 3).
    #[serde(default = "default_fee_numerator")]
    pub flash_fee_numerator: u64,

    /// Fixed-rate flash fee denominator (0.30% convention: 1000).
    #[serde(default = "default_fee_denominator")]
    pub flash_fee_denominator: u64,

    /// Factory whose CREATE2 scheme derives concentrated pool addresses.
    #[serde(default = "default_factory")]
    pub factory: Address,

    /// Init code template hash for pool address derivation.
    #[serde(default = "default_init_code_hash")]
    pub pool_init_code_hash: B256,

    /// Known assets and their transfer semantics.
    #[serde(default)]
    pub assets: Vec<AssetConfig>,

    /// Registered venues.
    #[serde(default)]
    pub venues: Vec<VenueEntry>,
}

fn default_engine_address() -> Address {
    Address::repeat_byte(0xe1)
}

fn default_authority() -> Address {
    Address::repeat_byte(0xa1)
}

fn default_fee_numerator() -> u64 {
    3
}

fn default_fee_denominator() -> u64 {
    1000
}

fn default_factory() -> Address {
    // Canonical concentrated-liquidity factory on Base.
    "0x33128a8fC17869897dcE68Ed026d694621f6FDfD".parse().unwrap()
}

fn default_init_code_hash() -> B256 {
    POOL_INIT_CODE_HASH
}

/// One known asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub address: Address,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// "standard", "no-return", or "returns-false".
    #[serde(default)]
    pub transfer_style: String,
}

fn default_decimals() -> u8 {
    18
}

/// One registered venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueEntry {
    pub address: Address,
    /// "constant-product", "concentrated", or "stable".
    pub kind: String,
    pub token0: Address,
    pub token1: Address,
    #[serde(default = "default_fee_tier")]
    pub fee_tier: u32,
    #[serde(default)]
    pub stable: bool,
}

fn default_fee_tier() -> u32 {
    3000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_address: default_engine_address(),
            authority: default_authority(),
            min_profit_threshold: U256::ZERO,
            flash_fee_numerator: default_fee_numerator(),
            flash_fee_denominator: default_fee_denominator(),
            factory: default_factory(),
            pool_init_code_hash: default_init_code_hash(),
            assets: Vec::new(),
            venues: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn from_path(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {path}"))
    }

    /// Load from the path named by `FLASHBOT_CONFIG`, falling back to
    /// defaults when unset or unreadable.
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => match Self::from_path(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path, error = %e, "config load failed, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Log a one-line summary of the loaded configuration.
    pub fn log_config(&self) {
        info!(
            engine = %self.engine_address,
            authority = %self.authority,
            min_profit = %self.min_profit_threshold,
            fee = format!("{}/{}", self.flash_fee_numerator, self.flash_fee_denominator),
            venues = self.venues.len(),
            assets = self.assets.len(),
            "engine configuration loaded"
        );
    }

    /// Build the venue directory from the configured entries.
    pub fn venue_directory(&self) -> Result<VenueDirectory> {
        let mut directory =
            VenueDirectory::new(self.factory).with_init_code_hash(self.pool_init_code_hash);
        for entry in &self.venues {
            let kind = VenueKind::from_str(&entry.kind)
                .with_context(|| format!("unknown venue kind '{}'", entry.kind))?;
            directory.register(
                VenueDescriptor::new(entry.address, kind, entry.token0, entry.token1, entry.fee_tier)
                    .with_stable(entry.stable),
            );
        }
        Ok(directory)
    }

    /// Register the configured assets' transfer semantics on a ledger.
    pub fn register_assets(&self, ledger: &mut Ledger) {
        for asset in &self.assets {
            ledger.register_asset(asset.address, TransferStyle::from_str(&asset.transfer_style));
        }
    }
}
