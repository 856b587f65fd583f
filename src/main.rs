//! Flashbot Arbitrage Engine
//!
//! Dry-run driver for the flash-loan arbitrage engine.
//! Features:
//! - Single-transaction flash-loan execution with atomic commit/abort
//! - Tagged swap-plan codec over ABI-encoded hop data
//! - Venue adapters for constant-product, concentrated and stable pools
//! - Authority-gated admin surface with an execution journal

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flashbot_engine::{EngineConfig, ExecutionEngine, World};
use flashbot_venues::{Ledger, PlanBuilder, VenueDescriptor, VenueKind};

fn main() -> Result<()> {
    // Print startup banner
    print_banner();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flashbot_engine=debug,flashbot_venues=debug")),
        )
        .init();

    // Load engine config (FLASHBOT_CONFIG selects a TOML file; defaults otherwise)
    let config = EngineConfig::from_env();
    config.log_config();

    info!("Starting flashbot dry run");

    let mut engine = ExecutionEngine::from_config(&config);
    let mut world = build_world(&config)?;

    run_demo(&mut engine, &mut world, &config)?;

    // Dump the journal for inspection
    let journal = engine.journal();
    if !journal.is_empty() {
        println!("{}", journal.to_json_lines()?);
    }

    Ok(())
}

/// Build the simulated world from configuration, seeding demo liquidity
/// when the config carries no venues of its own.
fn build_world(config: &EngineConfig) -> Result<World> {
    let mut ledger = Ledger::new();
    config.register_assets(&mut ledger);
    let venues = config.venue_directory().context("building venue directory")?;
    let mut world = World::new(ledger, venues);

    if config.venues.is_empty() {
        seed_demo_liquidity(&mut world, config);
    }

    Ok(world)
}

/// Two skewed constant-product pools plus a concentrated lender, priced so
/// the WETH -> USDC -> WETH round trip clears the fee bill.
fn seed_demo_liquidity(world: &mut World, config: &EngineConfig) {
    let weth = Address::repeat_byte(0x11);
    let usdc = Address::repeat_byte(0x22);
    let lender = Address::repeat_byte(0x51);
    let pool_a = Address::repeat_byte(0x52);
    let pool_b = Address::repeat_byte(0x53);

    world.ledger.seed_pool(
        lender,
        weth,
        U256::from(50_000_000u64),
        usdc,
        U256::from(200_000_000u64),
    );
    world.ledger.seed_pool(
        pool_a,
        weth,
        U256::from(100_000_000u64),
        usdc,
        U256::from(400_000_000u64),
    );
    world.ledger.seed_pool(
        pool_b,
        weth,
        U256::from(100_000_000u64),
        usdc,
        U256::from(300_000_000u64),
    );

    world.venues.register(VenueDescriptor::new(
        lender,
        VenueKind::ConcentratedLiquidity,
        weth,
        usdc,
        500,
    ));
    world.venues.register(VenueDescriptor::new(
        pool_a,
        VenueKind::ConstantProduct,
        weth,
        usdc,
        3000,
    ));
    world.venues.register(VenueDescriptor::new(
        pool_b,
        VenueKind::ConstantProduct,
        weth,
        usdc,
        3000,
    ));

    info!(
        lender = %lender,
        pool_a = %pool_a,
        pool_b = %pool_b,
        authority = %config.authority,
        "demo liquidity seeded"
    );
}

/// One full borrow-swap-repay attempt against the demo world. Runs only
/// when no venues are configured; a configured deployment has no demo
/// liquidity behind the hardcoded addresses.
fn run_demo(engine: &mut ExecutionEngine, world: &mut World, config: &EngineConfig) -> Result<()> {
    if !config.venues.is_empty() {
        info!(
            venues = config.venues.len(),
            "configured venues registered, skipping demo attempt"
        );
        return Ok(());
    }

    let weth = Address::repeat_byte(0x11);
    let usdc = Address::repeat_byte(0x22);
    let lender = Address::repeat_byte(0x51);
    let pool_a = Address::repeat_byte(0x52);
    let pool_b = Address::repeat_byte(0x53);
    let authority = config.authority;

    // The adapters pull the engine's funds via allowances, like ERC-20 routers.
    engine
        .approve_venue(authority, world, weth, pool_a, U256::MAX)
        .context("approving pool A")?;
    engine
        .approve_venue(authority, world, usdc, pool_b, U256::MAX)
        .context("approving pool B")?;

    let payload = PlanBuilder::new()
        .constant_product_hop(pool_a, weth, usdc)
        .constant_product_hop(pool_b, usdc, weth)
        .build()
        .encode()
        .context("encoding swap plan")?;

    let amount = U256::from(1_000_000u64);
    match engine.initiate_arbitrage(authority, world, lender, weth, amount, payload) {
        Ok(record) => {
            info!(
                profit = %record.profit,
                fee = %record.fee_paid,
                "arbitrage committed"
            );
        }
        Err(e) => {
            info!(error = %e, "arbitrage aborted, ledger untouched");
        }
    }

    info!(
        engine_weth = %world.ledger.balance_of(weth, engine.address()),
        lender_weth = %world.ledger.balance_of(weth, lender),
        "final balances"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashbot_engine::VenueEntry;

    #[test]
    fn test_demo_skipped_when_venues_configured() {
        let config = EngineConfig {
            venues: vec![VenueEntry {
                address: Address::repeat_byte(5),
                kind: "concentrated".into(),
                token0: Address::repeat_byte(1),
                token1: Address::repeat_byte(2),
                fee_tier: 500,
                stable: false,
            }],
            ..Default::default()
        };
        let mut engine = ExecutionEngine::from_config(&config);
        let mut world = build_world(&config).unwrap();

        // The configured venue must not be shadowed by demo liquidity, and
        // the driver must not touch the hardcoded demo addresses.
        run_demo(&mut engine, &mut world, &config).unwrap();
        assert!(engine.journal().is_empty());
        assert!(world
            .ledger
            .reserves(Address::repeat_byte(0x52))
            .is_err());
    }

    #[test]
    fn test_demo_world_attempt_commits() {
        let config = EngineConfig::default();
        let mut engine = ExecutionEngine::from_config(&config);
        let mut world = build_world(&config).unwrap();
        run_demo(&mut engine, &mut world, &config).unwrap();
        assert_eq!(engine.journal().len(), 1);
    }
}

/// Print startup banner.
fn print_banner() {
    println!(
        r#"
    ╔═╗┬  ┌─┐┌─┐┬ ┬┌┐ ┌─┐┌┬┐
    ╠╣ │  ├─┤└─┐├─┤├┴┐│ │ │
    ╚  ┴─┘┴ ┴└─┘┴ ┴└─┘└─┘ ┴
    Arbitrage Engine v0.1.0
    "#
    );
}
