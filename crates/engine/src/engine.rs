//! Flash-loan arbitrage execution engine.
//!
//! The engine is the borrower half of a flash loan: it initiates the loan,
//! receives the venue's nested synchronous callback, decodes the swap plan,
//! drives the venue adapters hop by hop, repays principal plus fee, and
//! enforces the profit invariant. Execution runs entirely against a scratch
//! fork of the host ledger; the fork is committed only when every gate has
//! passed, so a failed attempt is indistinguishable from nothing having
//! happened.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use flashbot_venues::{
    decode_callback_data, encode_callback_data, flash_borrow, AdapterRegistry, CallbackContext,
    ExecutionError, FlashLoanReceiver, Ledger, SwapPlan, VenueDirectory,
};

use crate::audit::{AuditRecord, Journal};
use crate::authority::AuthorityGate;
use crate::config::EngineConfig;
use crate::math;
use crate::session::{LoanSession, SessionSlot};

/// Live host state the engine executes against.
#[derive(Debug)]
pub struct World {
    pub ledger: Ledger,
    pub venues: VenueDirectory,
}

impl World {
    pub fn new(ledger: Ledger, venues: VenueDirectory) -> Self {
        Self { ledger, venues }
    }
}

/// The execution engine.
pub struct ExecutionEngine {
    /// The engine's own identity: loan recipient and swap holder.
    address: Address,
    gate: AuthorityGate,
    min_profit_threshold: U256,
    flash_fee_numerator: u64,
    flash_fee_denominator: u64,
    adapters: AdapterRegistry,
    session: SessionSlot,
    journal: Arc<Journal>,
    /// Audit record staged by a successful callback, published on commit.
    pending_audit: Option<AuditRecord>,
}

impl ExecutionEngine {
    /// Create an engine with the standard adapter set.
    pub fn new(address: Address, authority: Address) -> Self {
        Self {
            address,
            gate: AuthorityGate::new(authority),
            min_profit_threshold: U256::ZERO,
            flash_fee_numerator: math::DEFAULT_FLASH_FEE_NUMERATOR,
            flash_fee_denominator: math::DEFAULT_FLASH_FEE_DENOMINATOR,
            adapters: AdapterRegistry::standard(),
            session: SessionSlot::new(),
            journal: Arc::new(Journal::new()),
            pending_audit: None,
        }
    }

    /// Build an engine from configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.engine_address, config.authority)
            .with_min_profit(config.min_profit_threshold)
            .with_fee_rate(config.flash_fee_numerator, config.flash_fee_denominator)
    }

    /// Set the minimum profit threshold.
    pub fn with_min_profit(mut self, threshold: U256) -> Self {
        self.min_profit_threshold = threshold;
        self
    }

    /// Set the fixed-rate fee convention.
    pub fn with_fee_rate(mut self, numerator: u64, denominator: u64) -> Self {
        self.flash_fee_numerator = numerator;
        self.flash_fee_denominator = denominator;
        self
    }

    /// Share a journal with other components.
    pub fn with_journal(mut self, journal: Arc<Journal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn authority(&self) -> Address {
        self.gate.authority()
    }

    pub fn min_profit_threshold(&self) -> U256 {
        self.min_profit_threshold
    }

    pub fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }

    /// Initiate a flash-loan arbitrage attempt.
    ///
    /// Synchronous and atomic: by the time this returns, the whole
    /// borrow → callback → swap → repay sequence has either fully committed
    /// to the live ledger or left it untouched.
    #[instrument(skip(self, world, plan_payload), fields(venue = %lending_venue, asset = %asset))]
    pub fn initiate_arbitrage(
        &mut self,
        caller: Address,
        world: &mut World,
        lending_venue: Address,
        asset: Address,
        amount: U256,
        plan_payload: Bytes,
    ) -> Result<AuditRecord, ExecutionError> {
        self.gate.ensure(caller)?;

        let (token0, token1) = world.venues.asset_pair(lending_venue)?;
        if asset != token0 && asset != token1 {
            return Err(ExecutionError::AssetNotInVenue {
                venue: lending_venue,
                asset,
            });
        }

        // Occupying the slot is also the engine-wide reentrancy guard.
        self.session
            .begin(LoanSession::new(lending_venue, asset, amount, caller))?;
        info!(amount = %amount, "initiating flash loan");

        // The plan payload is passed through untouched; it is only decoded
        // inside the callback.
        let callback_data = encode_callback_data(asset, amount, plan_payload);
        let mut scratch = world.ledger.fork();
        let result = flash_borrow(
            &mut scratch,
            &world.venues,
            lending_venue,
            self.address,
            self.address,
            asset,
            amount,
            callback_data,
            self,
        );

        // Invalidate the session on every exit path.
        self.session.clear();

        match result {
            Ok(()) => {
                let record = self
                    .pending_audit
                    .take()
                    // Set by every successful callback; absence means the
                    // venue skipped the callback entirely.
                    .ok_or(ExecutionError::NoActiveSession)?;
                world.ledger = scratch;
                self.journal.record(&record);
                Ok(record)
            }
            Err(e) => {
                self.pending_audit = None;
                warn!(error = %e, "execution aborted, scratch state discarded");
                Err(e)
            }
        }
    }

    /// Set the minimum profit threshold (authority only).
    pub fn set_min_profit_threshold(
        &mut self,
        caller: Address,
        threshold: U256,
    ) -> Result<(), ExecutionError> {
        self.gate.ensure(caller)?;
        info!(old = %self.min_profit_threshold, new = %threshold, "profit threshold updated");
        self.min_profit_threshold = threshold;
        Ok(())
    }

    /// Grant a venue a spend allowance over the engine's holdings
    /// (authority only).
    pub fn approve_venue(
        &self,
        caller: Address,
        world: &mut World,
        asset: Address,
        venue: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        self.gate.ensure(caller)?;
        world.venues.resolve(venue)?;
        world.ledger.approve(asset, self.address, venue, amount);
        debug!(asset = %asset, venue = %venue, amount = %amount, "venue approved");
        Ok(())
    }

    /// Revoke a venue's spend allowance (authority only).
    pub fn revoke_venue(
        &self,
        caller: Address,
        world: &mut World,
        asset: Address,
        venue: Address,
    ) -> Result<(), ExecutionError> {
        self.approve_venue(caller, world, asset, venue, U256::ZERO)
    }

    /// Withdraw held assets to a recipient (authority only).
    pub fn withdraw(
        &self,
        caller: Address,
        world: &mut World,
        asset: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        self.gate.ensure(caller)?;
        if to == Address::ZERO {
            return Err(ExecutionError::InvalidTarget);
        }
        let outcome = world.ledger.transfer(asset, self.address, to, amount)?;
        if !outcome.is_success() {
            return Err(ExecutionError::TransferFailed(asset));
        }
        info!(asset = %asset, to = %to, amount = %amount, "withdrawal");
        Ok(())
    }

    /// Transfer the authority (authority only).
    pub fn transfer_authority(
        &mut self,
        caller: Address,
        new_authority: Address,
    ) -> Result<(), ExecutionError> {
        self.gate.transfer(caller, new_authority)
    }
}

impl FlashLoanReceiver for ExecutionEngine {
    /// The loan callback: every step is a hard gate, and any failure voids
    /// the whole execution.
    fn on_flash_loan(
        &mut self,
        ledger: &mut Ledger,
        venues: &VenueDirectory,
        ctx: CallbackContext,
    ) -> Result<(), ExecutionError> {
        // Gate 1: the caller must be exactly the recorded lending venue.
        let session = *self.session.active()?;
        if ctx.caller != session.lending_venue {
            return Err(ExecutionError::InvalidCallbackOrigin {
                expected: session.lending_venue,
                got: ctx.caller,
            });
        }

        // Gate 2: venue families that report an initiator must report us.
        if let Some(initiator) = ctx.initiator {
            if initiator != self.address {
                return Err(ExecutionError::SpoofedInitiator(initiator));
            }
        }

        // Header produced by this engine at initiation; the only untrusted
        // input at this point is the caller identity checked above.
        let (asset, amount, plan_bytes) = decode_callback_data(&ctx.data)?;

        // The principal has just been credited, so holdings cover it and
        // the subtraction cannot wrap.
        let holdings = ledger.balance_of(asset, self.address);
        let balance_before = holdings
            .checked_sub(amount)
            .ok_or(ExecutionError::ArithmeticOverflow("pre-loan balance"))?;

        let plan = SwapPlan::decode(&plan_bytes)?;
        debug!(hops = plan.hops.len(), "swap plan decoded");

        // Drive the hops. The amount fed into a later hop is the observed
        // balance delta of its input asset, never the prior hop's nominal
        // return: fee-on-transfer assets under-deliver relative to it.
        let mut amount_in = amount;
        for hop in plan.hops.iter() {
            let adapter = self.adapters.adapter_for(hop.venue_kind)?;
            let out_before = ledger.balance_of(hop.token_out, self.address);
            adapter.execute(ledger, venues, hop, self.address, amount_in)?;
            let out_after = ledger.balance_of(hop.token_out, self.address);
            amount_in = out_after
                .checked_sub(out_before)
                .ok_or(ExecutionError::ArithmeticOverflow("hop delta"))?;
        }

        // Repayment owed under the venue's fee model: declared when the
        // venue reports it, fixed-rate otherwise.
        let amount_owed = match ctx.declared_fee {
            Some(fee) => math::declared_fee_repayment(amount, fee)?,
            None => math::fixed_rate_repayment(
                amount,
                self.flash_fee_numerator,
                self.flash_fee_denominator,
            )?,
        };
        let outcome = ledger.transfer(asset, self.address, session.lending_venue, amount_owed)?;
        if !outcome.is_success() {
            return Err(ExecutionError::TransferFailed(asset));
        }

        let balance_after = ledger.balance_of(asset, self.address);
        let profit = math::checked_profit(balance_after, balance_before)?;
        if profit < self.min_profit_threshold {
            return Err(ExecutionError::ProfitBelowThreshold {
                profit,
                threshold: self.min_profit_threshold,
            });
        }

        // Safe: owed is principal plus a non-negative fee.
        let fee_paid = amount_owed
            .checked_sub(amount)
            .ok_or(ExecutionError::ArithmeticOverflow("fee paid"))?;
        self.pending_audit = Some(AuditRecord {
            venue: session.lending_venue,
            asset,
            amount_borrowed: amount,
            fee_paid,
            profit,
            timestamp: Utc::now(),
        });
        self.session.settle();
        Ok(())
    }
}
