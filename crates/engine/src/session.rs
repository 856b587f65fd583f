//! Loan session tracking.
//!
//! One slot, one session: a loan session is created at initiation, read by
//! the callback for origin matching, and invalidated on every exit path of
//! the initiating call. The occupied slot doubles as the engine-wide
//! non-reentrant guard: a nested initiation finds it taken and fails
//! before any effect.

use alloy::primitives::{Address, U256};
use flashbot_venues::ExecutionError;

/// Lifecycle of a loan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Active,
    Settled,
}

/// Record of the execution currently in flight.
#[derive(Debug, Clone, Copy)]
pub struct LoanSession {
    /// Identity of the lending venue; the only origin the callback accepts.
    pub lending_venue: Address,
    pub asset: Address,
    pub amount: U256,
    /// Identity that initiated the loan.
    pub initiator: Address,
    pub status: SessionStatus,
}

impl LoanSession {
    pub fn new(lending_venue: Address, asset: Address, amount: U256, initiator: Address) -> Self {
        Self {
            lending_venue,
            asset,
            amount,
            initiator,
            status: SessionStatus::Active,
        }
    }
}

/// The single session slot.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<LoanSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the slot. Fails if an execution is already in flight.
    pub fn begin(&mut self, session: LoanSession) -> Result<(), ExecutionError> {
        if self.current.is_some() {
            return Err(ExecutionError::ReentrantExecution);
        }
        self.current = Some(session);
        Ok(())
    }

    /// The active session, if any.
    pub fn active(&self) -> Result<&LoanSession, ExecutionError> {
        self.current
            .as_ref()
            .filter(|s| s.status == SessionStatus::Active)
            .ok_or(ExecutionError::NoActiveSession)
    }

    /// Mark the active session settled (callback completed).
    pub fn settle(&mut self) {
        if let Some(session) = self.current.as_mut() {
            session.status = SessionStatus::Settled;
        }
    }

    /// Vacate the slot. Called on every exit path of an initiation.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}
