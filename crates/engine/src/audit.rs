//! Execution audit journal.
//!
//! One record per successful execution. The off-chain planner consumes
//! these to decide future attempts; nothing here feeds back into execution.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of one successful execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Lending venue the principal came from.
    pub venue: Address,
    /// Borrowed asset.
    pub asset: Address,
    /// Principal borrowed.
    pub amount_borrowed: U256,
    /// Fee paid on top of the principal.
    pub fee_paid: U256,
    /// Surplus kept after repayment.
    pub profit: U256,
    pub timestamp: DateTime<Utc>,
}

/// Append-only journal of audit records.
#[derive(Debug, Default)]
pub struct Journal {
    records: Mutex<Vec<AuditRecord>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and log it.
    pub fn record(&self, record: &AuditRecord) {
        info!(
            venue = %record.venue,
            asset = %record.asset,
            amount = %record.amount_borrowed,
            fee = %record.fee_paid,
            profit = %record.profit,
            "arbitrage executed"
        );
        self.records.lock().push(record.clone());
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of all records so far.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Render the journal as JSON lines, one record per line.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let records = self.records.lock();
        let mut out = String::new();
        for record in records.iter() {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}
