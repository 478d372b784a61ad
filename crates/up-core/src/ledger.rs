//! Deferral ledger.
//!
//! Tracks the deferral budget and usage per update identifier. `used` only
//! ever moves up within one update cycle; the record is removed when an
//! install dispatches so the next cycle for the same identifier starts a
//! fresh budget.
//!
//! The SLA override never touches the persisted `limit`: callers pass the
//! effective limit into [`DeferralRecord::remaining_slots`] and
//! [`DeferralRecord::is_exhausted`], so a zeroed budget lasts exactly one
//! decision.

use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use up_common::{Result, UpdateId};

/// Persisted deferral counters for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferralRecord {
    pub limit: u32,
    pub used: u32,
}

impl DeferralRecord {
    /// Deferrals still available under the given effective limit.
    pub fn remaining_slots(&self, effective_limit: u32) -> u32 {
        effective_limit.saturating_sub(self.used)
    }

    /// Whether no further deferral is offered.
    ///
    /// `used` can exceed the effective limit when the SLA override zeroes a
    /// budget after deferrals were already spent.
    pub fn is_exhausted(&self, effective_limit: u32) -> bool {
        self.used >= effective_limit
    }
}

/// Store-backed deferral ledger.
#[derive(Debug, Clone)]
pub struct DeferralLedger {
    store: RecordStore,
}

fn record_name(id: &UpdateId) -> String {
    format!("policydefer_{}.json", id.file_stem())
}

impl DeferralLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DeferralLedger {
            store: RecordStore::new(dir),
        }
    }

    /// Load the record for an identifier, creating and persisting a fresh
    /// `{used: 0, limit: default_limit}` on first negotiation.
    pub fn load(&self, id: &UpdateId, default_limit: u32) -> Result<DeferralRecord> {
        if let Some(record) = self.store.read(&record_name(id))? {
            return Ok(record);
        }
        let record = DeferralRecord {
            limit: default_limit,
            used: 0,
        };
        self.store.write(&record_name(id), &record)?;
        debug!(id = %id, limit = default_limit, "created deferral ledger");
        Ok(record)
    }

    /// Charge one deferral and persist.
    pub fn record_deferral(&self, id: &UpdateId, record: &mut DeferralRecord) -> Result<()> {
        record.used += 1;
        self.store.write(&record_name(id), record)?;
        debug!(id = %id, used = record.used, limit = record.limit, "deferral charged");
        Ok(())
    }

    /// Drop the record entirely (called when an install dispatches).
    pub fn remove(&self, id: &UpdateId) -> Result<bool> {
        self.store.remove(&record_name(id))
    }

    /// Re-read the persisted record without creating one.
    pub fn peek(&self, id: &UpdateId) -> Result<Option<DeferralRecord>> {
        self.store.read(&record_name(id))
    }
}
