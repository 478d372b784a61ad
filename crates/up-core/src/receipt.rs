//! Install receipt tracker.
//!
//! Records the last install date per update identifier and drives the SLA
//! escalation: once too many days have passed since the last install, the
//! effective deferral limit for the current cycle drops to zero.
//!
//! Recording is attempt-based: the date is written when an install
//! dispatches, regardless of how the installer itself later fares. The
//! installer's exit status travels separately in
//! [`up_common::InstallDispatch`].

use crate::store::RecordStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use up_common::{Result, UpdateId};

/// Persisted receipt for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub last_install_date: NaiveDate,
}

/// Store-backed receipt tracker.
#[derive(Debug, Clone)]
pub struct ReceiptTracker {
    store: RecordStore,
}

fn record_name(id: &UpdateId) -> String {
    format!("install_{}.json", id.file_stem())
}

impl ReceiptTracker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReceiptTracker {
            store: RecordStore::new(dir),
        }
    }

    /// Days since the last recorded install, if any.
    ///
    /// An absent receipt is a legitimate first run, not an error.
    pub fn last_install_age(&self, id: &UpdateId, today: NaiveDate) -> Result<Option<i64>> {
        let receipt: Option<InstallReceipt> = self.store.read(&record_name(id))?;
        Ok(receipt.map(|r| (today - r.last_install_date).num_days()))
    }

    /// Whether the SLA forces escalation: true iff an age exists and
    /// exceeds the threshold.
    pub fn should_force_by_sla(
        &self,
        id: &UpdateId,
        today: NaiveDate,
        threshold_days: i64,
    ) -> Result<bool> {
        match self.last_install_age(id, today)? {
            Some(age) => {
                info!(id = %id, age_days = age, threshold_days, "install receipt found");
                Ok(age > threshold_days)
            }
            None => Ok(false),
        }
    }

    /// Overwrite the stored date after an install dispatch.
    pub fn record_install(&self, id: &UpdateId, date: NaiveDate) -> Result<()> {
        self.store.write(
            &record_name(id),
            &InstallReceipt {
                last_install_date: date,
            },
        )
    }

    pub fn peek(&self, id: &UpdateId) -> Result<Option<InstallReceipt>> {
        self.store.read(&record_name(id))
    }
}
