//! Decision-surface outcome types.
//!
//! These enums are the contract between the negotiation state machine, the
//! orchestrator, and the CLI: what the user chose, what one cycle produced,
//! whether best-effort cleanup actually cleaned up, and what the installer
//! dispatch returned.

use serde::{Deserialize, Serialize};

/// Result of one user negotiation.
///
/// `Dismissed` is the explicitly named form of the dialog's "closed without
/// a choice" signal (empty output or the closed-signal value) so that future
/// behavior changes do not have to re-derive intent from a magic number.
/// `Declined` is the documented default arm for every signal combination
/// that does not explicitly match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationOutcome {
    /// Install now.
    Proceed,
    /// User chose a deferral duration from the menu.
    Defer { secs: u64 },
    /// User explicitly declined (cancel button or unmatched signal).
    Declined,
    /// Dialog was closed without a choice (empty result or closed signal).
    Dismissed,
    /// The dialog outlived its supervisory timeout and was killed.
    TimedOut,
    /// The dialog returned a non-numeric result.
    Unparseable,
}

impl NegotiationOutcome {
    /// Whether this outcome allows the install to go ahead.
    pub fn is_proceed(self) -> bool {
        matches!(self, NegotiationOutcome::Proceed)
    }
}

/// What one orchestrated decision cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Target was not running; install dispatched without any negotiation.
    InstalledIdle,
    /// Target was terminated and the install dispatched.
    Installed { reopened: bool },
    /// Cycle exited with a durable retry scheduled.
    /// `charged` is true only when a parsed user deferral consumed budget.
    Deferred { secs: u64, charged: bool },
    /// Interfering foreground activity; retry scheduled, no budget charged.
    Busy,
    /// User declined or dismissed; no install, no retry, no charge.
    Declined,
    /// Termination loop exhausted and policy aborts the install dispatch.
    Aborted,
}

/// Result of a best-effort cleanup pass (timer removal).
///
/// Cleanup failures are non-fatal by design; this type exists so callers and
/// tests can tell "cleanup succeeded" from "cleanup failed, continuing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupOutcome {
    Clean,
    BestEffort { failures: Vec<String> },
}

impl CleanupOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, CleanupOutcome::Clean)
    }

    pub fn from_failures(failures: Vec<String>) -> Self {
        if failures.is_empty() {
            CleanupOutcome::Clean
        } else {
            CleanupOutcome::BestEffort { failures }
        }
    }
}

/// How an install trigger dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Empty event name; nothing was invoked.
    Skipped,
    /// Installer exited zero.
    Succeeded,
    /// Installer exited non-zero (or was killed). Logged, never retried
    /// here; a supervising system reconciles compliance separately.
    Failed { code: Option<i32> },
}

impl DispatchStatus {
    pub fn is_success(self) -> bool {
        matches!(self, DispatchStatus::Succeeded | DispatchStatus::Skipped)
    }
}

/// Structured result of one install trigger.
///
/// Receipt recording is attempt-based; the exit status travels with the
/// dispatch so callers can reconcile attempt vs. verified success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallDispatch {
    pub event: String,
    pub status: DispatchStatus,
}

impl InstallDispatch {
    pub fn skipped() -> Self {
        InstallDispatch {
            event: String::new(),
            status: DispatchStatus::Skipped,
        }
    }
}
