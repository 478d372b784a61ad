//! Error types for Update Patrol.
//!
//! Structured error handling with stable error codes and category
//! classification. The taxonomy mirrors the failure design of the cycle:
//! record-store failures are the only truly fatal class (without ground
//! truth the engine cannot safely reason about deferral budgets); dialog,
//! installer, and timer failures all degrade toward not disrupting the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Update Patrol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Settings and validation errors.
    Config,
    /// Durable record store errors (ledger, receipts).
    Store,
    /// Process inspection/control errors.
    Process,
    /// Dialog subprocess errors.
    Dialog,
    /// Installer trigger errors.
    Install,
    /// Durable timer registration errors.
    Timer,
    /// Raw I/O and serialization passthrough.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Store => write!(f, "store"),
            ErrorCategory::Process => write!(f, "process"),
            ErrorCategory::Dialog => write!(f, "dialog"),
            ErrorCategory::Install => write!(f, "install"),
            ErrorCategory::Timer => write!(f, "timer"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Update Patrol.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Store errors (20-29)
    #[error("record store failure at {path}: {detail}")]
    Store { path: String, detail: String },

    #[error("corrupted record at {path}: {detail}")]
    RecordCorrupted { path: String, detail: String },

    // Process errors (30-39)
    #[error("process inspection failed for {id}: {detail}")]
    Process { id: String, detail: String },

    // Dialog errors (40-49)
    #[error("dialog presentation failed: {0}")]
    Dialog(String),

    // Install errors (50-59)
    #[error("install trigger failed for event {event}: {detail}")]
    Install { event: String, detail: String },

    // Timer errors (60-69)
    #[error("timer registration failed for {label}: {detail}")]
    Timer { label: String, detail: String },

    // Passthrough (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// Codes are grouped by category:
    /// - 10-19: Configuration
    /// - 20-29: Record store
    /// - 30-39: Process inspection/control
    /// - 40-49: Dialog presentation
    /// - 50-59: Install trigger
    /// - 60-69: Timer registration
    /// - 70-79: I/O passthrough
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Store { .. } => 20,
            Error::RecordCorrupted { .. } => 21,
            Error::Process { .. } => 30,
            Error::Dialog(_) => 40,
            Error::Install { .. } => 50,
            Error::Timer { .. } => 60,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
        }
    }

    /// Returns the error category for grouping and exit-code mapping.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::Store { .. } | Error::RecordCorrupted { .. } => ErrorCategory::Store,
            Error::Process { .. } => ErrorCategory::Process,
            Error::Dialog(_) => ErrorCategory::Dialog,
            Error::Install { .. } => ErrorCategory::Install,
            Error::Timer { .. } => ErrorCategory::Timer,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether the cycle may continue past this error.
    ///
    /// Store errors are fatal: the engine refuses to guess a deferral budget
    /// it cannot read. Everything else degrades (retry later, skip the
    /// nicety, log and move on).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Store { .. } => false,
            Error::RecordCorrupted { .. } => false,
            Error::Process { .. } => true,
            Error::Dialog(_) => true,
            Error::Install { .. } => true,
            Error::Timer { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(
            Error::Store {
                path: "p".into(),
                detail: "d".into()
            }
            .code(),
            20
        );
        assert_eq!(Error::Dialog("x".into()).code(), 40);
        assert_eq!(
            Error::Timer {
                label: "l".into(),
                detail: "d".into()
            }
            .code(),
            60
        );
    }

    #[test]
    fn store_errors_are_fatal() {
        let err = Error::Store {
            path: "/tmp/x".into(),
            detail: "permission denied".into(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::Store);

        let err = Error::RecordCorrupted {
            path: "/tmp/x".into(),
            detail: "bad json".into(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn soft_failures_are_recoverable() {
        assert!(Error::Dialog("spawn failed".into()).is_recoverable());
        assert!(Error::Timer {
            label: "t".into(),
            detail: "d".into()
        }
        .is_recoverable());
        assert!(Error::Install {
            event: "e".into(),
            detail: "d".into()
        }
        .is_recoverable());
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::Store.to_string(), "store");
        assert_eq!(ErrorCategory::Dialog.to_string(), "dialog");
    }
}
