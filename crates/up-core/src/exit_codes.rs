//! Exit codes for the up-core CLI.
//!
//! Exit codes communicate the cycle outcome without requiring output
//! parsing, so wrapping automation (the fleet agent, launch scripts) can
//! branch on them directly.
//!
//! Exit code ranges:
//! - 0-6: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use up_common::{CycleOutcome, Error, ErrorCategory};

/// Exit codes for up-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-6)
    // ========================================================================
    /// Install dispatched (target idle or terminated).
    Installed = 0,

    /// Cycle exited with a durable retry scheduled.
    Deferred = 1,

    /// Interfering activity; retry scheduled.
    Busy = 2,

    /// User declined or dismissed; nothing scheduled.
    Declined = 3,

    /// Termination loop exhausted and policy aborted the install.
    Aborted = 4,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments.
    ArgsError = 10,

    /// Invalid or unresolvable settings.
    ConfigError = 11,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error.
    InternalError = 20,

    /// Record store failure (fatal to the cycle).
    StoreError = 21,

    /// Process inspection/control failure.
    ProcessError = 22,

    /// Installer trigger failure.
    InstallError = 23,

    /// Dialog presentation failure.
    DialogError = 24,

    /// Timer registration failure.
    TimerError = 25,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Operational outcomes (codes 0-6) are workflow states, not errors.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Stable code name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Installed => "OK_INSTALLED",
            ExitCode::Deferred => "OK_DEFERRED",
            ExitCode::Busy => "OK_BUSY",
            ExitCode::Declined => "OK_DECLINED",
            ExitCode::Aborted => "ERR_STILL_RUNNING",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::StoreError => "ERR_STORE",
            ExitCode::ProcessError => "ERR_PROCESS",
            ExitCode::InstallError => "ERR_INSTALL",
            ExitCode::DialogError => "ERR_DIALOG",
            ExitCode::TimerError => "ERR_TIMER",
        }
    }
}

impl From<CycleOutcome> for ExitCode {
    fn from(outcome: CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::InstalledIdle | CycleOutcome::Installed { .. } => ExitCode::Installed,
            CycleOutcome::Deferred { .. } => ExitCode::Deferred,
            CycleOutcome::Busy => ExitCode::Busy,
            CycleOutcome::Declined => ExitCode::Declined,
            CycleOutcome::Aborted => ExitCode::Aborted,
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Store => ExitCode::StoreError,
            ErrorCategory::Process => ExitCode::ProcessError,
            ErrorCategory::Install => ExitCode::InstallError,
            ErrorCategory::Dialog => ExitCode::DialogError,
            ErrorCategory::Timer => ExitCode::TimerError,
            ErrorCategory::Io => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_mapping() {
        assert_eq!(ExitCode::from(CycleOutcome::InstalledIdle), ExitCode::Installed);
        assert_eq!(
            ExitCode::from(CycleOutcome::Installed { reopened: true }),
            ExitCode::Installed
        );
        assert_eq!(
            ExitCode::from(CycleOutcome::Deferred {
                secs: 600,
                charged: true
            }),
            ExitCode::Deferred
        );
        assert_eq!(ExitCode::from(CycleOutcome::Busy), ExitCode::Busy);
        assert_eq!(ExitCode::from(CycleOutcome::Declined), ExitCode::Declined);
        assert_eq!(ExitCode::from(CycleOutcome::Aborted), ExitCode::Aborted);
    }

    #[test]
    fn error_mapping_by_category() {
        let err = Error::Store {
            path: "p".into(),
            detail: "d".into(),
        };
        assert_eq!(ExitCode::from(&err), ExitCode::StoreError);
        assert_eq!(ExitCode::from(&Error::Dialog("d".into())), ExitCode::DialogError);
    }

    #[test]
    fn classification() {
        assert!(ExitCode::Installed.is_operational());
        assert!(ExitCode::Aborted.is_operational());
        assert!(ExitCode::StoreError.is_error());
        assert!(!ExitCode::Declined.is_error());
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ExitCode::Deferred.to_string(), "OK_DEFERRED (1)");
    }
}
