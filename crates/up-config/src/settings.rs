//! The immutable settings value.

use serde::Serialize;
use std::path::PathBuf;

/// The fixed deferral-duration menu, in seconds.
///
/// Offered verbatim to the dialog and used to decode its reply. `0` is the
/// "start now" entry.
pub const DEFER_MENU: [u64; 7] = [0, 600, 1200, 3600, 10_800, 86_400, 172_800];

/// Days since the last install after which the deferral budget is zeroed
/// for the current cycle.
pub const DEFAULT_SLA_DAYS: i64 = 120;

/// Deferral budget when the caller does not supply one.
pub const DEFAULT_DEFER_LIMIT: u32 = 14;

/// Process-wide configuration, constructed once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Organization name shown in every dialog.
    pub org_name: String,

    /// Root for persistent state (deferral ledgers, receipts, timer spool).
    pub state_dir: PathBuf,

    /// Preferred dialog icon.
    pub icon_path: PathBuf,
    /// Icon used when `icon_path` does not exist.
    pub fallback_icon_path: PathBuf,

    /// SLA threshold in days; exceeding it forces the effective deferral
    /// limit to 0 for the current cycle only.
    pub sla_days: i64,
    /// Default deferral budget per identifier.
    pub defer_limit: u32,
    /// Deferral durations offered to the user, seconds.
    pub defer_menu: Vec<u64>,

    /// Supervisory wall-clock bound on the negotiation dialog.
    pub dialog_timeout_secs: u64,
    /// Independent timeout for the completion/reopen dialog.
    pub reopen_timeout_secs: u64,
    /// Implicit retry delay for busy/timeout/unparseable outcomes.
    pub retry_after_secs: u64,

    /// Process name whose presence marks interfering foreground activity.
    pub conflict_process: String,
    /// Seconds between conflict polls.
    pub conflict_poll_secs: u64,
    /// Number of conflict polls before giving up and reporting busy.
    pub conflict_max_polls: u32,

    /// Whether a termination loop that exhausts its ticks still proceeds to
    /// the install dispatch or aborts the cycle.
    pub proceed_on_exhaustion: bool,

    /// Fleet-management agent binary invoked to run install policies.
    pub installer_program: PathBuf,
    /// External dialog helper binary.
    pub dialog_program: PathBuf,
    /// Binary that registers a durable timer file with the OS scheduler.
    pub timer_load_program: PathBuf,
    /// Binary used to relaunch an application by identifier.
    pub launcher_program: PathBuf,

    /// Label prefix for durable retry timers. Timer labels are
    /// `<prefix>.<epoch>.<identifier stem>`.
    pub timer_label_prefix: String,
}

impl Settings {
    pub fn deferral_dir(&self) -> PathBuf {
        self.state_dir.join("deferrals")
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.state_dir.join("receipts")
    }

    pub fn timers_dir(&self) -> PathBuf {
        self.state_dir.join("timers")
    }

    /// Defaults rooted at the given state directory.
    pub fn with_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        Settings {
            org_name: "Update Patrol".to_string(),
            state_dir: state_dir.into(),
            icon_path: PathBuf::from("/usr/local/share/update-patrol/icon.png"),
            fallback_icon_path: PathBuf::from(
                "/System/Library/CoreServices/Problem Reporter.app/Contents/Resources/ProblemReporter.icns",
            ),
            sla_days: DEFAULT_SLA_DAYS,
            defer_limit: DEFAULT_DEFER_LIMIT,
            defer_menu: DEFER_MENU.to_vec(),
            dialog_timeout_secs: 300,
            reopen_timeout_secs: 60,
            retry_after_secs: 3600,
            conflict_process: "CptHost".to_string(),
            conflict_poll_secs: 30,
            conflict_max_polls: 10,
            proceed_on_exhaustion: true,
            installer_program: PathBuf::from("/usr/local/bin/jamf"),
            dialog_program: PathBuf::from(
                "/Library/Application Support/JAMF/bin/jamfHelper.app/Contents/MacOS/jamfHelper",
            ),
            timer_load_program: PathBuf::from("/bin/launchctl"),
            launcher_program: PathBuf::from("/usr/bin/open"),
            timer_label_prefix: "com.updatepatrol.retry".to_string(),
        }
    }
}
