//! Durable retry scheduler.
//!
//! Persists at most one live one-shot timer per update identifier so the
//! whole decision flow resumes later without this process staying alive.
//! Creating a timer first removes every existing timer for the identifier;
//! labels embed the current epoch second, so the new file never collides
//! with the one whose unload would otherwise race the process creating it.
//!
//! Removal failures are best-effort and non-fatal ([`CleanupOutcome`]);
//! registration failures are logged by the caller and the cycle still
//! exits, leaving the user un-reprompted until the next external trigger.

use crate::host::TimerHost;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use up_common::{CleanupOutcome, Error, Result, UpdateId};

/// Durable one-shot timer definition, serialized whole into the spool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub label: String,
    pub run_once: bool,
    pub program_arguments: Vec<String>,
    pub start_interval_secs: u64,
}

/// The command line a fired timer executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAction {
    pub program_arguments: Vec<String>,
}

/// Spool-backed scheduler over a [`TimerHost`].
pub struct RetryScheduler<'a> {
    host: &'a dyn TimerHost,
    spool_dir: PathBuf,
    label_prefix: String,
}

impl<'a> RetryScheduler<'a> {
    pub fn new(
        host: &'a dyn TimerHost,
        spool_dir: impl Into<PathBuf>,
        label_prefix: impl Into<String>,
    ) -> Self {
        RetryScheduler {
            host,
            spool_dir: spool_dir.into(),
            label_prefix: label_prefix.into(),
        }
    }

    fn suffix(&self, id: &UpdateId) -> String {
        format!(".{}.json", id.file_stem())
    }

    /// Spool files currently registered for an identifier.
    pub fn timer_files(&self, id: &UpdateId) -> Vec<PathBuf> {
        let prefix = format!("{}.", self.label_prefix);
        let suffix = self.suffix(id);
        let entries = match fs::read_dir(&self.spool_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.starts_with(&prefix) && name.ends_with(&suffix)
            })
            .map(|entry| entry.path())
            .collect();
        files.sort();
        files
    }

    /// Remove every timer for the identifier without creating a new one.
    pub fn cancel_retry(&self, id: &UpdateId) -> CleanupOutcome {
        let mut failures = Vec::new();
        for path in self.timer_files(id) {
            if let Err(err) = fs::remove_file(&path) {
                warn!(path = %path.display(), %err, "stale timer removal failed; continuing");
                failures.push(format!("{}: {err}", path.display()));
            }
        }
        CleanupOutcome::from_failures(failures)
    }

    /// Replace any existing timer for the identifier with a single new
    /// one-shot timer firing after `after_secs`.
    pub fn schedule_retry(
        &self,
        id: &UpdateId,
        after_secs: u64,
        action: &RetryAction,
    ) -> Result<CleanupOutcome> {
        let cleanup = self.cancel_retry(id);

        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let label = format!("{}.{}.{}", self.label_prefix, epoch, id.file_stem());
        let path = self.spool_dir.join(format!("{label}.json"));

        let timer_err = |detail: String| Error::Timer {
            label: label.clone(),
            detail,
        };

        fs::create_dir_all(&self.spool_dir).map_err(|e| timer_err(e.to_string()))?;
        let record = TimerRecord {
            label: label.clone(),
            run_once: true,
            program_arguments: action.program_arguments.clone(),
            start_interval_secs: after_secs,
        };
        let raw = serde_json::to_vec_pretty(&record).map_err(|e| timer_err(e.to_string()))?;
        fs::write(&path, raw).map_err(|e| timer_err(e.to_string()))?;

        self.host.load(&path)?;
        info!(id = %id, after_secs, label, "retry scheduled");
        Ok(cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingHost {
        loaded: RefCell<Vec<PathBuf>>,
    }

    impl TimerHost for RecordingHost {
        fn load(&self, timer_file: &Path) -> Result<()> {
            self.loaded.borrow_mut().push(timer_file.to_path_buf());
            Ok(())
        }
    }

    struct FailingHost;

    impl TimerHost for FailingHost {
        fn load(&self, timer_file: &Path) -> Result<()> {
            Err(Error::Timer {
                label: timer_file.display().to_string(),
                detail: "loader unavailable".into(),
            })
        }
    }

    fn action() -> RetryAction {
        RetryAction {
            program_arguments: vec![
                "/usr/local/bin/jamf".into(),
                "policy".into(),
                "-event".into(),
                "defer-example".into(),
            ],
        }
    }

    fn id() -> UpdateId {
        UpdateId::new("com.example.app")
    }

    #[test]
    fn schedule_writes_one_registered_timer() {
        let dir = tempdir().unwrap();
        let host = RecordingHost::default();
        let scheduler = RetryScheduler::new(&host, dir.path(), "com.updatepatrol.retry");

        let cleanup = scheduler.schedule_retry(&id(), 3600, &action()).unwrap();
        assert!(cleanup.is_clean());

        let files = scheduler.timer_files(&id());
        assert_eq!(files.len(), 1);
        assert_eq!(host.loaded.borrow().as_slice(), &files[..]);

        let raw = fs::read_to_string(&files[0]).unwrap();
        let record: TimerRecord = serde_json::from_str(&raw).unwrap();
        assert!(record.run_once);
        assert_eq!(record.start_interval_secs, 3600);
        assert_eq!(record.program_arguments, action().program_arguments);
        assert!(record.label.starts_with("com.updatepatrol.retry."));
        assert!(record.label.ends_with(".com.example.app"));
    }

    #[test]
    fn rescheduling_replaces_the_existing_timer() {
        let dir = tempdir().unwrap();
        let host = RecordingHost::default();
        let scheduler = RetryScheduler::new(&host, dir.path(), "com.updatepatrol.retry");

        scheduler.schedule_retry(&id(), 600, &action()).unwrap();
        scheduler.schedule_retry(&id(), 86_400, &action()).unwrap();

        let files = scheduler.timer_files(&id());
        assert_eq!(files.len(), 1, "exactly one live timer per identifier");

        let record: TimerRecord =
            serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(record.start_interval_secs, 86_400);
    }

    #[test]
    fn cancel_removes_all_timers_for_the_identifier_only() {
        let dir = tempdir().unwrap();
        let host = RecordingHost::default();
        let scheduler = RetryScheduler::new(&host, dir.path(), "com.updatepatrol.retry");
        let other = UpdateId::new("org.mozilla.firefox");

        scheduler.schedule_retry(&id(), 600, &action()).unwrap();
        scheduler.schedule_retry(&other, 600, &action()).unwrap();

        assert!(scheduler.cancel_retry(&id()).is_clean());
        assert!(scheduler.timer_files(&id()).is_empty());
        assert_eq!(scheduler.timer_files(&other).len(), 1);
    }

    #[test]
    fn cancel_with_nothing_scheduled_is_clean() {
        let dir = tempdir().unwrap();
        let host = RecordingHost::default();
        let scheduler = RetryScheduler::new(&host, dir.path(), "com.updatepatrol.retry");
        assert!(scheduler.cancel_retry(&id()).is_clean());
    }

    #[test]
    fn registration_failure_surfaces_as_timer_error() {
        let dir = tempdir().unwrap();
        let scheduler = RetryScheduler::new(&FailingHost, dir.path(), "com.updatepatrol.retry");

        let err = scheduler.schedule_retry(&id(), 3600, &action()).unwrap_err();
        assert!(matches!(err, Error::Timer { .. }));
        assert!(err.is_recoverable());
    }
}
