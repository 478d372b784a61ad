//! Conflict detection.
//!
//! Before disturbing the user, the orchestrator polls for interfering
//! foreground activity (an active call, a presentation). The detector waits
//! optimistically: intermediate busy polls sleep and retry in case the
//! activity is about to end, and only a busy final poll reports busy.
//!
//! Purely advisory. Probe errors count as idle; the design favors not
//! over-blocking updates.

use crate::host::BusyProbe;
use std::time::Duration;
use tracing::{debug, warn};

/// Conflict poll configuration.
#[derive(Debug, Clone)]
pub struct ConflictConfig {
    /// Pause between polls.
    pub poll_interval: Duration,
    /// Number of polls before reporting busy.
    pub max_polls: u32,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_polls: 10,
        }
    }
}

/// Poll for interfering activity within the configured window.
///
/// Returns `false` the moment a poll reports no activity; returns `true`
/// only if the final poll still reports activity.
pub fn has_interfering_activity(probe: &dyn BusyProbe, config: &ConflictConfig) -> bool {
    for poll in 0..config.max_polls {
        let busy = match probe.is_busy() {
            Ok(busy) => busy,
            Err(err) => {
                warn!(%err, "busy probe failed; treating as idle");
                false
            }
        };
        if !busy {
            debug!(poll, "no interfering activity");
            return false;
        }
        if poll + 1 == config.max_polls {
            return true;
        }
        debug!(poll, "interfering activity present; waiting");
        std::thread::sleep(config.poll_interval);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use up_common::Result;

    /// Probe replaying a scripted sequence of answers.
    struct ScriptedProbe {
        answers: RefCell<Vec<Result<bool>>>,
        polls: RefCell<u32>,
    }

    impl ScriptedProbe {
        fn new(answers: Vec<Result<bool>>) -> Self {
            let mut answers = answers;
            answers.reverse();
            ScriptedProbe {
                answers: RefCell::new(answers),
                polls: RefCell::new(0),
            }
        }

        fn polls(&self) -> u32 {
            *self.polls.borrow()
        }
    }

    impl BusyProbe for ScriptedProbe {
        fn is_busy(&self) -> Result<bool> {
            *self.polls.borrow_mut() += 1;
            self.answers.borrow_mut().pop().unwrap_or(Ok(false))
        }
    }

    fn fast_config(max_polls: u32) -> ConflictConfig {
        ConflictConfig {
            poll_interval: Duration::from_millis(0),
            max_polls,
        }
    }

    #[test]
    fn idle_first_poll_exits_immediately() {
        let probe = ScriptedProbe::new(vec![Ok(false)]);
        assert!(!has_interfering_activity(&probe, &fast_config(10)));
        assert_eq!(probe.polls(), 1);
    }

    #[test]
    fn activity_ending_mid_window_reports_idle() {
        let probe = ScriptedProbe::new(vec![Ok(true), Ok(true), Ok(false)]);
        assert!(!has_interfering_activity(&probe, &fast_config(10)));
        assert_eq!(probe.polls(), 3);
    }

    #[test]
    fn busy_through_the_final_poll_reports_busy() {
        let probe = ScriptedProbe::new((0..10).map(|_| Ok(true)).collect());
        assert!(has_interfering_activity(&probe, &fast_config(10)));
        assert_eq!(probe.polls(), 10);
    }

    #[test]
    fn probe_errors_count_as_idle() {
        let probe = ScriptedProbe::new(vec![Err(up_common::Error::Process {
            id: "CptHost".into(),
            detail: "pgrep missing".into(),
        })]);
        assert!(!has_interfering_activity(&probe, &fast_config(10)));
        assert_eq!(probe.polls(), 1);
    }
}
