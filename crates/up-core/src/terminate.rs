//! Graceful-to-forced termination controller.
//!
//! Escalation over polling ticks, one per second, bounded to 30 ticks:
//! graceful quit requests get a 10-tick grace window, then the controller
//! escalates unconditionally to forced termination for the remainder. A
//! target that survives every tick is reported, not raised; the caller's
//! policy decides whether the install still goes ahead.

use crate::host::{ProcessControl, ProcessProbe};
use std::time::Duration;
use tracing::{debug, warn};
use up_common::{Result, UpdateId};

/// Termination loop configuration.
#[derive(Debug, Clone)]
pub struct TerminateConfig {
    /// Total polling ticks before giving up.
    pub max_ticks: u32,
    /// Tick at which graceful shutdown escalates to forced.
    pub escalate_after: u32,
    /// Pause between ticks.
    pub tick: Duration,
}

impl Default for TerminateConfig {
    fn default() -> Self {
        Self {
            max_ticks: 30,
            escalate_after: 10,
            tick: Duration::from_secs(1),
        }
    }
}

/// How the termination loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Target was not running when the loop started.
    NotRunning,
    /// Target stopped during the loop.
    Exited { ticks: u32, escalated: bool },
    /// Target still reported running after the final tick.
    StillRunning,
}

impl TerminationOutcome {
    pub fn target_stopped(self) -> bool {
        !matches!(self, TerminationOutcome::StillRunning)
    }
}

/// Escalating shutdown loop over the process seams.
pub struct TerminationController<'a> {
    probe: &'a dyn ProcessProbe,
    control: &'a dyn ProcessControl,
    config: TerminateConfig,
}

impl<'a> TerminationController<'a> {
    pub fn new(
        probe: &'a dyn ProcessProbe,
        control: &'a dyn ProcessControl,
        config: TerminateConfig,
    ) -> Self {
        TerminationController {
            probe,
            control,
            config,
        }
    }

    /// Drive the target down. `force` sends forced termination from tick 0.
    ///
    /// Control signals are fire-and-forget: delivery failures are logged and
    /// the loop keeps polling, since the target may exit anyway.
    pub fn shut_down(&self, id: &UpdateId, force: bool) -> Result<TerminationOutcome> {
        let mut escalated = force;

        for tick in 0..self.config.max_ticks {
            if !self.probe.is_running(id)? {
                if tick == 0 {
                    debug!(id = %id, "target not running; nothing to terminate");
                    return Ok(TerminationOutcome::NotRunning);
                }
                debug!(id = %id, tick, escalated, "target exited");
                return Ok(TerminationOutcome::Exited { ticks: tick, escalated });
            }

            if !escalated && tick >= self.config.escalate_after {
                warn!(id = %id, tick, "graceful quit taking too long; escalating to forced");
                escalated = true;
            }

            let sent = if escalated {
                self.control.request_force_quit(id)
            } else {
                self.control.request_graceful_quit(id)
            };
            if let Err(err) = sent {
                warn!(id = %id, tick, %err, "termination signal failed");
            }

            debug!(id = %id, tick, escalated, "waiting on target to terminate");
            std::thread::sleep(self.config.tick);
        }

        if !self.probe.is_running(id)? {
            return Ok(TerminationOutcome::Exited {
                ticks: self.config.max_ticks,
                escalated,
            });
        }
        warn!(id = %id, ticks = self.config.max_ticks, "target still running; giving up");
        Ok(TerminationOutcome::StillRunning)
    }
}
