//! Cycle orchestration.
//!
//! Composes the engine per target application: running-check → SLA check →
//! conflict check → negotiate → terminate → install → notify → cleanup.
//! The orchestrator owns one decision cycle end to end; every collaborator
//! is a stateless seam it calls in order, except the ledger and receipt
//! tracker whose records persist across invocations (the process may exit
//! and be re-invoked later by a scheduled retry).

use crate::conflict::{self, ConflictConfig};
use crate::host::{
    AppLauncher, BusyProbe, DialogPresenter, InstallRunner, ProcessControl, ProcessProbe,
    TimerHost,
};
use crate::ledger::DeferralLedger;
use crate::negotiate::{Negotiator, PromptVariant, ReopenChoice};
use crate::receipt::ReceiptTracker;
use crate::scheduler::{RetryAction, RetryScheduler};
use crate::terminate::{TerminateConfig, TerminationController};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, warn};
use up_common::{
    CycleOutcome, Error, InstallDispatch, NegotiationOutcome, Result, UpdateJob, UpdateTarget,
};
use up_config::Settings;

/// The collaborator seams one cycle runs against.
pub struct Collaborators<'a> {
    pub probe: &'a dyn ProcessProbe,
    pub control: &'a dyn ProcessControl,
    pub launcher: &'a dyn AppLauncher,
    pub busy: &'a dyn BusyProbe,
    pub installer: &'a dyn InstallRunner,
    pub timers: &'a dyn TimerHost,
    pub dialogs: &'a dyn DialogPresenter,
}

/// Runs decision cycles.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    collab: Collaborators<'a>,
    ledger: DeferralLedger,
    receipts: ReceiptTracker,
    conflict_config: ConflictConfig,
    terminate_config: TerminateConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: &'a Settings, collab: Collaborators<'a>) -> Self {
        Orchestrator {
            ledger: DeferralLedger::new(settings.deferral_dir()),
            receipts: ReceiptTracker::new(settings.receipts_dir()),
            conflict_config: ConflictConfig {
                poll_interval: Duration::from_secs(settings.conflict_poll_secs),
                max_polls: settings.conflict_max_polls,
            },
            terminate_config: TerminateConfig::default(),
            settings,
            collab,
        }
    }

    /// Override the termination loop timing (tests run with a zero tick).
    pub fn with_terminate_config(mut self, config: TerminateConfig) -> Self {
        self.terminate_config = config;
        self
    }

    /// Override the conflict poll timing.
    pub fn with_conflict_config(mut self, config: ConflictConfig) -> Self {
        self.conflict_config = config;
        self
    }

    fn scheduler(&self) -> RetryScheduler<'_> {
        RetryScheduler::new(
            self.collab.timers,
            self.settings.timers_dir(),
            self.settings.timer_label_prefix.clone(),
        )
    }

    fn retry_action(&self, job: &UpdateJob) -> RetryAction {
        RetryAction {
            program_arguments: vec![
                self.settings.installer_program.display().to_string(),
                "policy".to_string(),
                "-event".to_string(),
                job.retry_event.clone(),
            ],
        }
    }

    fn ensure_state_dirs(&self) -> Result<()> {
        for dir in [
            self.settings.deferral_dir(),
            self.settings.receipts_dir(),
            self.settings.timers_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|err| Error::Store {
                path: dir.display().to_string(),
                detail: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Run one decision cycle for a target.
    pub fn run_cycle(&self, job: &UpdateJob, today: NaiveDate) -> Result<CycleOutcome> {
        let target = &job.target;
        let id = &target.id;
        info!(id = %id, app = %target.display_name, force = target.force_requested,
              "starting decision cycle");

        self.ensure_state_dirs()?;
        self.scheduler().cancel_retry(id);

        // A target that is not running needs no negotiation at all.
        if !self.collab.probe.is_running(id)? {
            info!(id = %id, "target not running; dispatching install");
            self.dispatch_install(job, today)?;
            self.scheduler().cancel_retry(id);
            return Ok(CycleOutcome::InstalledIdle);
        }

        // SLA override zeroes the budget for this cycle only; the persisted
        // ledger limit is never touched.
        let effective_limit = if self
            .receipts
            .should_force_by_sla(id, today, self.settings.sla_days)?
        {
            warn!(id = %id, sla_days = self.settings.sla_days,
                  "SLA exceeded; deferral budget is zero for this cycle");
            0
        } else {
            job.defer_limit
        };

        if target.force_requested {
            let negotiator = Negotiator::new(self.collab.dialogs, self.settings);
            if let Err(err) = negotiator.negotiate(target, PromptVariant::Forced) {
                warn!(id = %id, %err, "force notification failed; proceeding anyway");
            }
            return self.terminate_and_install(job, today, true);
        }

        if conflict::has_interfering_activity(self.collab.busy, &self.conflict_config) {
            info!(id = %id, "interfering activity; retrying later without charging a deferral");
            self.schedule_retry_best_effort(job, self.settings.retry_after_secs);
            return Ok(CycleOutcome::Busy);
        }

        // With prompting disabled the update proceeds unconditionally once
        // conflict-free; negotiation is never invoked.
        if !target.allow_prompt {
            return self.terminate_and_install(job, today, false);
        }

        let mut record = self.ledger.load(id, job.defer_limit)?;
        let variant = if record.is_exhausted(effective_limit) {
            PromptVariant::Exhausted
        } else {
            PromptVariant::Deferrable {
                remaining: record.remaining_slots(effective_limit),
            }
        };

        let negotiator = Negotiator::new(self.collab.dialogs, self.settings);
        let outcome = match negotiator.negotiate(target, variant) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(id = %id, %err, "dialog failed; degrading to an uncharged retry");
                NegotiationOutcome::Unparseable
            }
        };

        match outcome {
            NegotiationOutcome::Proceed => self.terminate_and_install(job, today, false),
            NegotiationOutcome::Defer { secs } => {
                self.ledger.record_deferral(id, &mut record)?;
                self.schedule_retry_best_effort(job, secs);
                Ok(CycleOutcome::Deferred {
                    secs,
                    charged: true,
                })
            }
            NegotiationOutcome::TimedOut | NegotiationOutcome::Unparseable => {
                self.schedule_retry_best_effort(job, self.settings.retry_after_secs);
                Ok(CycleOutcome::Deferred {
                    secs: self.settings.retry_after_secs,
                    charged: false,
                })
            }
            NegotiationOutcome::Declined | NegotiationOutcome::Dismissed => {
                info!(id = %id, "user declined; exiting quietly");
                Ok(CycleOutcome::Declined)
            }
        }
    }

    fn schedule_retry_best_effort(&self, job: &UpdateJob, after_secs: u64) {
        let action = self.retry_action(job);
        if let Err(err) = self
            .scheduler()
            .schedule_retry(&job.target.id, after_secs, &action)
        {
            warn!(id = %job.target.id, %err,
                  "retry registration failed; no re-prompt until the next external run");
        }
    }

    fn terminate_and_install(
        &self,
        job: &UpdateJob,
        today: NaiveDate,
        force: bool,
    ) -> Result<CycleOutcome> {
        let controller = TerminationController::new(
            self.collab.probe,
            self.collab.control,
            self.terminate_config.clone(),
        );
        let termination = controller.shut_down(&job.target.id, force)?;
        if !termination.target_stopped() && !self.settings.proceed_on_exhaustion {
            warn!(id = %job.target.id, "target still running; policy aborts the install");
            return Ok(CycleOutcome::Aborted);
        }

        self.dispatch_install(job, today)?;
        let reopened = self.offer_reopen(&job.target);
        self.scheduler().cancel_retry(&job.target.id);
        Ok(CycleOutcome::Installed { reopened })
    }

    fn dispatch_install(&self, job: &UpdateJob, today: NaiveDate) -> Result<InstallDispatch> {
        if job.install_event.is_empty() {
            info!(id = %job.target.id, "no install event configured; dispatch skipped");
            return Ok(InstallDispatch::skipped());
        }

        // A fresh cycle for this identifier starts with a fresh budget.
        if let Err(err) = self.ledger.remove(&job.target.id) {
            warn!(id = %job.target.id, %err, "deferral ledger removal failed; continuing");
        }

        let dispatch = self.collab.installer.run_policy(&job.install_event)?;
        // Attempt-based: the receipt date is written regardless of the
        // installer's own exit status.
        self.receipts.record_install(&job.target.id, today)?;
        match dispatch.status {
            status if status.is_success() => {
                info!(id = %job.target.id, event = %dispatch.event, "install dispatched");
            }
            status => {
                warn!(id = %job.target.id, event = %dispatch.event, ?status,
                      "installer reported failure; not retried here");
            }
        }
        Ok(dispatch)
    }

    fn offer_reopen(&self, target: &UpdateTarget) -> bool {
        let negotiator = Negotiator::new(self.collab.dialogs, self.settings);
        match negotiator.offer_reopen(target) {
            Ok(ReopenChoice::Reopen) => match self.collab.launcher.launch(&target.id) {
                Ok(()) => {
                    info!(id = %target.id, "application relaunched");
                    true
                }
                Err(err) => {
                    warn!(id = %target.id, %err, "relaunch failed");
                    false
                }
            },
            Ok(ReopenChoice::Dismiss) => false,
            Err(err) => {
                warn!(id = %target.id, %err, "completion dialog failed");
                false
            }
        }
    }
}
