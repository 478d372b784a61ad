//! Scripted collaborator doubles for integration tests.
//!
//! Each double records what the engine asked of it and replays a scripted
//! answer, so cycle tests can assert both the outcome and the exact
//! sequence of side effects without touching real processes or dialogs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use up_common::{DispatchStatus, InstallDispatch, Result, UpdateId};
use up_core::host::{
    AppLauncher, BusyProbe, DialogPresenter, InstallRunner, ProcessControl, ProcessProbe,
    TimerHost,
};
use up_core::negotiate::{DialogRequest, DialogSignal};

/// Probe replaying a scripted run of answers, then a default.
pub struct ScriptedProbe {
    answers: RefCell<VecDeque<bool>>,
    default: bool,
}

impl ScriptedProbe {
    pub fn new(answers: Vec<bool>, default: bool) -> Self {
        ScriptedProbe {
            answers: RefCell::new(answers.into()),
            default,
        }
    }

    /// Target is not running at all.
    pub fn idle() -> Self {
        Self::new(Vec::new(), false)
    }

    /// Target is running, then exits as soon as termination starts.
    pub fn running_then_exits() -> Self {
        Self::new(vec![true], false)
    }

    /// Target never stops running.
    pub fn stubborn() -> Self {
        Self::new(Vec::new(), true)
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_running(&self, _id: &UpdateId) -> Result<bool> {
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(self.default))
    }
}

#[derive(Default)]
pub struct RecordingControl {
    pub graceful: RefCell<u32>,
    pub forced: RefCell<u32>,
}

impl ProcessControl for RecordingControl {
    fn request_graceful_quit(&self, _id: &UpdateId) -> Result<()> {
        *self.graceful.borrow_mut() += 1;
        Ok(())
    }

    fn request_force_quit(&self, _id: &UpdateId) -> Result<()> {
        *self.forced.borrow_mut() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: RefCell<Vec<UpdateId>>,
}

impl AppLauncher for RecordingLauncher {
    fn launch(&self, id: &UpdateId) -> Result<()> {
        self.launched.borrow_mut().push(id.clone());
        Ok(())
    }
}

pub struct StaticBusyProbe {
    pub busy: bool,
}

impl BusyProbe for StaticBusyProbe {
    fn is_busy(&self) -> Result<bool> {
        Ok(self.busy)
    }
}

pub struct RecordingInstaller {
    pub events: RefCell<Vec<String>>,
    pub status: DispatchStatus,
}

impl RecordingInstaller {
    pub fn succeeding() -> Self {
        RecordingInstaller {
            events: RefCell::new(Vec::new()),
            status: DispatchStatus::Succeeded,
        }
    }

    pub fn failing(code: i32) -> Self {
        RecordingInstaller {
            events: RefCell::new(Vec::new()),
            status: DispatchStatus::Failed { code: Some(code) },
        }
    }
}

impl InstallRunner for RecordingInstaller {
    fn run_policy(&self, event: &str) -> Result<InstallDispatch> {
        if event.is_empty() {
            return Ok(InstallDispatch::skipped());
        }
        self.events.borrow_mut().push(event.to_string());
        Ok(InstallDispatch {
            event: event.to_string(),
            status: self.status,
        })
    }
}

#[derive(Default)]
pub struct RecordingTimerHost {
    pub loaded: RefCell<Vec<PathBuf>>,
}

impl TimerHost for RecordingTimerHost {
    fn load(&self, timer_file: &Path) -> Result<()> {
        self.loaded.borrow_mut().push(timer_file.to_path_buf());
        Ok(())
    }
}

/// Dialog presenter replaying scripted signals in call order.
///
/// Once the script runs dry every further prompt resolves to the cancel
/// button. Presented requests are recorded for assertions.
pub struct ScriptedDialog {
    signals: RefCell<VecDeque<DialogSignal>>,
    pub presented: RefCell<Vec<DialogRequest>>,
}

impl ScriptedDialog {
    pub fn new(signals: Vec<DialogSignal>) -> Self {
        ScriptedDialog {
            signals: RefCell::new(signals.into()),
            presented: RefCell::new(Vec::new()),
        }
    }

    pub fn resolving(raw: &str) -> Self {
        Self::new(vec![DialogSignal::Resolved(raw.to_string())])
    }

    pub fn presented_count(&self) -> usize {
        self.presented.borrow().len()
    }
}

impl DialogPresenter for ScriptedDialog {
    fn present(&self, request: &DialogRequest) -> Result<DialogSignal> {
        self.presented.borrow_mut().push(request.clone());
        Ok(self
            .signals
            .borrow_mut()
            .pop_front()
            .unwrap_or(DialogSignal::Resolved("2".to_string())))
    }
}
