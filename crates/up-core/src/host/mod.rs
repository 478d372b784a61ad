//! Collaborator contracts the engine depends on.
//!
//! Everything the decision cycle needs from the operating environment sits
//! behind one of these traits: process inspection/control, app relaunch,
//! dialog presentation, the installer trigger, the durable timer scheduler,
//! and the busy probe for conflict detection. Live Unix implementations are
//! in [`unix`]; tests inject scripted doubles.

use crate::negotiate::{DialogRequest, DialogSignal};
use std::path::Path;
use up_common::{InstallDispatch, Result, UpdateId};

#[cfg(unix)]
pub mod unix;

/// Host process-inspection capability.
pub trait ProcessProbe {
    fn is_running(&self, id: &UpdateId) -> Result<bool>;
}

/// Host process-control capability. Signals are fire-and-forget; there is
/// no synchronous confirmation, callers poll [`ProcessProbe`] instead.
pub trait ProcessControl {
    fn request_graceful_quit(&self, id: &UpdateId) -> Result<()>;
    fn request_force_quit(&self, id: &UpdateId) -> Result<()>;
}

/// App relaunch capability.
pub trait AppLauncher {
    fn launch(&self, id: &UpdateId) -> Result<()>;
}

/// Probe for interfering foreground activity.
pub trait BusyProbe {
    fn is_busy(&self) -> Result<bool>;
}

/// Fleet-management installer trigger. An empty event name is a no-op,
/// not an error.
pub trait InstallRunner {
    fn run_policy(&self, event: &str) -> Result<InstallDispatch>;
}

/// Durable one-shot timer scheduler. Registration consumes a timer
/// definition file; unregistration is direct file removal by the caller.
pub trait TimerHost {
    fn load(&self, timer_file: &Path) -> Result<()>;
}

/// External modal-dialog capability.
pub trait DialogPresenter {
    fn present(&self, request: &DialogRequest) -> Result<DialogSignal>;
}
