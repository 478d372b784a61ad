//! Update targets and jobs.

use crate::id::UpdateId;
use serde::{Deserialize, Serialize};

/// One managed application instance under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTarget {
    /// Opaque stable identifier (platform-specific handle).
    pub id: UpdateId,
    /// Human-readable label for dialogs.
    pub display_name: String,
    /// Caller-supplied flag marking this as a mandatory/emergency patch.
    pub force_requested: bool,
    /// If false, the user is never asked; the update proceeds
    /// unconditionally once eligible.
    pub allow_prompt: bool,
}

impl UpdateTarget {
    pub fn new(id: impl Into<UpdateId>, display_name: impl Into<String>) -> Self {
        UpdateTarget {
            id: id.into(),
            display_name: display_name.into(),
            force_requested: false,
            allow_prompt: true,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_requested = true;
        self
    }

    pub fn without_prompt(mut self) -> Self {
        self.allow_prompt = false;
        self
    }
}

/// A fully resolved unit of work for one decision cycle.
///
/// The target says *what* is being updated; the job adds the installer
/// policy events and the deferral budget the caller resolved for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateJob {
    pub target: UpdateTarget,
    /// Event trigger handed to the installer to apply the package.
    /// Empty means "no install policy configured" and dispatch is a no-op.
    pub install_event: String,
    /// Event trigger a scheduled retry fires to re-enter this flow.
    pub retry_event: String,
    /// Configured deferral budget for this identifier.
    pub defer_limit: u32,
}

impl UpdateJob {
    pub fn new(target: UpdateTarget, install_event: impl Into<String>, defer_limit: u32) -> Self {
        let install_event = install_event.into();
        UpdateJob {
            target,
            retry_event: install_event.clone(),
            install_event,
            defer_limit,
        }
    }

    pub fn with_retry_event(mut self, event: impl Into<String>) -> Self {
        self.retry_event = event.into();
        self
    }
}
