//! Live Unix implementations of the collaborator contracts.
//!
//! Process lookup delegates to `pgrep`; signal delivery uses `libc::kill`
//! directly. The installer, dialog helper, timer loader, and launcher are
//! external programs whose paths come from [`up_config::Settings`].

use super::{
    AppLauncher, BusyProbe, DialogPresenter, InstallRunner, ProcessControl, ProcessProbe,
    TimerHost,
};
use crate::negotiate::{DialogRequest, DialogSignal};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use up_common::{DispatchStatus, Error, InstallDispatch, Result, UpdateId};

fn process_err(id: &UpdateId, detail: impl std::fmt::Display) -> Error {
    Error::Process {
        id: id.to_string(),
        detail: detail.to_string(),
    }
}

/// List PIDs whose command line matches the pattern.
fn pgrep(args: &[&str]) -> std::io::Result<Option<Vec<u32>>> {
    let output = Command::new("pgrep")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()?;
    // pgrep exits 1 when nothing matched.
    if output.status.code() == Some(1) {
        return Ok(Some(Vec::new()));
    }
    if !output.status.success() {
        return Ok(None);
    }
    let pids = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect();
    Ok(Some(pids))
}

/// Process inspection by identifier pattern.
#[derive(Debug, Default)]
pub struct LiveProcessProbe;

impl ProcessProbe for LiveProcessProbe {
    fn is_running(&self, id: &UpdateId) -> Result<bool> {
        match pgrep(&["-f", id.as_str()]) {
            Ok(Some(pids)) => Ok(!pids.is_empty()),
            Ok(None) => Err(process_err(id, "pgrep failed")),
            Err(err) => Err(process_err(id, err)),
        }
    }
}

/// Signal-based process control.
#[derive(Debug, Default)]
pub struct LiveProcessControl;

impl LiveProcessControl {
    fn signal_all(&self, id: &UpdateId, signal: i32) -> Result<()> {
        let pids = match pgrep(&["-f", id.as_str()]) {
            Ok(Some(pids)) => pids,
            Ok(None) => return Err(process_err(id, "pgrep failed")),
            Err(err) => return Err(process_err(id, err)),
        };
        for pid in pids {
            let rc = unsafe { libc::kill(pid as i32, signal) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                // The process may have exited between lookup and signal.
                if err.raw_os_error() == Some(libc::ESRCH) {
                    continue;
                }
                return Err(process_err(id, err));
            }
        }
        Ok(())
    }
}

impl ProcessControl for LiveProcessControl {
    fn request_graceful_quit(&self, id: &UpdateId) -> Result<()> {
        self.signal_all(id, libc::SIGTERM)
    }

    fn request_force_quit(&self, id: &UpdateId) -> Result<()> {
        self.signal_all(id, libc::SIGKILL)
    }
}

/// Relaunch via an external opener program.
#[derive(Debug)]
pub struct LiveAppLauncher {
    program: PathBuf,
}

impl LiveAppLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LiveAppLauncher {
            program: program.into(),
        }
    }
}

impl AppLauncher for LiveAppLauncher {
    fn launch(&self, id: &UpdateId) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("-b")
            .arg(id.as_str())
            .status()
            .map_err(|err| process_err(id, err))?;
        if !status.success() {
            return Err(process_err(id, format!("launcher exited {status}")));
        }
        Ok(())
    }
}

/// Busy probe matching an exact process name.
#[derive(Debug)]
pub struct LiveBusyProbe {
    process_name: String,
}

impl LiveBusyProbe {
    pub fn new(process_name: impl Into<String>) -> Self {
        LiveBusyProbe {
            process_name: process_name.into(),
        }
    }
}

impl BusyProbe for LiveBusyProbe {
    fn is_busy(&self) -> Result<bool> {
        match pgrep(&["-x", &self.process_name]) {
            Ok(Some(pids)) => Ok(!pids.is_empty()),
            Ok(None) => Err(Error::Process {
                id: self.process_name.clone(),
                detail: "pgrep failed".into(),
            }),
            Err(err) => Err(Error::Process {
                id: self.process_name.clone(),
                detail: err.to_string(),
            }),
        }
    }
}

/// Installer trigger via the fleet-management agent binary.
#[derive(Debug)]
pub struct LiveInstallRunner {
    program: PathBuf,
}

impl LiveInstallRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LiveInstallRunner {
            program: program.into(),
        }
    }
}

impl InstallRunner for LiveInstallRunner {
    fn run_policy(&self, event: &str) -> Result<InstallDispatch> {
        if event.is_empty() {
            return Ok(InstallDispatch::skipped());
        }
        debug!(event, program = %self.program.display(), "running install policy");
        let status = Command::new(&self.program)
            .args(["policy", "-event", event])
            .status()
            .map_err(|err| Error::Install {
                event: event.to_string(),
                detail: err.to_string(),
            })?;
        let status = if status.success() {
            DispatchStatus::Succeeded
        } else {
            DispatchStatus::Failed {
                code: status.code(),
            }
        };
        Ok(InstallDispatch {
            event: event.to_string(),
            status,
        })
    }
}

/// Durable timer registration via an external loader program.
#[derive(Debug)]
pub struct LiveTimerHost {
    program: PathBuf,
}

impl LiveTimerHost {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LiveTimerHost {
            program: program.into(),
        }
    }
}

impl TimerHost for LiveTimerHost {
    fn load(&self, timer_file: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("load")
            .arg("-w")
            .arg(timer_file)
            .status()
            .map_err(|err| Error::Timer {
                label: timer_file.display().to_string(),
                detail: err.to_string(),
            })?;
        if !status.success() {
            return Err(Error::Timer {
                label: timer_file.display().to_string(),
                detail: format!("loader exited {status}"),
            });
        }
        Ok(())
    }
}

/// Dialog presentation with a supervisory wall-clock bound.
///
/// The dialog subprocess is polled with `try_wait`; once the bound expires
/// the child is killed and the signal reported as timed out, so a stuck
/// dialog can never wedge the cycle.
#[derive(Debug)]
pub struct LiveDialogPresenter {
    program: PathBuf,
    supervisory_timeout: Duration,
    poll_interval: Duration,
}

impl LiveDialogPresenter {
    pub fn new(program: impl Into<PathBuf>, supervisory_timeout: Duration) -> Self {
        LiveDialogPresenter {
            program: program.into(),
            supervisory_timeout,
            poll_interval: Duration::from_millis(100),
        }
    }

    fn build_args(request: &DialogRequest) -> Vec<String> {
        let mut args = vec![
            "-windowType".into(),
            "utility".into(),
            "-title".into(),
            request.title.clone(),
            "-icon".into(),
            request.icon.display().to_string(),
            "-button1".into(),
            "OK".into(),
        ];
        if request.cancel_button {
            args.push("-button2".into());
            args.push("Cancel".into());
        }
        if request.default_accept {
            args.push("-defaultButton".into());
            args.push("1".into());
        }
        if let Some(timeout) = request.response_timeout_secs {
            args.push("-timeout".into());
            args.push(timeout.to_string());
        }
        if let Some(menu) = &request.show_delay_options {
            let joined = menu
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            args.push("-showDelayOptions".into());
            args.push(joined);
        }
        args.push("-description".into());
        args.push(request.description.clone());
        args
    }
}

impl DialogPresenter for LiveDialogPresenter {
    fn present(&self, request: &DialogRequest) -> Result<DialogSignal> {
        let args = Self::build_args(request);
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| Error::Dialog(format!("spawn failed: {err}")))?;

        let deadline = Instant::now() + self.supervisory_timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_status)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        warn!(timeout_secs = self.supervisory_timeout.as_secs(),
                              "dialog outlived its timeout; killing");
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(DialogSignal::TimedOut);
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Err(err) => {
                    let _ = child.kill();
                    return Err(Error::Dialog(format!("wait failed: {err}")));
                }
            }
        }

        let mut raw = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout
                .read_to_string(&mut raw)
                .map_err(|err| Error::Dialog(format!("read failed: {err}")))?;
        }
        Ok(DialogSignal::Resolved(raw.trim().to_string()))
    }
}
