//! Update Patrol - Deferral/Escalation Orchestration Engine
//!
//! The entry point for up-core, handling:
//! - One decision cycle per managed application (`run`)
//! - Settings validation (`check`)
//!
//! stdout carries the command payload (a JSON summary); all logging goes to
//! stderr. Exit codes are a stable contract, see `exit_codes`.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use up_common::{CycleOutcome, UpdateId, UpdateJob, UpdateTarget};
use up_config::{resolve_settings, SettingsOverrides};
use up_core::exit_codes::ExitCode;
use up_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};

/// Update Patrol - decides whether and when to interrupt a running app to
/// apply a pending update.
#[derive(Parser)]
#[command(name = "up-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Override the state directory
    #[arg(long, global = true, env = "UP_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Organization name shown in dialogs
    #[arg(long, global = true, env = "UP_ORG_NAME")]
    org_name: Option<String>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one decision cycle for a target application
    Run(RunArgs),

    /// Validate settings and state directories
    Check,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Stable identifier of the application (platform-specific handle)
    #[arg(long)]
    app_id: String,

    /// Human-readable application name for dialogs
    #[arg(long)]
    app_name: String,

    /// Installer policy event that applies the package (empty = no-op)
    #[arg(long, default_value = "")]
    install_event: String,

    /// Policy event a scheduled retry fires (defaults to the install event)
    #[arg(long)]
    retry_event: Option<String>,

    /// Mandatory/emergency patch: terminate forcefully, ignore prompts
    #[arg(long)]
    force: bool,

    /// Never ask the user; proceed unconditionally once eligible
    #[arg(long)]
    no_prompt: bool,

    /// Deferral budget for this identifier
    #[arg(long)]
    defer_limit: Option<u32>,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    app_id: &'a str,
    outcome: CycleOutcome,
    exit_code: i32,
    code_name: &'static str,
}

#[derive(Serialize)]
struct CheckSummary {
    ok: bool,
    state_dir: PathBuf,
    org_name: String,
    sla_days: i64,
    defer_limit: u32,
}

fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let code = dispatch(cli);
    std::process::exit(code.as_i32());
}

fn dispatch(cli: Cli) -> ExitCode {
    let overrides = SettingsOverrides {
        state_dir: cli.global.state_dir.clone(),
        org_name: cli.global.org_name.clone(),
        defer_limit: None,
    };

    match cli.command {
        Commands::Version => {
            println!("up-core {}", env!("CARGO_PKG_VERSION"));
            ExitCode::Installed
        }
        Commands::Check => {
            let settings = match resolve_settings(overrides) {
                Ok(settings) => settings,
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::ConfigError;
                }
            };
            let summary = CheckSummary {
                ok: true,
                state_dir: settings.state_dir.clone(),
                org_name: settings.org_name.clone(),
                sla_days: settings.sla_days,
                defer_limit: settings.defer_limit,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).unwrap_or_default()
            );
            ExitCode::Installed
        }
        Commands::Run(args) => {
            let settings = match resolve_settings(overrides) {
                Ok(settings) => settings,
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::ConfigError;
                }
            };
            run_cycle(args, settings)
        }
    }
}

#[cfg(unix)]
fn run_cycle(args: RunArgs, settings: up_config::Settings) -> ExitCode {
    use std::time::Duration;
    use up_core::host::unix::{
        LiveAppLauncher, LiveBusyProbe, LiveDialogPresenter, LiveInstallRunner,
        LiveProcessControl, LiveProcessProbe, LiveTimerHost,
    };
    use up_core::orchestrator::{Collaborators, Orchestrator};

    if args.app_id.trim().is_empty() {
        eprintln!("error: --app-id must not be empty");
        return ExitCode::ArgsError;
    }

    let probe = LiveProcessProbe;
    let control = LiveProcessControl;
    let launcher = LiveAppLauncher::new(&settings.launcher_program);
    let busy = LiveBusyProbe::new(settings.conflict_process.clone());
    let installer = LiveInstallRunner::new(&settings.installer_program);
    let timers = LiveTimerHost::new(&settings.timer_load_program);
    let dialogs = LiveDialogPresenter::new(
        &settings.dialog_program,
        Duration::from_secs(settings.dialog_timeout_secs),
    );

    let collab = Collaborators {
        probe: &probe,
        control: &control,
        launcher: &launcher,
        busy: &busy,
        installer: &installer,
        timers: &timers,
        dialogs: &dialogs,
    };

    let target = UpdateTarget {
        id: UpdateId::new(args.app_id.clone()),
        display_name: args.app_name,
        force_requested: args.force,
        allow_prompt: !args.no_prompt,
    };
    let defer_limit = args.defer_limit.unwrap_or(settings.defer_limit);
    let retry_event = args
        .retry_event
        .unwrap_or_else(|| args.install_event.clone());
    let job = UpdateJob {
        target,
        install_event: args.install_event,
        retry_event,
        defer_limit,
    };

    let orchestrator = Orchestrator::new(&settings, collab);
    let today = chrono::Local::now().date_naive();

    match orchestrator.run_cycle(&job, today) {
        Ok(outcome) => {
            let code = ExitCode::from(outcome);
            let summary = RunSummary {
                app_id: &args.app_id,
                outcome,
                exit_code: code.as_i32(),
                code_name: code.code_name(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).unwrap_or_default()
            );
            code
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

#[cfg(not(unix))]
fn run_cycle(_args: RunArgs, _settings: up_config::Settings) -> ExitCode {
    eprintln!("error: process control is not supported on this platform");
    ExitCode::InternalError
}
