//! CLI surface tests for up-core.
//!
//! Verify that invalid arguments produce clap errors, that the stable exit
//! codes hold for argument-level failures, and that `check` emits its JSON
//! payload on stdout.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn up_core() -> Command {
    Command::cargo_bin("up-core").expect("up-core binary should exist")
}

mod invalid_arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        up_core()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn run_requires_app_id() {
        up_core()
            .args(["run", "--app-name", "Example"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--app-id"));
    }

    #[test]
    fn run_requires_app_name() {
        up_core()
            .args(["run", "--app-id", "com.example.app"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--app-name"));
    }

    #[test]
    fn unknown_global_flag_fails() {
        up_core()
            .arg("--nonexistent-flag")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn invalid_log_level_fails() {
        up_core()
            .args(["--log-level", "loud", "version"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn invalid_defer_limit_fails() {
        up_core()
            .args([
                "run",
                "--app-id",
                "com.example.app",
                "--app-name",
                "Example",
                "--defer-limit",
                "lots",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn blank_app_id_exits_with_args_error() {
        let state = tempdir().unwrap();
        up_core()
            .env_clear()
            .args([
                "--state-dir",
                state.path().to_str().unwrap(),
                "run",
                "--app-id",
                "   ",
                "--app-name",
                "Example",
            ])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("--app-id"));
    }
}

mod payloads {
    use super::*;

    #[test]
    fn help_describes_the_cycle() {
        up_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("check"));
    }

    #[test]
    fn version_prints_package_version() {
        up_core()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn check_emits_settings_summary_on_stdout() {
        let state = tempdir().unwrap();
        up_core()
            .env_clear()
            .args(["--state-dir", state.path().to_str().unwrap(), "check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"ok\": true"))
            .stdout(predicate::str::contains("\"sla_days\": 120"));
    }

    #[test]
    fn check_honors_org_name_override() {
        let state = tempdir().unwrap();
        up_core()
            .env_clear()
            .args([
                "--state-dir",
                state.path().to_str().unwrap(),
                "--org-name",
                "Example Corp",
                "check",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Example Corp"));
    }
}
