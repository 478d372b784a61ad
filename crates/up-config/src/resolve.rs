//! Settings resolution: CLI overrides → environment → defaults.

use crate::settings::Settings;
use crate::ConfigError;
use std::path::PathBuf;

/// Caller-supplied overrides, typically from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub state_dir: Option<PathBuf>,
    pub org_name: Option<String>,
    pub defer_limit: Option<u32>,
}

fn env_path(var: &'static str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

fn env_string(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) if !raw.is_empty() => raw.parse::<T>().map(Some).map_err(|e| ConfigError::Env {
            var,
            detail: e.to_string(),
        }),
        _ => Ok(None),
    }
}

/// Default state directory when neither CLI nor environment provides one.
///
/// Falls back to the per-user local data directory; fleet deployments are
/// expected to pin `UP_STATE_DIR` to a machine-wide path.
fn default_state_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("update-patrol"))
}

/// Resolve the effective settings.
pub fn resolve_settings(overrides: SettingsOverrides) -> Result<Settings, ConfigError> {
    let state_dir = overrides
        .state_dir
        .or_else(|| env_path("UP_STATE_DIR"))
        .or_else(default_state_dir)
        .ok_or(ConfigError::NoStateDir)?;

    let mut settings = Settings::with_state_dir(state_dir);

    if let Some(org) = overrides.org_name.or_else(|| env_string("UP_ORG_NAME")) {
        settings.org_name = org;
    }
    if let Some(limit) = overrides.defer_limit {
        settings.defer_limit = limit;
    } else if let Some(limit) = env_parse::<u32>("UP_DEFER_LIMIT")? {
        settings.defer_limit = limit;
    }
    if let Some(days) = env_parse::<i64>("UP_SLA_DAYS")? {
        settings.sla_days = days;
    }
    if let Some(icon) = env_path("UP_ICON") {
        settings.icon_path = icon;
    }
    if let Some(process) = env_string("UP_CONFLICT_PROCESS") {
        settings.conflict_process = process;
    }
    if let Some(program) = env_path("UP_INSTALLER_PROGRAM") {
        settings.installer_program = program;
    }
    if let Some(program) = env_path("UP_DIALOG_PROGRAM") {
        settings.dialog_program = program;
    }
    if let Some(program) = env_path("UP_TIMER_LOAD_PROGRAM") {
        settings.timer_load_program = program;
    }
    if let Some(program) = env_path("UP_LAUNCHER_PROGRAM") {
        settings.launcher_program = program;
    }

    crate::validate::validate(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence() {
        let settings = resolve_settings(SettingsOverrides {
            state_dir: Some(PathBuf::from("/tmp/up-test-state")),
            org_name: Some("Example Corp".into()),
            defer_limit: Some(3),
        })
        .expect("resolve");

        assert_eq!(settings.state_dir, PathBuf::from("/tmp/up-test-state"));
        assert_eq!(settings.org_name, "Example Corp");
        assert_eq!(settings.defer_limit, 3);
    }

    #[test]
    fn defaults_fill_the_rest() {
        let settings = resolve_settings(SettingsOverrides {
            state_dir: Some(PathBuf::from("/tmp/up-test-state")),
            ..Default::default()
        })
        .expect("resolve");

        assert_eq!(settings.sla_days, 120);
        assert!(!settings.defer_menu.is_empty());
    }
}
