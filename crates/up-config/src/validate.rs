//! Semantic validation of resolved settings.

use crate::settings::Settings;
use crate::ConfigError;

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn issue(field: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        field,
        message: message.into(),
    }
}

/// Collect every semantic problem with the settings.
pub fn check(settings: &Settings) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if settings.org_name.trim().is_empty() {
        issues.push(issue("org_name", "must not be empty; it appears in every dialog"));
    }
    if settings.sla_days <= 0 {
        issues.push(issue("sla_days", "must be positive"));
    }
    if settings.defer_menu.is_empty() {
        issues.push(issue("defer_menu", "must offer at least one duration"));
    }
    if settings.defer_menu.windows(2).any(|w| w[0] >= w[1]) {
        issues.push(issue("defer_menu", "durations must be strictly increasing"));
    }
    if settings.dialog_timeout_secs == 0 {
        issues.push(issue("dialog_timeout_secs", "must be positive"));
    }
    if settings.reopen_timeout_secs == 0 {
        issues.push(issue("reopen_timeout_secs", "must be positive"));
    }
    if settings.retry_after_secs == 0 {
        issues.push(issue("retry_after_secs", "must be positive"));
    }
    if settings.conflict_max_polls == 0 {
        issues.push(issue("conflict_max_polls", "must poll at least once"));
    }
    if settings.timer_label_prefix.trim().is_empty() {
        issues.push(issue("timer_label_prefix", "must not be empty"));
    }

    issues
}

/// Validate or fail with a joined error.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let issues = check(settings);
    if issues.is_empty() {
        return Ok(());
    }
    let joined = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(ConfigError::Invalid(joined))
}
