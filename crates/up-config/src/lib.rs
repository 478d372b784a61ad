//! Update Patrol configuration.
//!
//! Organization name, icon path, thresholds, and the deferral menu live
//! here as one immutable [`Settings`] value constructed at startup and
//! passed explicitly to every component; no ambient globals.
//!
//! Resolution precedence: CLI overrides, then environment, then defaults.

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_settings, SettingsOverrides};
pub use settings::Settings;
pub use validate::{validate, ValidationIssue};

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment value for {var}: {detail}")]
    Env { var: &'static str, detail: String },

    #[error("no usable state directory; set UP_STATE_DIR")]
    NoStateDir,

    #[error("invalid settings: {0}")]
    Invalid(String),
}
