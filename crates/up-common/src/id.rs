//! Update identity types.
//!
//! An [`UpdateId`] is the stable key naming one manageable application and
//! its update cycle. The platform decides what the string means (a bundle
//! identifier, a package name); this crate only requires that it stays
//! stable across invocations, because ledger records, install receipts, and
//! retry timers are all keyed by it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque stable identifier for one managed application / update cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateId(pub String);

impl UpdateId {
    pub fn new(id: impl Into<String>) -> Self {
        UpdateId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename-safe form of the identifier.
    ///
    /// Record and timer files embed the identifier in their names; whitespace
    /// and path separators are stripped so the key survives as one path
    /// component.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '/' && *c != '\\')
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UpdateId {
    fn from(s: &str) -> Self {
        UpdateId(s.to_string())
    }
}
