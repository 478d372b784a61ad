//! Update Patrol shared types.
//!
//! This crate provides the vocabulary used across the workspace:
//! - Update identifiers and the targets they name
//! - Negotiation and cycle outcome enums
//! - The unified error type with stable codes and categories

pub mod error;
pub mod id;
pub mod outcome;
pub mod target;

pub use error::{Error, ErrorCategory, Result};
pub use id::UpdateId;
pub use outcome::{
    CleanupOutcome, CycleOutcome, DispatchStatus, InstallDispatch, NegotiationOutcome,
};
pub use target::{UpdateJob, UpdateTarget};
