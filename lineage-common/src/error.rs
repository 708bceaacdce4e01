//! Common error types for the lineage core

use crate::service::FetchError;
use crate::slots::SlotKey;
use thiserror::Error;

/// Common result type for lineage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the composition core
///
/// None of these are fatal. Every variant leaves the session in a
/// previously-valid (or empty) state.
#[derive(Error, Debug)]
pub enum Error {
    /// Attempted commit of a selection the slot does not allow
    #[error("Constraint violation: '{id}' is not allowed in slot {slot}")]
    ConstraintViolation { slot: SlotKey, id: String },

    /// Roster, affinity, stats or optimize call failed
    #[error("Fetch failure: {0}")]
    Fetch(#[from] FetchError),

    /// Operation requires state that is not there yet (usually a child)
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn no_child(action: &str) -> Self {
        Error::PreconditionNotMet(format!("{} requires a child to be selected", action))
    }
}
