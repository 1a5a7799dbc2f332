use ulid::Ulid;

use crate::model::AppointmentStatus;

/// Commit-path failures. Any of these aborts the whole command with no
/// partial state change; staleness is resolved by the caller re-fetching.
/// The advisory pre-flight validator never produces these; it returns a
/// decision value instead.
#[derive(Debug)]
pub enum StoreError {
    /// Appointment or therapist id unknown.
    NotFound(Ulid),
    /// Acting session does not own the record.
    OwnershipViolation(Ulid),
    AlreadyCancelled(Ulid),
    /// Id of the non-cancelled appointment blocking the window.
    OverlapConflict(Ulid),
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    LimitExceeded(&'static str),
    Persistence(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::OwnershipViolation(id) => {
                write!(f, "appointment {id} belongs to another session")
            }
            StoreError::AlreadyCancelled(id) => {
                write!(f, "appointment {id} is already cancelled")
            }
            StoreError::OverlapConflict(id) => {
                write!(f, "window overlaps existing appointment {id}")
            }
            StoreError::IllegalTransition { from, to } => {
                write!(f, "illegal status transition: {from} -> {to}")
            }
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            StoreError::Persistence(e) => write!(f, "persistence error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Persistence(e.to_string())
    }
}
