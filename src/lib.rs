//! Scheduling conflict & availability core for multi-session appointment
//! booking against a shared pool of therapists.
//!
//! The [`engine::Scheduler`] is the sole writer of canonical state: it
//! re-validates the global no-overlap invariant at commit time over an
//! injected [`persist::StatePort`], while the resolver, validator and
//! slot-lock deriver give callers fast advisory answers before they commit.

pub mod calendar;
pub mod clock;
pub mod directory;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod persist;
