mod availability;
mod conflict;
mod error;
mod lifecycle;
mod locks;
mod mutations;
mod queries;
mod validator;

pub use availability::{BlockReason, SlotState, WindowDecision, can_schedule_window, slot_state};
pub use conflict::overlapping_appointments;
pub use error::StoreError;
pub use lifecycle::{allowed_next, can_transition, check_transition};
pub use locks::derive_locks;
pub use validator::preflight;

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use ulid::Ulid;

use crate::clock::Clock;
use crate::directory::Directory;
use crate::model::{AuditKind, SessionId, StoreState};
use crate::notify::{NotifyHub, StoreEvent};
use crate::observability;
use crate::persist::StatePort;

/// The optimistic-concurrency store: sole writer of canonical appointment
/// state. Every mutating command is a read-modify-write over the injected
/// persistence port; the global no-overlap invariant is re-validated at
/// commit time regardless of what the advisory validator said earlier.
///
/// One `Scheduler` is one session. The commit mutex serializes commits
/// within this process; across processes the last full blob written wins
/// (optimistic, not serializable; the overlap re-check is the backstop).
pub struct Scheduler {
    port: Arc<dyn StatePort>,
    directory: Arc<Directory>,
    clock: Arc<dyn Clock>,
    notify: NotifyHub,
    session: SessionId,
    commit_lock: Mutex<()>,
}

impl Scheduler {
    /// Load or generate the session identity and seed the state blob on
    /// first use.
    pub async fn connect(
        port: Arc<dyn StatePort>,
        directory: Arc<Directory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let session = match port.session().await? {
            Some(s) => s,
            None => {
                let s = SessionId::generate();
                port.set_session(s).await?;
                s
            }
        };
        Self::with_session(port, directory, clock, session).await
    }

    /// Connect with an explicitly injected session identity. This is how
    /// multiple sessions share one state blob while keeping their own
    /// ownership tokens.
    pub async fn with_session(
        port: Arc<dyn StatePort>,
        directory: Arc<Directory>,
        clock: Arc<dyn Clock>,
        session: SessionId,
    ) -> Result<Self, StoreError> {
        if port.load().await?.is_none() {
            port.save(&StoreState::seed(clock.now_ms())).await?;
        }
        tracing::info!(session = %session, "scheduler connected");
        Ok(Self {
            port,
            directory,
            clock,
            notify: NotifyHub::new(),
            session,
            commit_lock: Mutex::new(()),
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Subscribe to commits touching one therapist's timeline.
    pub fn subscribe(&self, therapist_id: Ulid) -> broadcast::Receiver<StoreEvent> {
        self.notify.subscribe(therapist_id)
    }

    pub(super) async fn load_state(&self) -> Result<StoreState, StoreError> {
        Ok(self
            .port
            .load()
            .await?
            .unwrap_or_else(|| StoreState::seed(self.clock.now_ms())))
    }

    pub(super) fn now_ms(&self) -> crate::model::Ms {
        self.clock.now_ms()
    }

    /// Final step of every mutation: bump the version by exactly one, stamp
    /// `updated_at`, persist the whole blob, then announce the commit.
    /// Nothing is visible to other readers until the save returns.
    pub(super) async fn commit(
        &self,
        mut state: StoreState,
        appointment_id: Ulid,
        therapist_id: Ulid,
        kind: AuditKind,
    ) -> Result<u64, StoreError> {
        state.version += 1;
        state.updated_at = self.clock.now_ms();
        self.port.save(&state).await?;
        metrics::gauge!(observability::STORE_VERSION).set(state.version as f64);
        tracing::info!(
            version = state.version,
            appointment = %appointment_id,
            kind = ?kind,
            "committed"
        );
        self.notify.send(StoreEvent {
            store_version: state.version,
            appointment_id,
            therapist_id,
            kind,
        });
        Ok(state.version)
    }
}
