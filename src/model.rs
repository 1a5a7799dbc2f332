use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds, the only timestamp type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Touching endpoints do not overlap: `[9:00,10:00)` vs `[10:00,11:00)` is false.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Opaque token identifying the acting client for ownership checks.
/// Not a security credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Ulid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Recurring weekly availability window for one therapist.
/// Minutes are minute-of-day: 480 = 08:00, 960 = 16:00.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_min: u32,
    pub end_min: u32,
    pub active_weekdays: Vec<Weekday>,
}

impl WorkingHours {
    pub fn works_on(&self, day: Weekday) -> bool {
        self.active_weekdays.contains(&day)
    }
}

/// A schedulable resource. Reference data, never mutated by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Therapist {
    pub id: Ulid,
    pub name: String,
    pub role: String,
    pub clinic_id: Ulid,
    pub working_hours: WorkingHours,
}

/// One-off blackout window for a therapist on a specific date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAway {
    pub therapist_id: Ulid,
    pub date: NaiveDate,
    pub start_min: u32,
    pub end_min: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    CheckIn,
    InProgress,
    Completed,
    Incomplete,
    /// Reached only through the cancel command, never the transition table.
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::CheckIn => "check-in",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Incomplete => "incomplete",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    Created,
    Rescheduled,
    Cancelled,
    StatusChange,
}

/// What changed, for the `from`/`to` sides of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditDelta {
    Window { start: Ms, end: Ms },
    Status(AppointmentStatus),
    Booking { start: Ms, end: Ms, status: AppointmentStatus },
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at: Ms,
    pub by: SessionId,
    pub kind: AuditKind,
    pub from: Option<AuditDelta>,
    pub to: Option<AuditDelta>,
    pub note: Option<String>,
}

impl AuditEvent {
    pub fn created(at: Ms, by: SessionId, span: Span, status: AppointmentStatus) -> Self {
        Self {
            at,
            by,
            kind: AuditKind::Created,
            from: None,
            to: Some(AuditDelta::Booking { start: span.start, end: span.end, status }),
            note: None,
        }
    }

    pub fn rescheduled(at: Ms, by: SessionId, from: Span, to: Span) -> Self {
        Self {
            at,
            by,
            kind: AuditKind::Rescheduled,
            from: Some(AuditDelta::Window { start: from.start, end: from.end }),
            to: Some(AuditDelta::Window { start: to.start, end: to.end }),
            note: None,
        }
    }

    pub fn reassigned(at: Ms, by: SessionId, from_therapist: Ulid, to_therapist: Ulid) -> Self {
        Self {
            at,
            by,
            kind: AuditKind::Rescheduled,
            from: None,
            to: None,
            note: Some(format!("reassigned from {from_therapist} to {to_therapist}")),
        }
    }

    pub fn status_change(
        at: Ms,
        by: SessionId,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Self {
        Self {
            at,
            by,
            kind: AuditKind::StatusChange,
            from: Some(AuditDelta::Status(from)),
            to: Some(AuditDelta::Status(to)),
            note: None,
        }
    }

    pub fn cancelled(at: Ms, by: SessionId) -> Self {
        Self {
            at,
            by,
            kind: AuditKind::Cancelled,
            from: None,
            to: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Ulid,
    pub clinic_id: Ulid,
    pub therapist_id: Ulid,
    pub subject: String,
    pub span: Span,
    /// Appointment type tag, e.g. "intake".
    pub kind: String,
    /// Delivery mode tag, e.g. "in-person".
    pub mode: String,
    pub status: AppointmentStatus,
    pub created_by: SessionId,
    pub updated_at: Ms,
    pub cancelled_at: Option<Ms>,
    pub cancelled_by: Option<SessionId>,
    /// Append-only; the first entry is always `Created`.
    pub audit: Vec<AuditEvent>,
}

impl Appointment {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

/// Request payload for creating an appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub clinic_id: Ulid,
    pub therapist_id: Ulid,
    pub subject: String,
    pub span: Span,
    pub kind: String,
    pub mode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    Booked,
}

/// Transient marker for another session's existing booking.
/// Derived on every read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLock {
    pub therapist_id: Ulid,
    pub span: Span,
    pub locked_by: SessionId,
    pub reason: LockReason,
}

/// Bundle returned by every fetch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub appointments: Vec<Appointment>,
    pub locks: Vec<SlotLock>,
    pub server_time: Ms,
    pub store_version: u64,
}

/// The persisted blob: canonical appointment list plus version metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u64,
    pub updated_at: Ms,
    pub appointments: Vec<Appointment>,
}

impl StoreState {
    pub fn seed(now: Ms) -> Self {
        Self {
            version: 0,
            updated_at: now,
            appointments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn touching_clock_boundary_is_not_overlap() {
        // 09:00–10:00 vs 10:00–11:00
        let h = 3_600_000;
        let a = Span::new(9 * h, 10 * h);
        let b = Span::new(10 * h, 11 * h);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn working_hours_weekday_membership() {
        let wh = WorkingHours {
            start_min: 480,
            end_min: 960,
            active_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        };
        assert!(wh.works_on(Weekday::Mon));
        assert!(!wh.works_on(Weekday::Sat));
    }

    #[test]
    fn audit_created_shape() {
        let by = SessionId::generate();
        let e = AuditEvent::created(1000, by, Span::new(0, 100), AppointmentStatus::Scheduled);
        assert_eq!(e.kind, AuditKind::Created);
        assert!(e.from.is_none());
        assert_eq!(
            e.to,
            Some(AuditDelta::Booking {
                start: 0,
                end: 100,
                status: AppointmentStatus::Scheduled
            })
        );
    }

    #[test]
    fn audit_cancelled_carries_no_delta() {
        let e = AuditEvent::cancelled(5, SessionId::generate());
        assert_eq!(e.kind, AuditKind::Cancelled);
        assert!(e.from.is_none());
        assert!(e.to.is_none());
    }

    #[test]
    fn state_serialization_roundtrip() {
        let by = SessionId::generate();
        let appt = Appointment {
            id: Ulid::new(),
            clinic_id: Ulid::new(),
            therapist_id: Ulid::new(),
            subject: "Patient A".into(),
            span: Span::new(1000, 2000),
            kind: "intake".into(),
            mode: "in-person".into(),
            status: AppointmentStatus::Scheduled,
            created_by: by,
            updated_at: 1000,
            cancelled_at: None,
            cancelled_by: None,
            audit: vec![AuditEvent::created(
                1000,
                by,
                Span::new(1000, 2000),
                AppointmentStatus::Scheduled,
            )],
        };
        let state = StoreState {
            version: 3,
            updated_at: 1000,
            appointments: vec![appt],
        };
        let bytes = bincode::serialize(&state).unwrap();
        let decoded: StoreState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(state, decoded);
    }

    #[test]
    fn seed_state_is_empty_at_version_zero() {
        let state = StoreState::seed(42);
        assert_eq!(state.version, 0);
        assert_eq!(state.updated_at, 42);
        assert!(state.appointments.is_empty());
    }
}
