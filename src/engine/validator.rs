use ulid::Ulid;

use crate::calendar::date_of;
use crate::directory::Directory;
use crate::model::{Appointment, SessionId, Span};

use super::availability::{WindowDecision, can_schedule_window};
use super::locks::derive_locks;

/// Advisory pre-flight gate for a scheduling command: derives the
/// requesting session's locks and runs the window check against them.
/// Purely for fast user feedback: locks are only as fresh as the caller's
/// last fetch, so the store re-validates independently at commit time.
pub fn preflight(
    directory: &Directory,
    appointments: &[Appointment],
    session: SessionId,
    therapist_id: Ulid,
    window: Span,
    ignore: Option<Ulid>,
) -> WindowDecision {
    let locks = derive_locks(appointments, session);
    let therapist = directory.therapist(&therapist_id);
    let time_away = directory.time_away_for(&therapist_id, date_of(window.start));
    can_schedule_window(
        therapist.as_ref(),
        &window,
        &time_away,
        appointments,
        &locks,
        session,
        ignore,
    )
}
