use crate::model::{Appointment, LockReason, SessionId, SlotLock};

/// Project other sessions' live bookings into transient locks for the
/// requesting session. A session can always move its own bookings, so its
/// own records never lock it out; everyone else's non-cancelled booking is
/// a hard obstacle until the next refresh. Locks are rebuilt on every read
/// and never outlive it.
pub fn derive_locks(appointments: &[Appointment], session: SessionId) -> Vec<SlotLock> {
    appointments
        .iter()
        .filter(|a| !a.is_cancelled() && a.created_by != session)
        .map(|a| SlotLock {
            therapist_id: a.therapist_id,
            span: a.span,
            locked_by: a.created_by,
            reason: LockReason::Booked,
        })
        .collect()
}
