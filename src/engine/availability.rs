use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use crate::calendar::{date_of, slot_span, weekday_of, window_minutes};
use crate::model::{Appointment, SessionId, SlotLock, Span, Therapist, TimeAway};

// ── Availability Resolver ────────────────────────────────────────

/// Eligibility of one grid slot, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Weekday off, or the window falls outside working hours.
    Off,
    TimeAway,
    Booked,
    Available,
}

/// Why a window cannot be scheduled, in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    TherapistUnknown,
    OutsideWorkingHours,
    TimeAway,
    LockedByOther(SessionId),
    Booked(Ulid),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::TherapistUnknown => write!(f, "therapist not found"),
            BlockReason::OutsideWorkingHours => write!(f, "outside working hours"),
            BlockReason::TimeAway => write!(f, "therapist has time away"),
            BlockReason::LockedByOther(s) => write!(f, "slot locked by session {s}"),
            BlockReason::Booked(id) => write!(f, "overlaps appointment {id}"),
        }
    }
}

/// Decision value of the window check. Never an error; the commit path
/// re-validates independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    Clear,
    Blocked(BlockReason),
}

impl WindowDecision {
    pub fn is_clear(&self) -> bool {
        matches!(self, WindowDecision::Clear)
    }
}

fn minutes_overlap(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && b_start < a_end
}

fn within_hours(therapist: &Therapist, start_min: u32, end_min: u32) -> bool {
    let wh = &therapist.working_hours;
    start_min >= wh.start_min && end_min <= wh.end_min
}

fn time_away_hit(
    therapist_id: Ulid,
    date: NaiveDate,
    start_min: u32,
    end_min: u32,
    time_away: &[TimeAway],
) -> bool {
    time_away.iter().any(|ta| {
        ta.therapist_id == therapist_id
            && ta.date == date
            && minutes_overlap(start_min, end_min, ta.start_min, ta.end_min)
    })
}

/// First non-cancelled appointment on `therapist_id` overlapping `window`,
/// skipping `ignore`. Shared by the resolver and the commit-time re-check.
pub(super) fn booked_by(
    appointments: &[Appointment],
    therapist_id: Ulid,
    window: &Span,
    ignore: Option<Ulid>,
) -> Option<Ulid> {
    appointments
        .iter()
        .filter(|a| {
            a.therapist_id == therapist_id && !a.is_cancelled() && Some(a.id) != ignore
        })
        .find(|a| a.span.overlaps(window))
        .map(|a| a.id)
}

/// Resolve one grid slot for a therapist. First match wins:
/// off > time-away > booked > available.
pub fn slot_state(
    therapist: &Therapist,
    date: NaiveDate,
    start_min: u32,
    end_min: u32,
    time_away: &[TimeAway],
    appointments: &[Appointment],
) -> SlotState {
    if !therapist.working_hours.works_on(date.weekday())
        || !within_hours(therapist, start_min, end_min)
    {
        return SlotState::Off;
    }
    if time_away_hit(therapist.id, date, start_min, end_min, time_away) {
        return SlotState::TimeAway;
    }
    let window = slot_span(date, start_min, end_min);
    if booked_by(appointments, therapist.id, &window, None).is_some() {
        return SlotState::Booked;
    }
    SlotState::Available
}

/// Window eligibility for a mutation, checked in strict priority order.
/// `ignore` excludes the appointment being moved from the overlap check.
pub fn can_schedule_window(
    therapist: Option<&Therapist>,
    window: &Span,
    time_away: &[TimeAway],
    appointments: &[Appointment],
    locks: &[SlotLock],
    session: SessionId,
    ignore: Option<Ulid>,
) -> WindowDecision {
    let Some(therapist) = therapist else {
        return WindowDecision::Blocked(BlockReason::TherapistUnknown);
    };

    let date = date_of(window.start);
    let in_hours = therapist.working_hours.works_on(weekday_of(window.start))
        && window_minutes(window)
            .is_some_and(|(start_min, end_min)| within_hours(therapist, start_min, end_min));
    if !in_hours {
        return WindowDecision::Blocked(BlockReason::OutsideWorkingHours);
    }

    if let Some((start_min, end_min)) = window_minutes(window)
        && time_away_hit(therapist.id, date, start_min, end_min, time_away)
    {
        return WindowDecision::Blocked(BlockReason::TimeAway);
    }

    if let Some(lock) = locks.iter().find(|l| {
        l.therapist_id == therapist.id && l.locked_by != session && l.span.overlaps(window)
    }) {
        return WindowDecision::Blocked(BlockReason::LockedByOther(lock.locked_by));
    }

    if let Some(id) = booked_by(appointments, therapist.id, window, ignore) {
        return WindowDecision::Blocked(BlockReason::Booked(id));
    }

    WindowDecision::Clear
}
