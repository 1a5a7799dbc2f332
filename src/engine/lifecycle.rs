use crate::model::AppointmentStatus;

use super::StoreError;

/// The one transition table. Every status check in the crate goes through
/// here; callers never compare status strings themselves.
pub fn allowed_next(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match from {
        Scheduled => &[CheckIn, InProgress, Completed, Incomplete],
        CheckIn => &[InProgress, Completed, Incomplete],
        InProgress => &[Completed, Incomplete],
        // Terminal. Cancelled is only reachable via the cancel command.
        Completed | Incomplete | Cancelled => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_next(from).contains(&to)
}

/// A transition not present in the table fails, never silently coerced.
pub fn check_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), StoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(StoreError::IllegalTransition { from, to })
    }
}
