use std::collections::{HashMap, HashSet};

use ulid::Ulid;

use crate::model::Appointment;

/// Read-only diagnostic scan: flag appointments that overlap another
/// booking on the same therapist despite the commit-time guards (races,
/// imported data). Groups non-cancelled records per therapist, sorts each
/// group by start, and tests adjacent pairs. Display-only: never blocks
/// or mutates anything.
pub fn overlapping_appointments(appointments: &[Appointment]) -> HashSet<Ulid> {
    let mut by_therapist: HashMap<Ulid, Vec<&Appointment>> = HashMap::new();
    for a in appointments.iter().filter(|a| !a.is_cancelled()) {
        by_therapist.entry(a.therapist_id).or_default().push(a);
    }

    let mut flagged = HashSet::new();
    for group in by_therapist.values_mut() {
        group.sort_by_key(|a| a.span.start);
        for pair in group.windows(2) {
            if pair[0].span.overlaps(&pair[1].span) {
                flagged.insert(pair[0].id);
                flagged.insert(pair[1].id);
            }
        }
    }
    flagged
}
