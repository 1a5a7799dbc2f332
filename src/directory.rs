use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Therapist, TimeAway};

/// Read-only roster of therapists and their time-away windows, supplied by
/// an external reference-data source at startup. The scheduling core only
/// reads from it.
pub struct Directory {
    therapists: DashMap<Ulid, Therapist>,
    time_away: DashMap<Ulid, Vec<TimeAway>>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            therapists: DashMap::new(),
            time_away: DashMap::new(),
        }
    }

    pub fn load(therapists: Vec<Therapist>, time_away: Vec<TimeAway>) -> Self {
        let dir = Self::new();
        for t in therapists {
            dir.therapists.insert(t.id, t);
        }
        for ta in time_away {
            dir.time_away.entry(ta.therapist_id).or_default().push(ta);
        }
        dir
    }

    pub fn therapist(&self, id: &Ulid) -> Option<Therapist> {
        self.therapists.get(id).map(|e| e.value().clone())
    }

    pub fn contains(&self, id: &Ulid) -> bool {
        self.therapists.contains_key(id)
    }

    pub fn therapist_count(&self) -> usize {
        self.therapists.len()
    }

    /// Blackout windows for one therapist on one date.
    pub fn time_away_for(&self, therapist_id: &Ulid, date: NaiveDate) -> Vec<TimeAway> {
        self.time_away
            .get(therapist_id)
            .map(|e| {
                e.value()
                    .iter()
                    .filter(|ta| ta.date == date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
