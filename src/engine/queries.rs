use crate::limits::MAX_QUERY_WINDOW_MS;
use crate::model::{Ms, Snapshot, Span};
use crate::observability;

use super::locks::derive_locks;
use super::{Scheduler, StoreError};

impl Scheduler {
    /// Read path: appointments overlapping the half-open range, the
    /// requesting session's derived locks, the server clock and the store
    /// version so callers can tell the store has moved on even when their
    /// own records look unchanged. Reads are idempotent and side-effect
    /// free; overlapping refreshes are safe.
    pub async fn fetch_snapshot(
        &self,
        range_start: Ms,
        range_end: Ms,
    ) -> Result<Snapshot, StoreError> {
        if range_start >= range_end {
            return Err(StoreError::LimitExceeded("range is empty or inverted"));
        }
        if range_end - range_start > MAX_QUERY_WINDOW_MS {
            return Err(StoreError::LimitExceeded("query window too wide"));
        }

        let state = self.load_state().await?;
        let range = Span::new(range_start, range_end);
        let appointments: Vec<_> = state
            .appointments
            .iter()
            .filter(|a| a.span.overlaps(&range))
            .cloned()
            .collect();
        let locks = derive_locks(&appointments, self.session_id());

        metrics::counter!(observability::SNAPSHOTS_TOTAL).increment(1);
        Ok(Snapshot {
            appointments,
            locks,
            server_time: self.now_ms(),
            store_version: state.version,
        })
    }

    /// Current version without materializing a snapshot.
    pub async fn store_version(&self) -> Result<u64, StoreError> {
        Ok(self.load_state().await?.version)
    }
}
