//! Hard caps enforced before any state is read. Commands that exceed one
//! fail with `StoreError::LimitExceeded` and leave the store untouched.

use crate::model::Ms;

pub const MAX_APPOINTMENTS: usize = 100_000;

pub const MAX_SUBJECT_LEN: usize = 256;
pub const MAX_TAG_LEN: usize = 64;

/// 2000-01-01 in unix ms. Anything earlier is a caller bug.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 946_684_800_000;
/// 2100-01-01 in unix ms.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Appointments never exceed one day.
pub const MAX_APPOINTMENT_DURATION_MS: Ms = 24 * 60 * 60 * 1000;

/// fetch_snapshot range cap: 366 days.
pub const MAX_QUERY_WINDOW_MS: Ms = 366 * 24 * 60 * 60 * 1000;
