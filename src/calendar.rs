//! Minute-grid arithmetic between unix-ms spans and the calendar view
//! (date, weekday, minute-of-day). All timestamps are interpreted as
//! clinic-local wall-clock laid onto the UTC day grid.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::model::{Ms, Span};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const MS_PER_MINUTE: Ms = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapMode {
    Floor,
    Ceil,
    Round,
}

/// Snap a minute-of-day onto a slot grid: `Floor` truncates, `Ceil` rounds
/// up, `Round` picks the nearest slot boundary (ties go up).
pub fn snap_to_slot(minute: u32, slot_size: u32, mode: SnapMode) -> u32 {
    debug_assert!(slot_size > 0, "slot size must be positive");
    let ratio = match mode {
        SnapMode::Floor => minute / slot_size,
        SnapMode::Ceil => minute.div_ceil(slot_size),
        SnapMode::Round => (minute + slot_size / 2) / slot_size,
    };
    ratio * slot_size
}

/// Span duration in whole minutes, rounded to the nearest minute.
pub fn span_minutes(span: &Span) -> i64 {
    (span.duration_ms() + MS_PER_MINUTE / 2) / MS_PER_MINUTE
}

pub fn end_from_minutes(start: Ms, minutes: i64) -> Ms {
    start + minutes * MS_PER_MINUTE
}

fn datetime_of(t: Ms) -> NaiveDateTime {
    // Out-of-range timestamps are rejected by limits.rs before reaching here.
    DateTime::from_timestamp_millis(t)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

pub fn date_of(t: Ms) -> NaiveDate {
    datetime_of(t).date()
}

pub fn weekday_of(t: Ms) -> Weekday {
    date_of(t).weekday()
}

pub fn minute_of_day(t: Ms) -> u32 {
    let dt = datetime_of(t);
    dt.hour() * 60 + dt.minute()
}

pub fn day_start_ms(date: NaiveDate) -> Ms {
    NaiveDateTime::new(date, NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

/// Absolute span for a minute window on a given date.
pub fn slot_span(date: NaiveDate, start_min: u32, end_min: u32) -> Span {
    let base = day_start_ms(date);
    Span::new(
        base + Ms::from(start_min) * MS_PER_MINUTE,
        base + Ms::from(end_min) * MS_PER_MINUTE,
    )
}

/// Project a span onto its start date's minute grid. `None` if the span
/// crosses midnight; such windows are never inside working hours.
pub fn window_minutes(span: &Span) -> Option<(u32, u32)> {
    let start_min = minute_of_day(span.start);
    let end_min = i64::from(start_min) + span_minutes(span);
    if end_min > i64::from(MINUTES_PER_DAY) {
        return None;
    }
    Some((start_min, end_min as u32))
}
