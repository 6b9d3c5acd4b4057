//! Calendar-derived columns: time-of-day bucket, high-season flag and
//! departure delay in minutes.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Departure delay (minutes) above which a flight counts as delayed.
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// `(month, day)` windows with historically elevated delay risk. Both ends
/// are taken at midnight.
const HIGH_SEASON_WINDOWS: [((u32, u32), (u32, u32)); 4] = [
    ((12, 15), (12, 31)),
    ((1, 1), (3, 3)),
    ((7, 15), (7, 31)),
    ((9, 11), (9, 30)),
];

/// Time-of-day bucket of a scheduled departure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodDay {
    Morning,
    Afternoon,
    Evening,
}

impl PeriodDay {
    /// Stable numeric code used when the bucket is exposed as a column.
    pub fn code(&self) -> f64 {
        match self {
            PeriodDay::Morning => 0.0,
            PeriodDay::Afternoon => 1.0,
            PeriodDay::Evening => 2.0,
        }
    }
}

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}

/// Buckets the time of day of `ts`.
///
/// Bounds are exclusive on both sides, so a departure exactly on a bound
/// (`05:00:00`, `11:59:00`, `12:00:00`, `18:59:00`) lands in
/// [`PeriodDay::Evening`], which is also the bucket for the night hours.
pub fn period_day(ts: &NaiveDateTime) -> PeriodDay {
    let t = ts.time().num_seconds_from_midnight();
    if hm(5, 0) < t && t < hm(11, 59) {
        PeriodDay::Morning
    } else if hm(12, 0) < t && t < hm(18, 59) {
        PeriodDay::Afternoon
    } else {
        PeriodDay::Evening
    }
}

/// Returns 1 when `ts` falls inside a high-season window.
///
/// Window bounds are midnight timestamps, so the last day of a window only
/// counts at exactly `00:00:00` (`03-03 00:00` is high season, `03-03 10:00`
/// is not). The first day counts in full.
pub fn high_season(ts: &NaiveDateTime) -> u8 {
    let year = ts.date().year();
    let at_midnight = |month, day| {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
    };
    let in_window = HIGH_SEASON_WINDOWS.iter().any(|&((m0, d0), (m1, d1))| {
        match (at_midnight(m0, d0), at_midnight(m1, d1)) {
            (Some(start), Some(end)) => start <= *ts && *ts <= end,
            _ => false,
        }
    });
    u8::from(in_window)
}

/// Signed difference `actual - scheduled` in minutes.
pub fn min_diff(scheduled: &NaiveDateTime, actual: &NaiveDateTime) -> f64 {
    (*actual - *scheduled).num_seconds() as f64 / 60.0
}

/// Binary delay label for a departure difference in minutes.
pub fn delay_label(min_diff: f64) -> u8 {
    u8::from(min_diff > DELAY_THRESHOLD_MINUTES)
}
