//! Work-hour and status derivation for the self check-out path.
//!
//! Both values are pure functions of the two wall-clock times. Times are
//! compared on a shared reference date, so a check-out earlier than the
//! check-in (clock skew, a shift across midnight) yields negative hours;
//! they are reported as-is and classified as a half day.

use crate::model::attendance::AttendanceStatus;
use chrono::NaiveTime;

/// Below this many hours a checked-out day counts as a half day
pub const HALF_DAY_THRESHOLD_HOURS: f64 = 4.0;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn work_hours(check_in: NaiveTime, check_out: NaiveTime) -> f64 {
    let seconds = check_out.signed_duration_since(check_in).num_seconds();
    round2(seconds as f64 / 3600.0)
}

/// Status after check-out. Anything from four hours up is `present`;
/// `late` and `leave` only come from administrative marking.
pub fn status_for_hours(hours: f64) -> AttendanceStatus {
    if hours < HALF_DAY_THRESHOLD_HOURS {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Present
    }
}
