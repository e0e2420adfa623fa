//! Simulated time helpers: clock synchronization and human-readable
//! rendering of minute timestamps.

use crate::types::{Timestamp, MINUTES_PER_DAY};

/// The shared clock value of two coupled vessels: the later of the two.
/// Callers assign the result to both participants.
pub fn synchronize(a: Timestamp, b: Timestamp) -> Timestamp {
    a.max(b)
}

/// Whole days expressed in minutes.
pub fn days(n: u64) -> Timestamp {
    n * MINUTES_PER_DAY
}

/// Render a timestamp as `w<week>, d<day>, HH:MM` (week and day 1-based).
pub fn format_time(ts: Timestamp) -> String {
    let week = ts / MINUTES_PER_DAY / 7;
    let day_of_week = ts / MINUTES_PER_DAY - week * 7;
    let hour = ts % MINUTES_PER_DAY / 60;
    let minute = ts % 60;
    format!("w{}, d{}, {hour:02}:{minute:02}", week + 1, day_of_week + 1)
}

/// Render a duration as `<n> day(s), HH:MM`, dropping the day part when zero.
pub fn format_duration(ts: Timestamp) -> String {
    let days = ts / MINUTES_PER_DAY;
    let hour = ts % MINUTES_PER_DAY / 60;
    let minute = ts % 60;
    if days > 0 {
        format!("{days} day(s), {hour:02}:{minute:02}")
    } else {
        format!("{hour:02}:{minute:02}")
    }
}
