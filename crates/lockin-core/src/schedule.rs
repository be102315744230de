//! Blocking window evaluation
//!
//! The wall clock is behind the `Clock` trait so tests and tools can pin
//! "now" to a fixed moment.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};

use crate::types::Schedule;

// =============================================================================
// Clock
// =============================================================================

/// Source of local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Parse `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// =============================================================================
// Schedule Evaluation
// =============================================================================

/// Whether the schedule is active right now.
pub fn is_within_schedule(schedule: &Schedule) -> bool {
    is_within_schedule_at(schedule, SystemClock.now())
}

/// Whether the schedule is active at `now`.
///
/// `allDay` short-circuits to active, bypassing the day check as well.
/// Otherwise the weekday must be in `days` and the `"HH:MM"` time must fall
/// inside the window, both ends inclusive. A window whose start is after its
/// end wraps past midnight.
pub fn is_within_schedule_at(schedule: &Schedule, now: NaiveDateTime) -> bool {
    if schedule.is_all_day() {
        return true;
    }

    let weekday = now.weekday().num_days_from_sunday();
    if !schedule.days.contains_index(weekday) {
        return false;
    }

    let current = format!("{:02}:{:02}", now.hour(), now.minute());
    let current = current.as_str();
    let start = schedule.start_time.as_str();
    let end = schedule.end_time.as_str();

    if start > end {
        current >= start || current <= end
    } else {
        current >= start && current <= end
    }
}
