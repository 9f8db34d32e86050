//! Recurring weekly availability windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A recurring weekly availability window: the schedulable capacity source.
///
/// Persisted `"HH:mm"` wall-clock times are converted to minute offsets from
/// midnight on construction; mapping to a concrete `[start, end)` datetime is
/// a pure function of a reference week.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day_of_week: Weekday,

    /// Minutes from midnight at which the window opens.
    pub start_minutes: u32,

    /// Minutes from midnight at which the window closes (exclusive).
    pub end_minutes: u32,

    /// First date this slot is available.
    pub anchor: NaiveDate,

    /// Last date this slot is available, inclusive. None = unbounded.
    pub until: Option<NaiveDate>,

    /// Whether the slot repeats weekly. A non-repeating slot occurs only in
    /// the anchor's week.
    pub repeating: bool,
}

/// Parse a `"HH:mm"` wall-clock string into minutes from midnight.
pub fn parse_hhmm(s: &str) -> Option<u32> {
    let (h, m) = s.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

impl TimeSlot {
    pub fn new(day_of_week: Weekday, start_minutes: u32, end_minutes: u32, anchor: NaiveDate) -> Self {
        Self {
            day_of_week,
            start_minutes,
            end_minutes,
            anchor,
            until: None,
            repeating: true,
        }
    }

    /// Build a slot from persisted `"HH:mm"` strings. Returns None if either
    /// time fails to parse or the window is empty.
    pub fn from_hhmm(
        day_of_week: Weekday,
        start: &str,
        end: &str,
        anchor: NaiveDate,
    ) -> Option<Self> {
        let start_minutes = parse_hhmm(start)?;
        let end_minutes = parse_hhmm(end)?;
        if end_minutes <= start_minutes {
            return None;
        }
        Some(Self::new(day_of_week, start_minutes, end_minutes, anchor))
    }

    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    pub fn one_off(mut self) -> Self {
        self.repeating = false;
        self
    }

    /// Minutes of capacity one occurrence of this slot provides.
    pub fn duration_minutes(&self) -> i64 {
        i64::from(self.end_minutes) - i64::from(self.start_minutes)
    }

    /// The concrete `[start, end)` range for this slot's occurrence in the
    /// week beginning at `week_start` (any date; the occurrence falls on this
    /// slot's weekday within the following 7 days).
    ///
    /// Returns None when the occurrence falls before the anchor, after the
    /// `until` bound, or outside the anchor week for non-repeating slots.
    pub fn occurrence(&self, week_start: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let offset = (self.day_of_week.num_days_from_monday() + 7
            - week_start.weekday().num_days_from_monday())
            % 7;
        let date = week_start + Duration::days(i64::from(offset));

        if date < self.anchor {
            return None;
        }
        if let Some(until) = self.until {
            if date > until {
                return None;
            }
        }
        if !self.repeating && (date - self.anchor).num_days() >= 7 {
            return None;
        }

        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        let start = midnight + Duration::minutes(i64::from(self.start_minutes));
        let end = midnight + Duration::minutes(i64::from(self.end_minutes));
        Some((start, end))
    }
}
