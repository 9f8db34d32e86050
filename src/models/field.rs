//! Playing field model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DivisionId, EntityId, FieldId, MatchId};

/// A single booked interval on a field.
///
/// Bookings cover both matches placed by the scheduler and external rentals
/// the field already honors; the scheduler must not overlap either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    /// The match occupying this interval, or None for a non-match booking.
    pub match_id: Option<MatchId>,
}

impl Booking {
    /// Half-open interval overlap test: `[self.start, self.end)` vs `[s, e)`.
    pub fn overlaps(&self, s: DateTime<Utc>, e: DateTime<Utc>) -> bool {
        self.start < e && s < self.end
    }
}

/// A playing field (court, pitch, rink) that matches are placed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingField {
    pub id: FieldId,

    /// Human-facing field number; also the deterministic placement order.
    pub field_number: u32,

    /// Divisions allowed on this field. Empty means open to all divisions.
    pub divisions: Vec<DivisionId>,

    /// Chronologically ordered booked intervals.
    pub bookings: Vec<Booking>,
}

impl PlayingField {
    pub fn new(event_id: &EntityId, field_number: u32) -> Self {
        let id = EntityId::generate(&[event_id.as_str(), "field", &field_number.to_string()]);
        Self {
            id,
            field_number,
            divisions: Vec::new(),
            bookings: Vec::new(),
        }
    }

    pub fn with_divisions(mut self, divisions: Vec<DivisionId>) -> Self {
        self.divisions = divisions;
        self
    }

    /// Whether this field may host a match in the given division.
    /// A field with no division restrictions hosts anything.
    pub fn allows(&self, division: Option<&DivisionId>) -> bool {
        match division {
            None => true,
            Some(d) => self.divisions.is_empty() || self.divisions.contains(d),
        }
    }

    /// Whether the field is free during `[start, end)`.
    pub fn is_free(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !self.bookings.iter().any(|b| b.overlaps(start, end))
    }

    /// Insert a booking, keeping the list ordered by start time.
    pub fn book(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, match_id: Option<MatchId>) {
        let booking = Booking {
            start,
            end,
            match_id,
        };
        let idx = self
            .bookings
            .partition_point(|b| (b.start, b.end) <= (start, end));
        self.bookings.insert(idx, booking);
    }

    /// Remove the booking held by a match, if any.
    pub fn unbook_match(&mut self, match_id: &MatchId) {
        self.bookings
            .retain(|b| b.match_id.as_ref() != Some(match_id));
    }
}
