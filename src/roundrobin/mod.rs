//! Round-robin pairing generation and schedule feasibility estimation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{DivisionId, Event, EventKind, TeamId};

/// Generate every required pairing for a pool of teams using the circle
/// method: teams are paired round by round so that no team appears twice in
/// one round, which lets the placement engine fill parallel fields without
/// participant conflicts. The full rotation is repeated `games_per_opponent`
/// times with sides swapped on alternating cycles.
pub fn pairing_rounds(team_ids: &[TeamId], games_per_opponent: u32) -> Vec<(TeamId, TeamId)> {
    let n = team_ids.len();
    if n < 2 || games_per_opponent == 0 {
        return Vec::new();
    }

    // Circle method: pad to even with a bye slot, fix the first entry, and
    // rotate the rest one step per round.
    let mut circle: Vec<Option<&TeamId>> = team_ids.iter().map(Some).collect();
    if circle.len() % 2 == 1 {
        circle.push(None);
    }
    let size = circle.len();
    let rounds = size - 1;

    let mut one_cycle: Vec<(TeamId, TeamId)> = Vec::new();
    for _ in 0..rounds {
        for i in 0..size / 2 {
            if let (Some(a), Some(b)) = (circle[i], circle[size - 1 - i]) {
                one_cycle.push((a.clone(), b.clone()));
            }
        }
        circle[1..].rotate_right(1);
    }

    let mut pairings = Vec::with_capacity(one_cycle.len() * games_per_opponent as usize);
    for cycle in 0..games_per_opponent {
        for (a, b) in &one_cycle {
            if cycle % 2 == 0 {
                pairings.push((a.clone(), b.clone()));
            } else {
                pairings.push((b.clone(), a.clone()));
            }
        }
    }
    pairings
}

/// Number of regular-season matches a pool of `team_count` teams requires.
pub fn required_matches(team_count: usize, games_per_opponent: u32) -> usize {
    team_count * team_count.saturating_sub(1) / 2 * games_per_opponent as usize
}

/// The division pools a league's regular season is generated from, with each
/// pool's projected participant count: the actual roster, or the configured /
/// requested capacity when rosters aren't full yet.
pub fn division_pools(
    event: &Event,
    participant_override: Option<u32>,
) -> Vec<(Option<DivisionId>, usize)> {
    let single = match &event.kind {
        EventKind::League {
            single_division, ..
        } => *single_division,
        EventKind::Tournament { .. } => true,
    };

    if single || event.divisions.is_empty() {
        let roster = event.teams.len();
        let projected = participant_override
            .map(|p| (p as usize).max(roster))
            .unwrap_or(roster);
        return vec![(None, projected)];
    }

    event
        .divisions
        .iter()
        .map(|div| {
            let roster = event.teams_in_division(&div.id).len();
            let capacity = participant_override.or(div.max_participants);
            let projected = capacity
                .map(|c| (c as usize).max(roster))
                .unwrap_or(roster);
            (Some(div.id.clone()), projected)
        })
        .collect()
}

/// Capacity estimate behind pre-extension and the scheduling diagnostic.
/// Rendered for event organizers, not just logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityDiagnostics {
    pub required_matches: usize,
    pub needed_minutes: i64,
    pub weekly_minutes: i64,
    pub total_minutes: i64,
}

impl CapacityDiagnostics {
    /// Estimate capacity for an event over `weeks` schedulable weeks.
    pub fn estimate(event: &Event, required_matches: usize, weeks: i64) -> Self {
        let per_match = event.duration.total_minutes();
        let weekly = event.weekly_slot_minutes() * event.fields.len().max(1) as i64;
        let one_off: i64 = event
            .time_slots
            .iter()
            .filter(|s| !s.repeating)
            .map(|s| s.duration_minutes())
            .sum();
        Self {
            required_matches,
            needed_minutes: required_matches as i64 * per_match,
            weekly_minutes: weekly,
            total_minutes: weekly * weeks.max(0) + one_off,
        }
    }

    /// How many extra weeks of the weekly capacity would cover the shortfall.
    pub fn extra_weeks_needed(&self) -> i64 {
        let shortfall = self.needed_minutes - self.total_minutes;
        if shortfall <= 0 || self.weekly_minutes <= 0 {
            return 0;
        }
        (shortfall + self.weekly_minutes - 1) / self.weekly_minutes
    }
}

impl fmt::Display for CapacityDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the schedule needs approximately {} matches ({:.1} hours of field time), \
             but the configured slots provide about {:.1} hours per week \
             ({:.1} hours total before the season ends); \
             add more weekly slots or reduce games per opponent",
            self.required_matches,
            self.needed_minutes as f64 / 60.0,
            self.weekly_minutes as f64 / 60.0,
            self.total_minutes as f64 / 60.0,
        )
    }
}
