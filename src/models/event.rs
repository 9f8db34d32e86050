//! Event aggregate: a tournament or league with everything it owns.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Division, DivisionId, EntityId, EventId, FieldId, Match, MatchId, PlayingField, RefereeId,
    Team, TeamId, TimeSlot,
};

/// Elimination mode for tournaments and league playoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationMode {
    Single,
    Double,
}

/// How long one match occupies a field, including the fixed changeover buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MatchDuration {
    /// Set-based sports: `set_minutes * sets_per_match` plus 5 minutes per set.
    Sets { sets_per_match: u32, set_minutes: u32 },

    /// Flat-duration sports: `minutes` plus a 5 minute buffer.
    Flat { minutes: u32 },
}

impl MatchDuration {
    /// Total field-time in minutes one match consumes, buffer included.
    pub fn total_minutes(&self) -> i64 {
        match self {
            MatchDuration::Sets {
                sets_per_match,
                set_minutes,
            } => i64::from(set_minutes * sets_per_match + 5 * sets_per_match),
            MatchDuration::Flat { minutes } => i64::from(minutes + 5),
        }
    }

    /// Number of sets a result sheet carries. Flat sports record one total.
    pub fn sets_per_match(&self) -> usize {
        match self {
            MatchDuration::Sets { sets_per_match, .. } => *sets_per_match as usize,
            MatchDuration::Flat { .. } => 1,
        }
    }
}

/// Points configuration for league standings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueScoring {
    pub points_for_win: f64,
    pub points_for_draw: f64,
    pub points_for_loss: f64,
    pub points_per_goal_scored: f64,
    pub points_per_goal_conceded: f64,
    /// Decimal places standings points are rounded to (0 = integer).
    pub precision: u32,
}

impl Default for LeagueScoring {
    fn default() -> Self {
        Self {
            points_for_win: 3.0,
            points_for_draw: 1.0,
            points_for_loss: 0.0,
            points_per_goal_scored: 0.0,
            points_per_goal_conceded: 0.0,
            precision: 0,
        }
    }
}

/// Kind-specific event configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EventKind {
    Tournament {
        elimination: EliminationMode,
        max_participants: Option<u32>,
    },
    League {
        /// How many times each pair of division-mates meets.
        games_per_opponent: u32,
        include_playoffs: bool,
        /// Default playoff bracket size; divisions may override.
        playoff_team_count: u32,
        scoring: LeagueScoring,
        /// When true, all teams compete in one pool regardless of division.
        single_division: bool,
    },
}

/// A dedicated match official.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referee {
    pub id: RefereeId,
    pub name: String,
}

impl Referee {
    pub fn new(event_id: &EntityId, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = EntityId::generate(&[event_id.as_str(), "referee", &name]);
        Self { id, name }
    }
}

/// The scheduling aggregate: an event and everything it owns for the duration
/// of a build or finalize call.
///
/// Entities live in id-keyed maps and reference each other by id, so the
/// bidirectional Match/Team/Field relationships of the domain stay acyclic.
/// `BTreeMap` keeps iteration order deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,

    /// Event date range `[start, end)`. `start == end` marks an open-ended
    /// schedule bounded internally by the scheduling horizon.
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    pub kind: EventKind,

    pub divisions: Vec<Division>,
    pub teams: BTreeMap<TeamId, Team>,
    pub fields: BTreeMap<FieldId, PlayingField>,
    pub time_slots: Vec<TimeSlot>,
    pub matches: BTreeMap<MatchId, Match>,

    pub duration: MatchDuration,

    /// Whether teams referee each other's matches instead of dedicated
    /// officials.
    pub do_teams_ref: bool,

    pub referees: BTreeMap<RefereeId, Referee>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: EventKind,
        duration: MatchDuration,
    ) -> Self {
        let name = name.into();
        let id = EntityId::generate(&[&name, &start.to_rfc3339()]);
        Self {
            id,
            name,
            start,
            end,
            kind,
            divisions: Vec::new(),
            teams: BTreeMap::new(),
            fields: BTreeMap::new(),
            time_slots: Vec::new(),
            matches: BTreeMap::new(),
            duration,
            do_teams_ref: false,
            referees: BTreeMap::new(),
        }
    }

    /// An open-ended schedule has no fixed end date.
    pub fn is_open_ended(&self) -> bool {
        self.start == self.end
    }

    pub fn is_league(&self) -> bool {
        matches!(self.kind, EventKind::League { .. })
    }

    /// Playoff bracket size for a division, honoring the division override.
    pub fn playoff_team_count_for(&self, division: Option<&DivisionId>) -> u32 {
        let base = match &self.kind {
            EventKind::League {
                playoff_team_count, ..
            } => *playoff_team_count,
            EventKind::Tournament { .. } => 0,
        };
        division
            .and_then(|d| self.divisions.iter().find(|div| &div.id == d))
            .and_then(|div| div.playoff_team_count)
            .unwrap_or(base)
    }

    /// Teams registered in a division, ordered by id for determinism.
    pub fn teams_in_division(&self, division: &DivisionId) -> Vec<&Team> {
        self.teams
            .values()
            .filter(|t| t.division.as_ref() == Some(division))
            .collect()
    }

    /// Slot capacity in minutes per week across all recurring slots.
    pub fn weekly_slot_minutes(&self) -> i64 {
        self.time_slots
            .iter()
            .filter(|s| s.repeating)
            .map(|s| s.duration_minutes())
            .sum()
    }

    /// Ids of matches without bracket linkage, in sequence order.
    pub fn regular_match_ids(&self) -> Vec<MatchId> {
        self.match_ids_where(|m| !m.is_playoff())
    }

    /// Ids of bracket matches, in sequence order.
    pub fn playoff_match_ids(&self) -> Vec<MatchId> {
        self.match_ids_where(Match::is_playoff)
    }

    fn match_ids_where(&self, pred: impl Fn(&Match) -> bool) -> Vec<MatchId> {
        let mut ids: Vec<&Match> = self.matches.values().filter(|m| pred(m)).collect();
        ids.sort_by_key(|m| (m.sequence.unwrap_or(u32::MAX), m.id.clone()));
        ids.into_iter().map(|m| m.id.clone()).collect()
    }

    /// Committed time windows per participant (teams and referees), derived
    /// from scheduled matches. Rebuilt in one pass at defined points instead
    /// of patched from many call sites.
    pub fn participant_bookings(&self) -> HashMap<EntityId, Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let mut busy: HashMap<EntityId, Vec<(DateTime<Utc>, DateTime<Utc>)>> = HashMap::new();
        for m in self.matches.values() {
            let (Some(start), Some(end)) = (m.start, m.end) else {
                continue;
            };
            for p in m.participants() {
                busy.entry(p.clone()).or_default().push((start, end));
            }
        }
        for windows in busy.values_mut() {
            windows.sort();
        }
        busy
    }

    /// The end time of the latest scheduled match, if any match is placed.
    pub fn last_match_end(&self) -> Option<DateTime<Utc>> {
        self.matches.values().filter_map(|m| m.end).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_event(kind: EventKind) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        Event::new("Test Event", start, end, kind, MatchDuration::Flat { minutes: 55 })
    }

    fn league_kind() -> EventKind {
        EventKind::League {
            games_per_opponent: 1,
            include_playoffs: true,
            playoff_team_count: 4,
            scoring: LeagueScoring::default(),
            single_division: true,
        }
    }

    #[test]
    fn test_duration_with_sets() {
        let d = MatchDuration::Sets {
            sets_per_match: 3,
            set_minutes: 20,
        };
        // 3 sets of 20 plus 5 minutes buffer per set
        assert_eq!(d.total_minutes(), 75);
        assert_eq!(d.sets_per_match(), 3);
    }

    #[test]
    fn test_duration_flat() {
        let d = MatchDuration::Flat { minutes: 55 };
        assert_eq!(d.total_minutes(), 60);
        assert_eq!(d.sets_per_match(), 1);
    }

    #[test]
    fn test_open_ended_detection() {
        let mut event = test_event(league_kind());
        assert!(!event.is_open_ended());
        event.end = event.start;
        assert!(event.is_open_ended());
    }

    #[test]
    fn test_playoff_team_count_division_override() {
        let mut event = test_event(league_kind());
        let div = Division::new(&event.id, "Advanced").with_playoff_team_count(8);
        let div_id = div.id.clone();
        event.divisions.push(div);

        assert_eq!(event.playoff_team_count_for(None), 4);
        assert_eq!(event.playoff_team_count_for(Some(&div_id)), 8);
        assert_eq!(
            event.playoff_team_count_for(Some(&EntityId::from("unknown"))),
            4
        );
    }

    #[test]
    fn test_match_id_partition_and_ordering() {
        let mut event = test_event(league_kind());

        let mut regular = Match::new(EntityId::from("m-b"));
        regular.sequence = Some(2);
        let mut regular2 = Match::new(EntityId::from("m-a"));
        regular2.sequence = Some(1);
        let mut playoff = Match::new(EntityId::from("m-c"));
        playoff.sequence = Some(3);
        playoff.winner_next = Some(EntityId::from("m-d"));

        event.matches.insert(regular.id.clone(), regular);
        event.matches.insert(regular2.id.clone(), regular2);
        event.matches.insert(playoff.id.clone(), playoff);

        assert_eq!(
            event.regular_match_ids(),
            vec![EntityId::from("m-a"), EntityId::from("m-b")]
        );
        assert_eq!(event.playoff_match_ids(), vec![EntityId::from("m-c")]);
    }

    #[test]
    fn test_participant_bookings_cover_officials() {
        let mut event = test_event(league_kind());
        let mut m = Match::pairing(
            EntityId::from("m-1"),
            EntityId::from("t-1"),
            EntityId::from("t-2"),
        );
        m.team_referee = Some(EntityId::from("t-3"));
        m.start = Some(event.start);
        m.end = Some(event.start + chrono::Duration::hours(1));
        event.matches.insert(m.id.clone(), m);

        let busy = event.participant_bookings();
        assert_eq!(busy.len(), 3);
        assert!(busy.contains_key(&EntityId::from("t-3")));
    }

    #[test]
    fn test_weekly_slot_minutes_skips_one_offs() {
        let mut event = test_event(league_kind());
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(chrono::Weekday::Sat, 540, 780, anchor));
        event
            .time_slots
            .push(TimeSlot::new(chrono::Weekday::Sun, 540, 660, anchor).one_off());

        assert_eq!(event.weekly_slot_minutes(), 240);
    }
}
