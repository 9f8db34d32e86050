//! Event builder: the top-level scheduling entry point.
//!
//! Combines bracket/round-robin generation with the placement engine to turn
//! an event definition into a fully placed schedule, retrying with window
//! extensions when the initial time budget cannot fit every required match.

use chrono::Duration;
use tracing::{info, warn};

use crate::bracket::{build_bracket, Entrant};
use crate::engine::{self, place_matches, ScheduleFailure};
use crate::models::{
    DivisionId, EliminationMode, EntityId, Event, EventKind, Match, Team, TeamId,
};
use crate::roundrobin::{division_pools, pairing_rounds, required_matches, CapacityDiagnostics};

/// Options for a build run.
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    /// Overrides the projected participant count when rosters aren't full.
    pub participant_count: Option<u32>,

    /// How many times the season window is extended before giving up.
    pub max_retries: u32,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            participant_count: None,
            max_retries: 3,
        }
    }
}

/// Produce a fully placed schedule for the event.
pub fn schedule_event(event: Event) -> Result<Event, ScheduleFailure> {
    schedule_event_with(event, &ScheduleOptions::default())
}

/// Produce a fully placed schedule, with explicit options.
///
/// Every retry starts from the original input aggregate, so placeholder teams
/// and matches created during a failed attempt never leak into the next one.
pub fn schedule_event_with(
    mut base: Event,
    opts: &ScheduleOptions,
) -> Result<Event, ScheduleFailure> {
    validate(&base)?;

    // Pre-extend the window using the feasibility estimate so most builds
    // succeed on the first attempt.
    if !base.is_open_ended() {
        let required = estimate_required_matches(&base, opts.participant_count);
        let weeks = weeks_in_range(&base);
        let diag = CapacityDiagnostics::estimate(&base, required, weeks);
        let extra = diag.extra_weeks_needed();
        if extra > 0 {
            info!(extra_weeks = extra, "pre-extending season window");
            base.end += Duration::weeks(extra);
        }
    }

    let snapshot = base;
    let mut extension = Duration::zero();

    for attempt in 0..=opts.max_retries {
        let mut working = snapshot.clone();
        // Open-ended schedules are bounded by the engine horizon instead of
        // the end date, so extending the window cannot help them.
        if !working.is_open_ended() {
            working.end += extension;
        }

        match build_once(&mut working, opts) {
            Ok(()) => {
                if let Some(last) = working.last_match_end() {
                    // Trim unused extended horizon.
                    working.end = last;
                }
                info!(
                    matches = working.matches.len(),
                    attempt, "schedule built"
                );
                return Ok(working);
            }
            // More time cannot fix a misconfiguration.
            Err(ScheduleFailure::Misconfigured(reason)) => {
                return Err(ScheduleFailure::Misconfigured(reason));
            }
            Err(ScheduleFailure::CapacityExceeded(diag)) => {
                if attempt == opts.max_retries {
                    return Err(ScheduleFailure::CapacityExceeded(diag));
                }
                let extra = Duration::weeks((2 * (attempt as i64 + 1)).max(2));
                warn!(
                    attempt,
                    extra_weeks = extra.num_weeks(),
                    "schedule did not fit; extending season window"
                );
                extension += extra;
            }
        }
    }
    unreachable!("retry loop always returns");
}

/// Check an event definition without building anything: date range and slot
/// configuration, plus the capacity estimate a build would start from.
pub fn validate_event(
    event: &Event,
    participant_count: Option<u32>,
) -> Result<CapacityDiagnostics, ScheduleFailure> {
    validate(event)?;
    let required = estimate_required_matches(event, participant_count);
    let weeks = weeks_in_range(event);
    Ok(CapacityDiagnostics::estimate(event, required, weeks))
}

fn validate(event: &Event) -> Result<(), ScheduleFailure> {
    if !event.is_open_ended() && event.end < event.start {
        return Err(ScheduleFailure::Misconfigured(format!(
            "event ends ({}) before it starts ({})",
            event.end, event.start
        )));
    }
    match &event.kind {
        EventKind::League { .. } => {
            if !event.time_slots.iter().any(|s| s.repeating) {
                return Err(ScheduleFailure::Misconfigured(
                    "no recurring time slots configured".to_string(),
                ));
            }
        }
        EventKind::Tournament { .. } => {
            if event.time_slots.is_empty() {
                return Err(ScheduleFailure::Misconfigured(
                    "no time slots configured for this event".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn weeks_in_range(event: &Event) -> i64 {
    let days = (engine::schedule_horizon(event) - event.start).num_days().max(0);
    (days + 6) / 7
}

/// Rough match count for the feasibility pre-check.
fn estimate_required_matches(event: &Event, participant_override: Option<u32>) -> usize {
    match &event.kind {
        EventKind::Tournament { elimination, .. } => {
            let n = event.teams.len();
            match elimination {
                EliminationMode::Single => n.saturating_sub(1),
                EliminationMode::Double => (2 * n).saturating_sub(1),
            }
        }
        EventKind::League {
            games_per_opponent,
            include_playoffs,
            ..
        } => {
            let mut total = 0;
            for (division, projected) in division_pools(event, participant_override) {
                total += required_matches(projected, *games_per_opponent);
                if *include_playoffs {
                    let k = event.playoff_team_count_for(division.as_ref()) as usize;
                    total += k.saturating_sub(1);
                }
            }
            total
        }
    }
}

/// One generation + placement attempt over a working copy.
fn build_once(event: &mut Event, opts: &ScheduleOptions) -> Result<(), ScheduleFailure> {
    let queue = match &event.kind {
        EventKind::Tournament { elimination, .. } => generate_tournament(event, *elimination)?,
        EventKind::League { .. } => generate_league(event, opts)?,
    };
    place_matches(event, &queue, event.start)?;
    Ok(())
}

/// Teams of a pool in deterministic bracket/pairing order: strongest seed
/// first, name as the tie-break.
fn ordered_pool(teams: Vec<&Team>) -> Vec<TeamId> {
    let mut teams = teams;
    teams.sort_by(|a, b| b.seed.cmp(&a.seed).then_with(|| a.name.cmp(&b.name)));
    teams.into_iter().map(|t| t.id.clone()).collect()
}

fn generate_tournament(
    event: &mut Event,
    elimination: EliminationMode,
) -> Result<Vec<EntityId>, ScheduleFailure> {
    let pool = ordered_pool(event.teams.values().collect());
    let entrants: Vec<Entrant> = pool
        .iter()
        .map(|id| Entrant::team(id.clone(), event.teams[id].seed))
        .collect();
    let matches = build_bracket(
        &event.id,
        &entrants,
        elimination == EliminationMode::Double,
    )
    .map_err(|e| ScheduleFailure::Misconfigured(e.to_string()))?;

    let mut queue = Vec::with_capacity(matches.len());
    for (seq, mut m) in matches.into_iter().enumerate() {
        m.sequence = Some(seq as u32);
        queue.push(m.id.clone());
        event.matches.insert(m.id.clone(), m);
    }
    Ok(queue)
}

fn generate_league(
    event: &mut Event,
    opts: &ScheduleOptions,
) -> Result<Vec<EntityId>, ScheduleFailure> {
    let EventKind::League {
        games_per_opponent,
        include_playoffs,
        ..
    } = event.kind.clone()
    else {
        unreachable!("generate_league called for a tournament");
    };

    let pools = division_pools(event, opts.participant_count);
    let mut queue = Vec::new();
    let mut seq: u32 = 0;
    let mut placeholder_ordinal: u32 = 0;

    for (division, projected) in pools {
        let mut pool = match &division {
            Some(d) => ordered_pool(event.teams_in_division(d)),
            None => ordered_pool(event.teams.values().collect()),
        };

        // Fill the pool to its projected capacity with placeholder teams so
        // the schedule reserves slots for late registrations.
        while pool.len() < projected {
            placeholder_ordinal += 1;
            let mut team = Team::placeholder(&event.id, placeholder_ordinal);
            if let Some(d) = &division {
                team.division = Some(d.clone());
            }
            pool.push(team.id.clone());
            event.teams.insert(team.id.clone(), team);
        }

        let div_tag = division
            .as_ref()
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| "pool".to_string());

        for (a, b) in pairing_rounds(&pool, games_per_opponent) {
            let id = EntityId::generate(&[event.id.as_str(), "rr", &div_tag, &seq.to_string()]);
            let mut m = Match::pairing(id.clone(), a, b);
            m.division = division.clone();
            m.sequence = Some(seq);
            seq += 1;
            queue.push(id.clone());
            event.matches.insert(id, m);
        }

        if include_playoffs {
            seq = append_playoff_skeleton(event, &division, &div_tag, seq, &mut queue)?;
        }
    }

    Ok(queue)
}

/// Append an unassigned elimination bracket sized to the division's playoff
/// team count, so the bracket shape and time slots exist before standings
/// determine who occupies them.
fn append_playoff_skeleton(
    event: &mut Event,
    division: &Option<DivisionId>,
    div_tag: &str,
    mut seq: u32,
    queue: &mut Vec<EntityId>,
) -> Result<u32, ScheduleFailure> {
    let k = event.playoff_team_count_for(division.as_ref());
    if k < 2 {
        return Ok(seq);
    }
    let slots: Vec<Entrant> = (0..k).map(|i| Entrant::slot(k - i)).collect();
    let namespace = EntityId::generate(&[event.id.as_str(), "playoffs", div_tag]);
    let matches = build_bracket(&namespace, &slots, false)
        .map_err(|e| ScheduleFailure::Misconfigured(e.to_string()))?;

    for mut m in matches {
        m.division = division.clone();
        m.sequence = Some(seq);
        seq += 1;
        queue.push(m.id.clone());
        event.matches.insert(m.id.clone(), m);
    }
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeagueScoring, MatchDuration, PlayingField, TimeSlot};
    use chrono::{Datelike, TimeZone, Timelike, Utc, Weekday};

    fn league(teams: usize, fields: usize, weeks: i64) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let mut event = Event::new(
            "Builder League",
            start,
            start + Duration::weeks(weeks),
            EventKind::League {
                games_per_opponent: 1,
                include_playoffs: false,
                playoff_team_count: 4,
                scoring: LeagueScoring::default(),
                single_division: true,
            },
            MatchDuration::Flat { minutes: 55 },
        );
        for i in 0..teams {
            let team = Team::new(&event.id, format!("Team {}", i + 1), i as u32 + 1);
            event.teams.insert(team.id.clone(), team);
        }
        for i in 0..fields {
            let field = PlayingField::new(&event.id, i as u32 + 1);
            event.fields.insert(field.id.clone(), field);
        }
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(Weekday::Sat, 540, 780, anchor));
        event
    }

    #[test]
    fn test_validate_event_reports_capacity() {
        // 8 teams / 28 matches over 2 weeks of one 4-hour window.
        let diag = validate_event(&league(8, 1, 2), None).unwrap();
        assert_eq!(diag.required_matches, 28);
        assert!(diag.extra_weeks_needed() > 0);

        let roomy = validate_event(&league(4, 1, 8), None).unwrap();
        assert_eq!(roomy.extra_weeks_needed(), 0);

        let mut broken = league(4, 1, 8);
        broken.time_slots.clear();
        assert!(validate_event(&broken, None).is_err());
    }

    #[test]
    fn test_rejects_inverted_date_range() {
        let mut event = league(4, 1, 8);
        event.end = event.start - Duration::days(1);
        let err = schedule_event(event).unwrap_err();
        match err {
            ScheduleFailure::Misconfigured(msg) => assert!(msg.contains("before it starts")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_league_requires_recurring_slots() {
        let mut event = league(4, 1, 8);
        event.time_slots.clear();
        let err = schedule_event(event).unwrap_err();
        match err {
            ScheduleFailure::Misconfigured(msg) => {
                assert_eq!(msg, "no recurring time slots configured")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_no_fields_fails_without_retrying() {
        let event = league(4, 0, 8);
        let err = schedule_event(event).unwrap_err();
        assert!(matches!(err, ScheduleFailure::Misconfigured(_)));
    }

    #[test]
    fn test_round_robin_schedule_complete() {
        let built = schedule_event(league(4, 2, 8)).unwrap();
        assert_eq!(built.matches.len(), 6);
        assert!(built.matches.values().all(|m| m.is_scheduled()));
        // End snapped to the last match.
        assert_eq!(built.end, built.last_match_end().unwrap());
    }

    #[test]
    fn test_undersized_window_is_extended() {
        // 8 teams / 28 matches need 7 four-hour windows on one field; a
        // one-week season must be extended to fit.
        let built = schedule_event(league(8, 1, 1)).unwrap();
        assert_eq!(built.matches.len(), 28);
        assert!(built.matches.values().all(|m| m.is_scheduled()));
    }

    #[test]
    fn test_open_ended_league_with_capacity_succeeds() {
        let mut event = league(6, 1, 0);
        event.end = event.start;
        let built = schedule_event(event).unwrap();
        assert_eq!(built.matches.len(), 15);
        assert!(built.end > built.start);
    }

    #[test]
    fn test_open_ended_undersized_fails_with_diagnostic() {
        // One 1-hour weekly window for 20 teams: 190 matches never fit the
        // 52-week horizon, so the bound of 3 extensions is exhausted.
        let mut event = league(20, 1, 0);
        event.end = event.start;
        event.time_slots.clear();
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(Weekday::Sat, 540, 600, anchor));

        let err = schedule_event(event).unwrap_err();
        match err {
            ScheduleFailure::CapacityExceeded(diag) => {
                let msg = diag.to_string();
                assert!(msg.contains("190 matches"));
                assert!(msg.contains("hours per week"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_retry_resets_roster() {
        // Placeholder fill happens inside attempts; the successful result has
        // exactly the requested projection, not an accumulation across
        // retries.
        let mut event = league(2, 1, 1);
        let opts = ScheduleOptions {
            participant_count: Some(6),
            max_retries: 3,
        };
        event.end = event.start + Duration::weeks(1);
        let built = schedule_event_with(event, &opts).unwrap();
        assert_eq!(built.teams.len(), 6);
        assert_eq!(built.teams.values().filter(|t| t.placeholder).count(), 4);
        assert_eq!(built.matches.len(), 15);
    }

    #[test]
    fn test_league_playoffs_skeleton_appended() {
        let mut event = league(4, 2, 10);
        event.kind = EventKind::League {
            games_per_opponent: 1,
            include_playoffs: true,
            playoff_team_count: 4,
            scoring: LeagueScoring::default(),
            single_division: true,
        };
        let built = schedule_event(event).unwrap();

        // 6 round-robin matches plus a 4-team single-elimination skeleton.
        assert_eq!(built.regular_match_ids().len(), 6);
        let playoffs = built.playoff_match_ids();
        assert_eq!(playoffs.len(), 3);
        for mid in &playoffs {
            let m = &built.matches[mid];
            assert!(m.is_scheduled(), "skeleton match not placed");
            assert!(m.team1.is_none() || m.previous_left.is_some());
        }
        // Semifinal slots carry seeds awaiting standings.
        let semis: Vec<_> = playoffs
            .iter()
            .map(|id| &built.matches[id])
            .filter(|m| m.previous_left.is_none())
            .collect();
        assert_eq!(semis.len(), 2);
        assert_eq!(semis[0].team1_seed, Some(4));
        assert_eq!(semis[0].team2_seed, Some(1));
    }

    #[test]
    fn test_tournament_weekend_capacity_scenario() {
        // 32 teams, single field, two 4-hour weekend windows per week.
        let start = Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap();
        let mut event = Event::new(
            "Winter Cup",
            start,
            start + Duration::weeks(12),
            EventKind::Tournament {
                elimination: EliminationMode::Single,
                max_participants: Some(32),
            },
            MatchDuration::Flat { minutes: 55 },
        );
        for i in 0..32 {
            let team = Team::new(&event.id, format!("Team {}", i + 1), 32 - i as u32);
            event.teams.insert(team.id.clone(), team);
        }
        let field = PlayingField::new(&event.id, 1);
        event.fields.insert(field.id.clone(), field);
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(Weekday::Sat, 540, 780, anchor));
        event
            .time_slots
            .push(TimeSlot::new(Weekday::Sun, 540, 780, anchor));

        let built = schedule_event(event).unwrap();
        assert_eq!(built.matches.len(), 31);

        for m in built.matches.values() {
            let s = m.start.unwrap();
            let weekday = s.weekday();
            assert!(weekday == Weekday::Sat || weekday == Weekday::Sun);
            assert!(s.hour() >= 9);
            assert!(m.end.unwrap().hour() <= 13);
        }

        // A 31-match single-field bracket cannot finish in the first weekend;
        // the final lands at least two weeks out.
        let last_start = built.matches.values().filter_map(|m| m.start).max().unwrap();
        assert!(last_start >= start + Duration::weeks(2));
    }
}
