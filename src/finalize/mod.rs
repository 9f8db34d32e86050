//! Result recording and match finalization.
//!
//! Finalizing a match folds its result into the aggregate: win/loss counters,
//! bracket advancement, playoff seeding once the regular season completes, and
//! a re-placement pass that lets downstream playoff matches move up and pick
//! up officials once their teams are known. Regular-season placements are
//! never touched by finalization.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{place_matches, ScheduleFailure};
use crate::models::{
    DivisionId, Event, EventKind, Match, MatchDuration, MatchId, MatchOutcome,
};
use crate::standings::compute_standings;

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("no match with id {0}")]
    UnknownMatch(MatchId),

    #[error("match {0} has no recorded result")]
    NotScored(MatchId),

    #[error("invalid result: {0}")]
    InvalidResult(String),

    #[error(transparent)]
    Scheduling(#[from] ScheduleFailure),
}

/// What one finalization changed.
#[derive(Debug, Default)]
pub struct FinalizeReport {
    pub outcome: Option<MatchOutcome>,
    /// Bracket matches that received a team through advancement.
    pub advanced: Vec<MatchId>,
    /// Playoff matches re-placed after this result.
    pub rescheduled: usize,
    pub playoffs_seeded: bool,
}

/// Record a match result.
///
/// Set-based events take one score per set for each team and derive the
/// per-set winners; a tied set is rejected. Flat-duration events take a single
/// total per team and may end in a draw.
pub fn record_result(
    event: &mut Event,
    match_id: &MatchId,
    team1_points: Vec<u32>,
    team2_points: Vec<u32>,
) -> Result<(), FinalizeError> {
    let sets = match event.duration {
        MatchDuration::Sets { .. } => Some(event.duration.sets_per_match()),
        MatchDuration::Flat { .. } => None,
    };
    let m = event
        .matches
        .get_mut(match_id)
        .ok_or_else(|| FinalizeError::UnknownMatch(match_id.clone()))?;
    if m.team1.is_none() || m.team2.is_none() {
        return Err(FinalizeError::InvalidResult(
            "both teams must be assigned before a result is recorded".to_string(),
        ));
    }

    match sets {
        Some(expected) => {
            if team1_points.len() != expected || team2_points.len() != expected {
                return Err(FinalizeError::InvalidResult(format!(
                    "expected {} set scores per team, got {} and {}",
                    expected,
                    team1_points.len(),
                    team2_points.len()
                )));
            }
            let mut set_results = Vec::with_capacity(expected);
            for (i, (p1, p2)) in team1_points.iter().zip(&team2_points).enumerate() {
                match p1.cmp(p2) {
                    std::cmp::Ordering::Greater => set_results.push(1),
                    std::cmp::Ordering::Less => set_results.push(2),
                    std::cmp::Ordering::Equal => {
                        return Err(FinalizeError::InvalidResult(format!(
                            "set {} has no winner ({}-{})",
                            i + 1,
                            p1,
                            p2
                        )))
                    }
                }
            }
            m.set_results = set_results;
        }
        None => {
            if team1_points.len() != 1 || team2_points.len() != 1 {
                return Err(FinalizeError::InvalidResult(
                    "flat-duration events record one total per team".to_string(),
                ));
            }
            m.set_results = Vec::new();
        }
    }
    m.team1_points = team1_points;
    m.team2_points = team2_points;
    Ok(())
}

/// Finalize a scored match.
///
/// Callers finalize each match exactly once; re-finalizing would double-count
/// win/loss totals.
pub fn finalize_match(
    event: &mut Event,
    match_id: &MatchId,
    now: DateTime<Utc>,
) -> Result<FinalizeReport, FinalizeError> {
    let m = event
        .matches
        .get(match_id)
        .ok_or_else(|| FinalizeError::UnknownMatch(match_id.clone()))?;
    if !m.is_scored() {
        return Err(FinalizeError::NotScored(match_id.clone()));
    }
    let m = m.clone();
    let mut report = FinalizeReport {
        outcome: m.outcome(),
        ..FinalizeReport::default()
    };

    update_counters(event, &m);
    advance_teams(event, &m, &mut report);

    if event.is_league() && !m.is_playoff() {
        report.playoffs_seeded = maybe_seed_playoffs(event);
    }

    if m.is_playoff() || report.playoffs_seeded {
        report.rescheduled = reschedule_playoffs(event, now.max(event.start))?;
    }

    info!(match_id = %match_id, outcome = ?report.outcome, "match finalized");
    Ok(report)
}

fn update_counters(event: &mut Event, m: &Match) {
    let (winner, loser) = (m.winner().cloned(), m.loser().cloned());
    if let Some(team) = winner.and_then(|id| event.teams.get_mut(&id)) {
        team.wins += 1;
    }
    if let Some(team) = loser.and_then(|id| event.teams.get_mut(&id)) {
        team.losses += 1;
    }
}

/// Push the winner and loser into the bracket matches this one feeds. The
/// receiving side is the one whose previous-match pointer names this match;
/// when both point here (a grand-final rematch) the winner takes side one.
fn advance_teams(event: &mut Event, m: &Match, report: &mut FinalizeReport) {
    if let (Some(next_id), Some(winner)) = (&m.winner_next, m.winner().cloned()) {
        if let Some(next) = event.matches.get_mut(next_id) {
            if next.previous_left.as_ref() == Some(&m.id) {
                next.team1 = Some(winner);
            } else {
                next.team2 = Some(winner);
            }
            report.advanced.push(next_id.clone());
        }
    }
    if let (Some(next_id), Some(loser)) = (&m.loser_next, m.loser().cloned()) {
        if let Some(next) = event.matches.get_mut(next_id) {
            if next.previous_right.as_ref() == Some(&m.id) {
                next.team2 = Some(loser);
            } else {
                next.team1 = Some(loser);
            }
            report.advanced.push(next_id.clone());
        }
    }
}

/// Fill playoff entry slots from standings once every regular-season match is
/// scored. Seed numbers were fixed when the skeleton was built: the table
/// leader takes the highest seed. Slots beyond the number of real teams stay
/// open.
fn maybe_seed_playoffs(event: &mut Event) -> bool {
    let regular = event.regular_match_ids();
    if regular.is_empty() || !regular.iter().all(|id| event.matches[id].is_scored()) {
        return false;
    }

    let unseeded: Vec<MatchId> = event
        .playoff_match_ids()
        .into_iter()
        .filter(|id| {
            let m = &event.matches[id];
            (m.team1.is_none() && m.team1_seed.is_some())
                || (m.team2.is_none() && m.team2_seed.is_some())
        })
        .collect();
    if unseeded.is_empty() {
        return false;
    }

    let mut seeded_any = false;
    for mid in unseeded {
        let division = event.matches[&mid].division.clone();
        let table = compute_standings(event, division.as_ref());
        let k = event.playoff_team_count_for(division.as_ref());

        let team_for_seed = |seed: u32| -> Option<crate::models::TeamId> {
            // seed k is rank 1, seed 1 is rank k
            let rank = k.checked_sub(seed)? as usize;
            table.get(rank).map(|row| row.team_id.clone())
        };

        let m = event.matches.get_mut(&mid).unwrap();
        if m.team1.is_none() {
            if let Some(team) = m.team1_seed.and_then(team_for_seed) {
                m.team1 = Some(team);
                seeded_any = true;
            }
        }
        if m.team2.is_none() {
            if let Some(team) = m.team2_seed.and_then(team_for_seed) {
                m.team2 = Some(team);
                seeded_any = true;
            }
        }
    }
    if seeded_any {
        info!("regular season complete; playoff bracket seeded");
    }
    seeded_any
}

/// Re-place every unscored playoff match that hasn't started yet, letting the
/// engine pull matches forward behind finished dependencies and fill in
/// officials for newly seeded pairings. Regular-season and in-progress
/// matches keep their slots.
fn reschedule_playoffs(event: &mut Event, from: DateTime<Utc>) -> Result<usize, FinalizeError> {
    let queue: Vec<MatchId> = event
        .playoff_match_ids()
        .into_iter()
        .filter(|id| {
            let m = &event.matches[id];
            !m.is_scored() && m.start.map(|s| s >= from).unwrap_or(true)
        })
        .collect();
    if queue.is_empty() {
        return Ok(0);
    }

    for mid in &queue {
        let m = event.matches.get_mut(mid).unwrap();
        let field = m.field.clone();
        m.unschedule();
        if let Some(field) = field.and_then(|f| event.fields.get_mut(&f)) {
            field.unbook_match(mid);
        }
    }
    debug!(count = queue.len(), "re-placing playoff matches");
    let report = place_matches(event, &queue, from)?;
    Ok(report.placed.len())
}
