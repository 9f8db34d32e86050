//! League standings computed from scored regular-season matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{DivisionId, Event, EventKind, LeagueScoring, MatchOutcome, TeamId};

/// One team's row in a standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub rank: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub points: f64,
}

impl StandingRow {
    pub fn differential(&self) -> i64 {
        i64::from(self.points_for) - i64::from(self.points_against)
    }
}

/// Compute the standings table for a division (or the whole event when
/// `division` is `None`).
///
/// Only scored matches without bracket linkage count; playoff results never
/// alter the regular-season table. Rows are ranked by points, then wins, then
/// score differential, then points scored, with team name as the final
/// deterministic tie-break.
pub fn compute_standings(event: &Event, division: Option<&DivisionId>) -> Vec<StandingRow> {
    let scoring = match &event.kind {
        EventKind::League { scoring, .. } => *scoring,
        EventKind::Tournament { .. } => LeagueScoring::default(),
    };

    let mut rows: BTreeMap<TeamId, StandingRow> = event
        .teams
        .values()
        .filter(|t| !t.placeholder)
        .filter(|t| division.is_none() || t.division.as_ref() == division)
        .map(|t| {
            (
                t.id.clone(),
                StandingRow {
                    team_id: t.id.clone(),
                    team_name: t.name.clone(),
                    rank: 0,
                    played: 0,
                    wins: 0,
                    draws: 0,
                    losses: 0,
                    points_for: 0,
                    points_against: 0,
                    points: 0.0,
                },
            )
        })
        .collect();

    for m in event.matches.values() {
        if m.is_playoff() || !m.is_scored() {
            continue;
        }
        if division.is_some() && m.division.as_ref() != division {
            continue;
        }
        let (Some(team1), Some(team2)) = (&m.team1, &m.team2) else {
            continue;
        };
        let Some(outcome) = m.outcome() else {
            continue;
        };
        let t1_points: u32 = m.team1_points.iter().sum();
        let t2_points: u32 = m.team2_points.iter().sum();

        if let Some(row) = rows.get_mut(team1) {
            row.played += 1;
            row.points_for += t1_points;
            row.points_against += t2_points;
            match outcome {
                MatchOutcome::Team1Win => row.wins += 1,
                MatchOutcome::Team2Win => row.losses += 1,
                MatchOutcome::Draw => row.draws += 1,
            }
        }
        if let Some(row) = rows.get_mut(team2) {
            row.played += 1;
            row.points_for += t2_points;
            row.points_against += t1_points;
            match outcome {
                MatchOutcome::Team1Win => row.losses += 1,
                MatchOutcome::Team2Win => row.wins += 1,
                MatchOutcome::Draw => row.draws += 1,
            }
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    for row in &mut table {
        row.points = league_points(&scoring, row);
    }

    table.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| b.differential().cmp(&a.differential()))
            .then_with(|| b.points_for.cmp(&a.points_for))
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    for (i, row) in table.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    table
}

fn league_points(scoring: &LeagueScoring, row: &StandingRow) -> f64 {
    let raw = f64::from(row.wins) * scoring.points_for_win
        + f64::from(row.draws) * scoring.points_for_draw
        + f64::from(row.losses) * scoring.points_for_loss
        + f64::from(row.points_for) * scoring.points_per_goal_scored
        + f64::from(row.points_against) * scoring.points_per_goal_conceded;
    let factor = 10f64.powi(scoring.precision as i32);
    (raw * factor).round() / factor
}
