//! Match model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DivisionId, EntityId, FieldId, MatchId, RefereeId, TeamId};

/// Outcome of a scored match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Team1Win,
    Team2Win,
    Draw,
}

/// A single match between two teams.
///
/// Teams are nullable: a bracket slot awaits a prior round's winner until
/// advancement fills it, and a league playoff skeleton awaits seeding. A match
/// with any bracket-linkage pointer set is a playoff match; all others are
/// regular-season/pool matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,

    /// Sequence number used for dependency ordering during placement.
    pub sequence: Option<u32>,

    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    /// Field this match is placed on.
    pub field: Option<FieldId>,

    /// Division scoping participants and field eligibility.
    pub division: Option<DivisionId>,

    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,

    /// Seed numbers for playoff slots whose teams standings haven't filled yet.
    pub team1_seed: Option<u32>,
    pub team2_seed: Option<u32>,

    /// Dedicated official, when the event uses individual referees.
    pub referee: Option<RefereeId>,

    /// Team serving as official, when teams referee each other.
    pub team_referee: Option<TeamId>,

    /// Per-set scores.
    pub team1_points: Vec<u32>,
    pub team2_points: Vec<u32>,

    /// Per-set winner: 0 undecided, 1 or 2.
    pub set_results: Vec<u8>,

    /// Bracket linkage: child matches feeding this one.
    pub previous_left: Option<MatchId>,
    pub previous_right: Option<MatchId>,

    /// Bracket linkage: matches each outcome feeds into.
    pub winner_next: Option<MatchId>,
    pub loser_next: Option<MatchId>,

    /// Whether this match belongs to a double-elimination losers bracket.
    pub losers_bracket: bool,
}

impl Match {
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            sequence: None,
            start: None,
            end: None,
            field: None,
            division: None,
            team1: None,
            team2: None,
            team1_seed: None,
            team2_seed: None,
            referee: None,
            team_referee: None,
            team1_points: Vec::new(),
            team2_points: Vec::new(),
            set_results: Vec::new(),
            previous_left: None,
            previous_right: None,
            winner_next: None,
            loser_next: None,
            losers_bracket: false,
        }
    }

    /// Create a regular-season pairing between two known teams.
    pub fn pairing(id: MatchId, team1: TeamId, team2: TeamId) -> Self {
        let mut m = Self::new(id);
        m.team1 = Some(team1);
        m.team2 = Some(team2);
        m
    }

    /// A match with any bracket-linkage pointer set is a playoff match.
    pub fn is_playoff(&self) -> bool {
        self.previous_left.is_some()
            || self.previous_right.is_some()
            || self.winner_next.is_some()
            || self.loser_next.is_some()
    }

    /// Whether this match has been placed on a field and time.
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.field.is_some()
    }

    /// A match is scored once every set has a winner. Events without sets
    /// record flat point totals instead; those are scored once any points
    /// exist.
    pub fn is_scored(&self) -> bool {
        if self.set_results.is_empty() {
            !self.team1_points.is_empty() || !self.team2_points.is_empty()
        } else {
            self.set_results.iter().all(|&r| r == 1 || r == 2)
        }
    }

    /// Sets won by each side, ignoring undecided sets.
    pub fn set_counts(&self) -> (u32, u32) {
        let team1 = self.set_results.iter().filter(|&&r| r == 1).count() as u32;
        let team2 = self.set_results.iter().filter(|&&r| r == 2).count() as u32;
        (team1, team2)
    }

    /// Determine the outcome of a scored match.
    ///
    /// Majority of set wins decides; a resolved set tie is a draw. When no
    /// sets are configured, falls back to total point sums.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        if !self.is_scored() {
            return None;
        }
        if self.set_results.is_empty() {
            let t1: u32 = self.team1_points.iter().sum();
            let t2: u32 = self.team2_points.iter().sum();
            return Some(match t1.cmp(&t2) {
                std::cmp::Ordering::Greater => MatchOutcome::Team1Win,
                std::cmp::Ordering::Less => MatchOutcome::Team2Win,
                std::cmp::Ordering::Equal => MatchOutcome::Draw,
            });
        }
        let (t1, t2) = self.set_counts();
        Some(match t1.cmp(&t2) {
            std::cmp::Ordering::Greater => MatchOutcome::Team1Win,
            std::cmp::Ordering::Less => MatchOutcome::Team2Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        })
    }

    /// The winning team, when the outcome is decisive and teams are assigned.
    pub fn winner(&self) -> Option<&TeamId> {
        match self.outcome()? {
            MatchOutcome::Team1Win => self.team1.as_ref(),
            MatchOutcome::Team2Win => self.team2.as_ref(),
            MatchOutcome::Draw => None,
        }
    }

    /// The losing team, when the outcome is decisive and teams are assigned.
    pub fn loser(&self) -> Option<&TeamId> {
        match self.outcome()? {
            MatchOutcome::Team1Win => self.team2.as_ref(),
            MatchOutcome::Team2Win => self.team1.as_ref(),
            MatchOutcome::Draw => None,
        }
    }

    /// All participants committed during this match's window: both teams,
    /// the team referee, and the individual referee.
    pub fn participants(&self) -> Vec<&EntityId> {
        let mut out = Vec::new();
        if let Some(t) = &self.team1 {
            out.push(t);
        }
        if let Some(t) = &self.team2 {
            out.push(t);
        }
        if let Some(t) = &self.team_referee {
            out.push(t);
        }
        if let Some(r) = &self.referee {
            out.push(r);
        }
        out
    }

    /// Whether a team plays in this match (refereeing doesn't count).
    pub fn involves(&self, team: &TeamId) -> bool {
        self.team1.as_ref() == Some(team) || self.team2.as_ref() == Some(team)
    }

    /// Clear the placement so the engine can re-place this match.
    pub fn unschedule(&mut self) {
        self.start = None;
        self.end = None;
        self.field = None;
    }
}
