//! Route handlers and wire types.

use axum::Json;
use serde::Serialize;

use crate::models::{Event, Match};

pub mod events;
pub mod results;
pub mod schedule;
pub mod standings;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// One match on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: String,
    /// "regular" or "playoff".
    pub match_type: &'static str,
    /// 1-based week of the season this match is placed in.
    pub week_number: Option<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub field_id: Option<String>,
    pub field_number: Option<u32>,
    pub division: Option<String>,
    pub team1_id: Option<String>,
    pub team1_name: Option<String>,
    pub team2_id: Option<String>,
    pub team2_name: Option<String>,
    pub team1_seed: Option<u32>,
    pub team2_seed: Option<u32>,
    pub referee_name: Option<String>,
    pub team_referee_name: Option<String>,
    pub team1_points: Vec<u32>,
    pub team2_points: Vec<u32>,
    pub set_results: Vec<u8>,
    /// "pending", "scheduled", or "scored".
    pub status: &'static str,
}

impl MatchView {
    pub fn from_match(event: &Event, m: &Match) -> Self {
        let team_name = |id: &Option<crate::models::TeamId>| {
            id.as_ref()
                .and_then(|t| event.teams.get(t))
                .map(|t| t.name.clone())
        };
        let field = m.field.as_ref().and_then(|f| event.fields.get(f));
        let status = if m.is_scored() {
            "scored"
        } else if m.is_scheduled() {
            "scheduled"
        } else {
            "pending"
        };
        Self {
            id: m.id.to_string(),
            match_type: if m.is_playoff() { "playoff" } else { "regular" },
            week_number: m.start.map(|s| (s - event.start).num_days() / 7 + 1),
            start: m.start.map(|s| s.to_rfc3339()),
            end: m.end.map(|e| e.to_rfc3339()),
            field_id: m.field.as_ref().map(|f| f.to_string()),
            field_number: field.map(|f| f.field_number),
            division: m.division.as_ref().map(|d| d.to_string()),
            team1_id: m.team1.as_ref().map(|t| t.to_string()),
            team1_name: team_name(&m.team1),
            team2_id: m.team2.as_ref().map(|t| t.to_string()),
            team2_name: team_name(&m.team2),
            team1_seed: m.team1_seed,
            team2_seed: m.team2_seed,
            referee_name: m
                .referee
                .as_ref()
                .and_then(|r| event.referees.get(r))
                .map(|r| r.name.clone()),
            team_referee_name: team_name(&m.team_referee),
            team1_points: m.team1_points.clone(),
            team2_points: m.team2_points.clone(),
            set_results: m.set_results.clone(),
            status,
        }
    }
}
