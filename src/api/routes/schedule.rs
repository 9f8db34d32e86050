use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::routes::MatchView;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::builder::{schedule_event_with, ScheduleOptions};
use crate::models::EntityId;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildScheduleRequest {
    /// Overrides the projected participant count when rosters aren't full.
    pub participant_count: Option<u32>,

    /// Build and return the schedule without persisting it.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildScheduleResponse {
    pub event_id: String,
    pub match_count: usize,
    pub end: String,
    pub matches: Vec<MatchView>,
}

/// Build (or rebuild) the full schedule for an event.
pub async fn build_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<BuildScheduleRequest>>,
) -> Result<Json<BuildScheduleResponse>, ApiError> {
    let id = EntityId::from(id);
    let lock = state.event_lock(&id).await;
    let _guard = lock.lock().await;

    let mut event = state.store.load(&id)?;
    // Rebuilding starts from a clean slate: with every match gone, recorded
    // win/loss totals no longer have results backing them.
    event.matches.clear();
    event.teams.retain(|_, t| !t.placeholder);
    for team in event.teams.values_mut() {
        team.wins = 0;
        team.losses = 0;
    }
    for field in event.fields.values_mut() {
        field.bookings.retain(|b| b.match_id.is_none());
    }

    let Json(req) = body.unwrap_or_default();
    let opts = ScheduleOptions {
        participant_count: req.participant_count,
        max_retries: state.max_retries,
    };
    let built = schedule_event_with(event, &opts)?;
    if !req.dry_run {
        state.store.save(&built)?;
    }

    let mut ordered = built.regular_match_ids();
    ordered.extend(built.playoff_match_ids());
    Ok(Json(BuildScheduleResponse {
        event_id: built.id.to_string(),
        match_count: built.matches.len(),
        end: built.end.to_rfc3339(),
        matches: ordered
            .iter()
            .map(|mid| MatchView::from_match(&built, &built.matches[mid]))
            .collect(),
    }))
}

/// The event's matches in schedule order, regular season first.
pub async fn list_matches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MatchView>>, ApiError> {
    let event = state.store.load(&EntityId::from(id))?;
    let mut ordered = event.regular_match_ids();
    ordered.extend(event.playoff_match_ids());
    Ok(Json(
        ordered
            .iter()
            .map(|mid| MatchView::from_match(&event, &event.matches[mid]))
            .collect(),
    ))
}
