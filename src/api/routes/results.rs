use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::finalize::{finalize_match, record_result};
use crate::models::{EntityId, MatchOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResultRequest {
    /// One score per set for set-based events, one total otherwise.
    pub team1_points: Vec<u32>,
    pub team2_points: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResultResponse {
    pub match_id: String,
    pub outcome: Option<MatchOutcome>,
    pub advanced: Vec<String>,
    pub rescheduled: usize,
    pub playoffs_seeded: bool,
}

/// Record a result and finalize the match in one step.
pub async fn record_match_result(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(String, String)>,
    Json(req): Json<RecordResultRequest>,
) -> Result<Json<RecordResultResponse>, ApiError> {
    let id = EntityId::from(id);
    let match_id = EntityId::from(match_id);
    let lock = state.event_lock(&id).await;
    let _guard = lock.lock().await;

    let mut event = state.store.load(&id)?;
    if event
        .matches
        .get(&match_id)
        .is_some_and(|m| m.is_scored())
    {
        return Err(ApiError::BadRequest(format!(
            "match {} already has a finalized result",
            match_id
        )));
    }

    record_result(&mut event, &match_id, req.team1_points, req.team2_points)?;
    let report = finalize_match(&mut event, &match_id, Utc::now())?;
    state.store.save(&event)?;

    Ok(Json(RecordResultResponse {
        match_id: match_id.to_string(),
        outcome: report.outcome,
        advanced: report.advanced.iter().map(|m| m.to_string()).collect(),
        rescheduled: report.rescheduled,
        playoffs_seeded: report.playoffs_seeded,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::api::{build_router, state::AppState};
    use crate::builder::schedule_event;
    use crate::models::{
        EliminationMode, Event, EventKind, MatchDuration, PlayingField, Team, TimeSlot,
    };
    use crate::storage::EventStore;

    fn stored_built_tournament(store: &EventStore) -> Event {
        let start = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let mut event = Event::new(
            "Result Cup",
            start,
            start + chrono::Duration::weeks(8),
            EventKind::Tournament {
                elimination: EliminationMode::Single,
                max_participants: None,
            },
            MatchDuration::Flat { minutes: 55 },
        );
        for i in 0..4 {
            let team = Team::new(&event.id, format!("Team {}", i + 1), 4 - i as u32);
            event.teams.insert(team.id.clone(), team);
        }
        let field = PlayingField::new(&event.id, 1);
        event.fields.insert(field.id.clone(), field);
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(chrono::Weekday::Sat, 540, 780, anchor));
        let built = schedule_event(event).unwrap();
        store.save(&built).unwrap();
        built
    }

    async fn post_result(
        app: axum::Router,
        event_id: &str,
        match_id: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/events/{}/matches/{}/result",
                        event_id, match_id
                    ))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_record_result_advances_bracket() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        let event = stored_built_tournament(&store);
        let semi = event
            .playoff_match_ids()
            .into_iter()
            .find(|id| event.matches[id].previous_left.is_none())
            .unwrap();
        let state = AppState::new(store, 3);
        let app = build_router(state.clone());

        let (status, body) = post_result(
            app,
            event.id.as_str(),
            semi.as_str(),
            r#"{"team1Points": [25], "team2Points": [18]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "team1_win");
        assert_eq!(body["advanced"].as_array().unwrap().len(), 1);

        // A second submission for the same match is rejected.
        let app = build_router(state);
        let (status, _) = post_result(
            app,
            event.id.as_str(),
            semi.as_str(),
            r#"{"team1Points": [25], "team2Points": [18]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_record_result_unknown_match_is_404() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        let event = stored_built_tournament(&store);
        let app = build_router(AppState::new(store, 3));

        let (status, _) = post_result(
            app,
            event.id.as_str(),
            "missing",
            r#"{"team1Points": [25], "team2Points": [18]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
