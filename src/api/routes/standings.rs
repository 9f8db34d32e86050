use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::EntityId;
use crate::standings::{compute_standings, StandingRow};

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    /// Division id to scope the table to.
    pub division: Option<String>,
}

pub async fn get_standings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<Vec<StandingRow>>, ApiError> {
    let event = state.store.load(&EntityId::from(id))?;
    let division = params.division.map(EntityId::from);
    if let Some(d) = &division {
        if !event.divisions.iter().any(|div| &div.id == d) {
            return Err(ApiError::NotFound(format!("Division not found: {}", d)));
        }
    }
    Ok(Json(compute_standings(&event, division.as_ref())))
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
    use crate::finalize::{finalize_match, record_result};
    use crate::models::{
        Event, EventKind, LeagueScoring, MatchDuration, PlayingField, Team, TimeSlot,
    };
    use crate::storage::EventStore;

    #[tokio::test]
    async fn test_standings_route() {
        let start = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let mut event = Event::new(
            "Standings Route League",
            start,
            start + chrono::Duration::weeks(8),
            EventKind::League {
                games_per_opponent: 1,
                include_playoffs: false,
                playoff_team_count: 4,
                scoring: LeagueScoring::default(),
                single_division: true,
            },
            MatchDuration::Flat { minutes: 55 },
        );
        for i in 0..3 {
            let team = Team::new(&event.id, format!("Team {}", i + 1), 1);
            event.teams.insert(team.id.clone(), team);
        }
        let field = PlayingField::new(&event.id, 1);
        event.fields.insert(field.id.clone(), field);
        let anchor = chrono::NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        event
            .time_slots
            .push(TimeSlot::new(chrono::Weekday::Sat, 540, 780, anchor));

        let mut built = schedule_event(event).unwrap();
        let mid = built.regular_match_ids()[0].clone();
        record_result(&mut built, &mid, vec![25], vec![10]).unwrap();
        let now = built.start;
        finalize_match(&mut built, &mid, now).unwrap();

        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        store.save(&built).unwrap();
        let app = build_router(AppState::new(store, 3));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/events/{}/standings", built.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 3);
        assert_eq!(rows[0]["rank"], 1);
        assert_eq!(rows[0]["points"], 3.0);
        assert_eq!(rows[0]["wins"], 1);
    }

    #[tokio::test]
    async fn test_standings_unknown_division_is_404() {
        let start = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let event = Event::new(
            "Empty League",
            start,
            start + chrono::Duration::weeks(8),
            EventKind::League {
                games_per_opponent: 1,
                include_playoffs: false,
                playoff_team_count: 4,
                scoring: LeagueScoring::default(),
                single_division: true,
            },
            MatchDuration::Flat { minutes: 55 },
        );
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        store.save(&event).unwrap();
        let app = build_router(AppState::new(store, 3));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/events/{}/standings?division=nope", event.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
