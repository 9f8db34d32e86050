//! REST API endpoints.
//!
//! Axum-based HTTP API for creating events, building schedules, recording
//! results, and reading standings.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::ScheduleFailure;
use crate::finalize::FinalizeError;
use crate::storage::StorageError;

pub mod routes;
pub mod state;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The requested schedule cannot be built with the configured capacity.
    #[error("{0}")]
    Unschedulable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unschedulable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::EventNotFound(id) => ApiError::NotFound(format!("Event not found: {}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ScheduleFailure> for ApiError {
    fn from(err: ScheduleFailure) -> Self {
        match err {
            ScheduleFailure::Misconfigured(msg) => ApiError::BadRequest(msg),
            ScheduleFailure::CapacityExceeded(diag) => ApiError::Unschedulable(diag.to_string()),
        }
    }
}

impl From<FinalizeError> for ApiError {
    fn from(err: FinalizeError) -> Self {
        match err {
            FinalizeError::UnknownMatch(id) => ApiError::NotFound(format!("Match not found: {}", id)),
            FinalizeError::NotScored(_) | FinalizeError::InvalidResult(_) => {
                ApiError::BadRequest(err.to_string())
            }
            FinalizeError::Scheduling(inner) => inner.into(),
        }
    }
}

/// Build the API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/events",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/api/events/:id",
            get(routes::events::get_event).delete(routes::events::delete_event),
        )
        .route("/api/events/:id/schedule", post(routes::schedule::build_schedule))
        .route("/api/events/:id/matches", get(routes::schedule::list_matches))
        .route(
            "/api/events/:id/matches/:match_id/result",
            post(routes::results::record_match_result),
        )
        .route("/api/events/:id/standings", get(routes::standings::get_standings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(crate::storage::EventStore::new(dir.path()), 3);
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_event_is_404() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(crate::storage::EventStore::new(dir.path()), 3);
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
