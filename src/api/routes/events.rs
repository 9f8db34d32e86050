use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::api::routes::MatchView;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{
    Division, EntityId, Event, EventKind, MatchDuration, PlayingField, Referee, Team, TimeSlot,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub start: DateTime<Utc>,
    /// Equal to `start` for an open-ended schedule.
    pub end: DateTime<Utc>,
    pub kind: EventKind,
    pub duration: MatchDuration,
    #[serde(default)]
    pub do_teams_ref: bool,
    #[serde(default)]
    pub divisions: Vec<DivisionSpec>,
    #[serde(default)]
    pub teams: Vec<TeamSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub referees: Vec<String>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlotSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionSpec {
    pub name: String,
    pub max_participants: Option<u32>,
    pub playoff_team_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSpec {
    pub name: String,
    pub seed: u32,
    pub captain: Option<String>,
    /// Division name, when the event has divisions.
    pub division: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub field_number: u32,
    /// Division names allowed on this field. Empty means open to all.
    #[serde(default)]
    pub divisions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotSpec {
    pub day_of_week: Weekday,
    /// "HH:mm" wall-clock opening time.
    pub start: String,
    /// "HH:mm" wall-clock closing time (exclusive).
    pub end: String,
    /// Defaults to the event start date.
    pub anchor: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    #[serde(default = "default_repeating")]
    pub repeating: bool,
}

fn default_repeating() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    pub start: String,
    pub end: String,
    pub kind: &'static str,
    pub team_count: usize,
    pub match_count: usize,
    pub scheduled: bool,
}

impl EventSummary {
    fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            name: event.name.clone(),
            start: event.start.to_rfc3339(),
            end: event.end.to_rfc3339(),
            kind: if event.is_league() { "league" } else { "tournament" },
            team_count: event.teams.len(),
            match_count: event.matches.len(),
            scheduled: !event.matches.is_empty(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: String,
    pub name: String,
    pub seed: u32,
    pub division: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub placeholder: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub summary: EventSummary,
    pub teams: Vec<TeamView>,
    pub matches: Vec<MatchView>,
}

fn detail(event: &Event) -> EventDetailResponse {
    let teams = event
        .teams
        .values()
        .map(|t| TeamView {
            id: t.id.to_string(),
            name: t.name.clone(),
            seed: t.seed,
            division: t.division.as_ref().map(|d| d.to_string()),
            wins: t.wins,
            losses: t.losses,
            placeholder: t.placeholder,
        })
        .collect();
    let mut ordered = event.regular_match_ids();
    ordered.extend(event.playoff_match_ids());
    let matches = ordered
        .iter()
        .map(|id| MatchView::from_match(event, &event.matches[id]))
        .collect();
    EventDetailResponse {
        summary: EventSummary::from_event(event),
        teams,
        matches,
    }
}

/// Build the domain aggregate from a create request.
fn build_event(req: CreateEventRequest) -> Result<Event, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("event name must not be empty".to_string()));
    }

    let mut event = Event::new(req.name, req.start, req.end, req.kind, req.duration);
    event.do_teams_ref = req.do_teams_ref;

    for spec in req.divisions {
        let mut division = Division::new(&event.id, spec.name);
        if let Some(max) = spec.max_participants {
            division = division.with_max_participants(max);
        }
        if let Some(k) = spec.playoff_team_count {
            division = division.with_playoff_team_count(k);
        }
        event.divisions.push(division);
    }

    let division_id = |event: &Event, name: &str| {
        event
            .divisions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.id.clone())
            .ok_or_else(|| ApiError::BadRequest(format!("unknown division: {}", name)))
    };

    for spec in req.teams {
        let mut team = Team::new(&event.id, spec.name, spec.seed);
        if let Some(captain) = spec.captain {
            team = team.with_captain(captain);
        }
        if let Some(name) = &spec.division {
            team.division = Some(division_id(&event, name)?);
        }
        event.teams.insert(team.id.clone(), team);
    }

    for spec in req.fields {
        let mut field = PlayingField::new(&event.id, spec.field_number);
        for name in &spec.divisions {
            field.divisions.push(division_id(&event, name)?);
        }
        event.fields.insert(field.id.clone(), field);
    }

    for name in req.referees {
        let referee = Referee::new(&event.id, name);
        event.referees.insert(referee.id.clone(), referee);
    }

    let default_anchor = event.start.date_naive();
    for spec in req.time_slots {
        let anchor = spec.anchor.unwrap_or(default_anchor);
        let mut slot = TimeSlot::from_hhmm(spec.day_of_week, &spec.start, &spec.end, anchor)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "invalid time slot window {}-{}",
                    spec.start, spec.end
                ))
            })?;
        if let Some(until) = spec.until {
            slot = slot.with_until(until);
        }
        if !spec.repeating {
            slot = slot.one_off();
        }
        event.time_slots.push(slot);
    }

    Ok(event)
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventDetailResponse>), ApiError> {
    let event = build_event(req)?;
    state.store.save(&event)?;
    Ok((StatusCode::CREATED, Json(detail(&event))))
}

pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    let events = state.store.load_all()?;
    Ok(Json(events.iter().map(EventSummary::from_event).collect()))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailResponse>, ApiError> {
    let event = state.store.load(&EntityId::from(id))?;
    Ok(Json(detail(&event)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = EntityId::from(id);
    let lock = state.event_lock(&id).await;
    let _guard = lock.lock().await;
    state.store.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
