//! Time-slot / schedule engine.
//!
//! Assigns each unplaced match a field and a `[start, end)` time by walking
//! forward through time, materializing each slot's weekly occurrence as a
//! candidate window. Within one window the engine fills breadth across fields
//! before advancing in time. Matches whose bracket dependencies aren't
//! finished yet are deferred to a later window.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::{EntityId, Event, FieldId, Match, MatchId, TeamId};
use crate::roundrobin::CapacityDiagnostics;

/// Bounded horizon applied to open-ended schedules so the walk terminates.
pub const HORIZON_WEEKS: i64 = 52;

/// Why a schedule could not be produced.
///
/// Only `CapacityExceeded` is recoverable (by extending the season window);
/// a misconfiguration propagates to the caller unchanged since more time
/// cannot fix it.
#[derive(Debug, Error)]
pub enum ScheduleFailure {
    #[error("{0}")]
    Misconfigured(String),

    #[error("{0}")]
    CapacityExceeded(CapacityDiagnostics),
}

/// Outcome of a placement pass.
#[derive(Debug, Default)]
pub struct PlacementReport {
    pub placed: Vec<MatchId>,
}

/// The end of the schedulable range: the event end, or the bounded horizon
/// for open-ended schedules.
pub fn schedule_horizon(event: &Event) -> DateTime<Utc> {
    if event.is_open_ended() {
        event.start + Duration::weeks(HORIZON_WEEKS)
    } else {
        event.end
    }
}

/// Place every match in `queue` (in order) onto a field and time window,
/// starting the walk at `from`. Already-scheduled matches on the aggregate
/// count as committed bookings.
pub fn place_matches(
    event: &mut Event,
    queue: &[MatchId],
    from: DateTime<Utc>,
) -> Result<PlacementReport, ScheduleFailure> {
    check_field_coverage(event, queue)?;

    let horizon = schedule_horizon(event);
    let dur = Duration::minutes(event.duration.total_minutes());
    if dur <= Duration::zero() {
        return Err(ScheduleFailure::Misconfigured(
            "match duration must be positive".to_string(),
        ));
    }

    let mut placer = Placer::new(event);
    let mut remaining: VecDeque<MatchId> = queue.iter().cloned().collect();
    let mut report = PlacementReport::default();

    let mut week_start = from.date_naive();
    while !remaining.is_empty() && week_datetime(week_start) < horizon {
        for (win_start, win_end) in placer.windows_for_week(week_start, from, horizon) {
            let mut t = win_start;
            while t + dur <= win_end && !remaining.is_empty() {
                let slot_end = t + dur;
                for field_id in placer.field_order.clone() {
                    if remaining.is_empty() {
                        break;
                    }
                    if !placer.event.fields[&field_id].is_free(t, slot_end) {
                        continue;
                    }
                    if let Some(pos) = remaining
                        .iter()
                        .position(|mid| placer.schedulable(mid, &field_id, t, slot_end))
                    {
                        let mid = remaining.remove(pos).unwrap();
                        placer.place(&mid, &field_id, t, slot_end);
                        report.placed.push(mid);
                    }
                }
                t = slot_end;
            }
        }
        week_start += Duration::days(7);
    }

    if remaining.is_empty() {
        Ok(report)
    } else {
        let weeks = weeks_between(event.start, horizon);
        let diag = CapacityDiagnostics::estimate(event, queue.len(), weeks);
        debug!(
            unplaced = remaining.len(),
            "placement exhausted all slot occurrences"
        );
        Err(ScheduleFailure::CapacityExceeded(diag))
    }
}

/// Verify every match in the queue has at least one eligible field. Surfaced
/// immediately as a misconfiguration since extending the season cannot fix it.
fn check_field_coverage(event: &Event, queue: &[MatchId]) -> Result<(), ScheduleFailure> {
    if event.fields.is_empty() {
        return Err(ScheduleFailure::Misconfigured(
            "no fields configured for this event".to_string(),
        ));
    }
    for mid in queue {
        let Some(m) = event.matches.get(mid) else {
            continue;
        };
        if !event.fields.values().any(|f| f.allows(m.division.as_ref())) {
            let division = m
                .division
                .as_ref()
                .and_then(|d| event.divisions.iter().find(|div| &div.id == d))
                .map(|div| div.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ScheduleFailure::Misconfigured(format!(
                "no fields eligible for division {}",
                division
            )));
        }
    }
    Ok(())
}

fn week_datetime(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn weeks_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let days = (end - start).num_days().max(0);
    (days + 6) / 7
}

/// Working state for one placement pass.
struct Placer<'a> {
    event: &'a mut Event,
    /// Committed windows per team/referee id.
    busy: HashMap<EntityId, Vec<(DateTime<Utc>, DateTime<Utc>)>>,
    /// Fields in deterministic placement order.
    field_order: Vec<FieldId>,
    /// Teams in rotation order for team-referee assignment.
    team_order: Vec<TeamId>,
    referee_order: Vec<EntityId>,
    ref_cursor: usize,
}

impl<'a> Placer<'a> {
    fn new(event: &'a mut Event) -> Self {
        let busy = event.participant_bookings();
        let mut fields: Vec<(u32, FieldId)> = event
            .fields
            .values()
            .map(|f| (f.field_number, f.id.clone()))
            .collect();
        fields.sort();
        let team_order: Vec<TeamId> = event
            .teams
            .values()
            .filter(|t| !t.placeholder)
            .map(|t| t.id.clone())
            .collect();
        let referee_order: Vec<EntityId> = event.referees.keys().cloned().collect();
        Self {
            event,
            busy,
            field_order: fields.into_iter().map(|(_, id)| id).collect(),
            team_order,
            referee_order,
            ref_cursor: 0,
        }
    }

    /// Candidate windows for the week starting at `week_start`, clipped to
    /// `[from, horizon)` and ordered chronologically.
    fn windows_for_week(
        &self,
        week_start: NaiveDate,
        from: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut windows: Vec<(DateTime<Utc>, DateTime<Utc>)> = self
            .event
            .time_slots
            .iter()
            .filter_map(|slot| slot.occurrence(week_start))
            .filter_map(|(start, end)| {
                let start = start.max(from);
                let end = end.min(horizon);
                (start < end).then_some((start, end))
            })
            .collect();
        windows.sort();
        windows
    }

    fn participant_free(&self, id: &EntityId, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.busy
            .get(id)
            .map(|windows| !windows.iter().any(|&(s, e)| s < end && start < e))
            .unwrap_or(true)
    }

    /// Bracket dependencies count as finished once scored, or once placed
    /// with an end no later than the candidate start.
    fn deps_finished(&self, m: &Match, t: DateTime<Utc>) -> bool {
        [&m.previous_left, &m.previous_right]
            .into_iter()
            .flatten()
            .all(|prev| match self.event.matches.get(prev) {
                Some(pm) => pm.is_scored() || pm.end.map(|e| e <= t).unwrap_or(false),
                None => true,
            })
    }

    fn schedulable(
        &self,
        mid: &MatchId,
        field_id: &FieldId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bool {
        let Some(m) = self.event.matches.get(mid) else {
            return false;
        };
        if m.is_scheduled() {
            return false;
        }
        if !self.event.fields[field_id].allows(m.division.as_ref()) {
            return false;
        }
        if !self.deps_finished(m, start) {
            return false;
        }
        m.participants()
            .iter()
            .all(|p| self.participant_free(p, start, end))
    }

    fn place(&mut self, mid: &MatchId, field_id: &FieldId, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.assign_officials(mid, start, end);

        let m = self.event.matches.get_mut(mid).unwrap();
        m.start = Some(start);
        m.end = Some(end);
        m.field = Some(field_id.clone());

        let participants: Vec<EntityId> = m.participants().into_iter().cloned().collect();
        for p in participants {
            self.busy.entry(p).or_default().push((start, end));
        }
        self.event
            .fields
            .get_mut(field_id)
            .unwrap()
            .book(start, end, Some(mid.clone()));
        debug!(match_id = %mid, field = %field_id, %start, "placed match");
    }

    /// Fill in missing officials for a match about to occupy `[start, end)`.
    fn assign_officials(&mut self, mid: &MatchId, start: DateTime<Utc>, end: DateTime<Utc>) {
        let m = self.event.matches.get(mid).unwrap().clone();
        let m = &m;

        if self.event.do_teams_ref {
            if m.team_referee.is_none() && m.team1.is_some() && m.team2.is_some() {
                if let Some(team) = self.next_free_team_referee(m, start, end) {
                    self.event.matches.get_mut(mid).unwrap().team_referee = Some(team);
                }
            }
        } else if !self.referee_order.is_empty() {
            let needs_referee = match &m.referee {
                None => m.team1.is_some() && m.team2.is_some(),
                Some(r) => !self.participant_free(r, start, end),
            };
            if needs_referee {
                let replacement = self
                    .referee_order
                    .iter()
                    .find(|r| self.participant_free(r, start, end))
                    .cloned();
                self.event.matches.get_mut(mid).unwrap().referee = replacement;
            }
        }
    }

    /// Next team in round-robin rotation that is free during the window,
    /// isn't playing this match, and didn't play one of its bracket
    /// predecessors.
    fn next_free_team_referee(
        &mut self,
        m: &Match,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<TeamId> {
        if self.team_order.is_empty() {
            return None;
        }
        let recently_played: Vec<&TeamId> = [&m.previous_left, &m.previous_right]
            .into_iter()
            .flatten()
            .filter_map(|prev| self.event.matches.get(prev))
            .flat_map(|pm| [&pm.team1, &pm.team2])
            .flatten()
            .collect();

        let len = self.team_order.len();
        for offset in 0..len {
            let idx = (self.ref_cursor + offset) % len;
            let candidate = &self.team_order[idx];
            if m.involves(candidate) || recently_played.contains(&candidate) {
                continue;
            }
            if !self.participant_free(candidate, start, end) {
                continue;
            }
            self.ref_cursor = (idx + 1) % len;
            return Some(candidate.clone());
        }
        None
    }
}
