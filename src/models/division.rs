//! Division model.

use serde::{Deserialize, Serialize};

use super::{DivisionId, EntityId};

/// A partition of teams and fields that must match for a valid pairing
/// (e.g. a skill bracket).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: DivisionId,

    pub name: String,

    /// Cap on registered teams; also the participant projection used when
    /// the roster isn't full yet at scheduling time.
    pub max_participants: Option<u32>,

    /// Overrides the event-level playoff team count for this division.
    pub playoff_team_count: Option<u32>,
}

impl Division {
    pub fn new(event_id: &EntityId, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = EntityId::generate(&[event_id.as_str(), "division", &name]);
        Self {
            id,
            name,
            max_participants: None,
            playoff_team_count: None,
        }
    }

    pub fn with_max_participants(mut self, cap: u32) -> Self {
        self.max_participants = Some(cap);
        self
    }

    pub fn with_playoff_team_count(mut self, count: u32) -> Self {
        self.playoff_team_count = Some(count);
        self
    }
}
