//! Team model.

use serde::{Deserialize, Serialize};

use super::{DivisionId, EntityId, TeamId};

/// A team registered for an event.
///
/// `seed` is the ranking number used for bracket placement and playoff entry
/// order; a higher seed means a stronger team, so the highest seed rests when
/// a bye is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique identifier (derived from event + name)
    pub id: TeamId,

    /// Team name
    pub name: String,

    /// Seed used for bracket placement (higher = stronger)
    pub seed: u32,

    /// Captain reference (external user id, opaque to the scheduler)
    pub captain: Option<String>,

    /// Division this team competes in
    pub division: Option<DivisionId>,

    /// Wins recorded so far
    pub wins: u32,

    /// Losses recorded so far
    pub losses: u32,

    /// Placeholder teams fill a division up to its projected capacity when
    /// rosters aren't full yet; they occupy schedule slots but carry no roster.
    #[serde(default)]
    pub placeholder: bool,
}

impl Team {
    /// Create a team with an id derived from the event id and team name.
    pub fn new(event_id: &EntityId, name: impl Into<String>, seed: u32) -> Self {
        let name = name.into();
        let id = EntityId::generate(&[event_id.as_str(), "team", &name]);
        Self {
            id,
            name,
            seed,
            captain: None,
            division: None,
            wins: 0,
            losses: 0,
            placeholder: false,
        }
    }

    /// Builder method to set the division.
    pub fn with_division(mut self, division: DivisionId) -> Self {
        self.division = Some(division);
        self
    }

    /// Builder method to set the captain.
    pub fn with_captain(mut self, captain: impl Into<String>) -> Self {
        self.captain = Some(captain.into());
        self
    }

    /// Create a placeholder team occupying a roster slot that isn't filled yet.
    pub fn placeholder(event_id: &EntityId, ordinal: u32) -> Self {
        let name = format!("TBD {}", ordinal);
        let mut team = Self::new(event_id, name, 0);
        team.placeholder = true;
        team
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_id_is_deterministic() {
        let event = EntityId::from("evt-1");
        let a = Team::new(&event, "Falcons", 3);
        let b = Team::new(&event, "Falcons", 3);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_team_builder() {
        let event = EntityId::from("evt-1");
        let team = Team::new(&event, "Falcons", 3)
            .with_division(EntityId::from("div-a"))
            .with_captain("user-42");

        assert_eq!(team.division, Some(EntityId::from("div-a")));
        assert_eq!(team.captain.as_deref(), Some("user-42"));
        assert_eq!(team.wins, 0);
        assert_eq!(team.losses, 0);
    }

    #[test]
    fn test_placeholder_team() {
        let event = EntityId::from("evt-1");
        let team = Team::placeholder(&event, 2);
        assert!(team.placeholder);
        assert_eq!(team.name, "TBD 2");
        assert_eq!(team.seed, 0);
    }
}
