//! Core data models for the scheduler.

mod division;
mod event;
mod field;
mod ids;
mod matchup;
mod team;
mod time_slot;

pub use division::*;
pub use event::*;
pub use field::*;
pub use ids::*;
pub use matchup::*;
pub use team::*;
pub use time_slot::*;
