//! # Matchday
//!
//! A sports event scheduler: single/double elimination brackets, round-robin
//! leagues, and conflict-free placement of matches onto fields and weekly
//! time slots.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (events, teams, matches, fields, slots)
//! - **bracket**: Elimination bracket construction and seeding
//! - **roundrobin**: Round-robin pairing generation and capacity estimation
//! - **engine**: Time-slot placement engine and official assignment
//! - **builder**: Top-level schedule building with window-extension retries
//! - **standings**: League tables from scored results
//! - **finalize**: Result recording, bracket advancement, playoff seeding
//! - **storage**: Filesystem event store
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod bracket;
pub mod builder;
pub mod config;
pub mod engine;
pub mod finalize;
pub mod models;
pub mod roundrobin;
pub mod standings;
pub mod storage;

pub use models::*;
