//! # Tourney
//!
//! Scheduling and bracket resolution engine for amateur sports tournaments.
//!
//! Competitors are split into pools that each play a complete round robin.
//! Pool standings feed a placement bracket whose slots reference pool ranks
//! or the winner or loser of other bracket matches; slots are resolved as
//! pools complete and bracket matches are decided.
//!
//! ## Core Modules
//!
//! - [`schedule`]: Round robin pairing (circle method) and kickoff times
//! - [`standings`]: Ranked pool standings from played matches
//! - [`bracket`]: Placement matches and dependency-driven slot resolution
//! - [`tournament`]: Setup, score reporting, projections and the async manager
//! - [`db`]: Storage collaborators (PostgreSQL and in-memory)
//!
//! ## Example
//!
//! ```
//! use tourney::schedule::round_robin;
//!
//! let pairings = round_robin(&[1, 2, 3, 4]);
//! assert_eq!(pairings.len(), 6);
//! assert_eq!((pairings[0].home, pairings[0].visitor), (1, 4));
//! ```

/// Placement brackets and slot resolution.
pub mod bracket;

/// Storage collaborators.
pub mod db;

/// Round robin scheduling.
pub mod schedule;

/// Pool standings.
pub mod standings;

/// Tournament setup, reporting and management.
pub mod tournament;

pub use bracket::{BracketGraph, BracketMatchTemplate, SlotRef};
pub use tournament::{
    ErrorKind, PointRule, ScheduleConfig, Side, Tournament, TournamentConfig, TournamentError,
    TournamentManager, TournamentResult,
};
