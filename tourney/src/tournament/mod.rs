//! Tournament module: pool play and placement brackets.
//!
//! This module provides:
//! - Tournament setup: pools, round robin schedules and kickoff times
//! - Score reporting with propagation into the placement bracket
//! - Read-only projections: schedules, standings, bracket and final ranking
//! - An async manager serializing operations per tournament
//!
//! ## Example
//!
//! ```no_run
//! use tourney::db::InMemoryTournamentRepository;
//! use tourney::tournament::{ScheduleConfig, TournamentConfig, TournamentManager};
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(InMemoryTournamentRepository::new()));
//!
//!     // 8 teams in 2 pools, 12 minute matches with 3 minute breaks
//!     let config = TournamentConfig::with_competitor_count(
//!         "Sunday Cup".to_string(),
//!         8,
//!         2,
//!         ScheduleConfig::new(Utc::now(), 12, 3),
//!     );
//!
//!     let tournament_id = manager.create_tournament(config).await?;
//!     manager.report_pool_match_score(tournament_id, 1, 2, 0).await?;
//!
//!     for row in manager.get_standings(tournament_id, 1).await? {
//!         println!("{}. {} {} pts", row.rank, row.name, row.points);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod errors;
pub mod manager;
pub mod models;
pub mod views;

pub use engine::{
    BracketScoreReport, MAX_DURATION_MINS, MIN_POOL_SIZE, PoolScoreReport, pool_sizes,
};
pub use errors::{ErrorKind, TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    Competitor, CompetitorId, MatchId, PointRule, Pool, PoolIndex, PoolMatch, ScheduleConfig,
    Score, Side, Tournament, TournamentConfig, TournamentId, TournamentSummary, pool_name,
};
pub use views::{
    BracketMatchView, FinalRankingEntry, MatchesView, PoolMatchView, PoolSchedule,
    PoolStandings, SlotView,
};
