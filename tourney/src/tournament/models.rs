//! Tournament data models for pool play and placement brackets.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{TournamentError, TournamentResult};
use crate::bracket::{BracketGraph, BracketMatchTemplate};

/// Tournament ID type
pub type TournamentId = Uuid;

/// Competitor ID type (unique within a tournament)
pub type CompetitorId = i64;

/// Pool match ID type (unique within a tournament)
pub type MatchId = i64;

/// Pool index type (1-indexed)
pub type PoolIndex = u32;

/// Home or visitor side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Visitor,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Visitor => write!(f, "visitor"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Side::Home),
            "visitor" => Ok(Side::Visitor),
            other => Err(TournamentError::InvalidPenaltyDecision(other.to_string())),
        }
    }
}

/// Goal pair of a played match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub visitor: u32,
}

impl Score {
    /// Validate raw goal counts as reported by a caller.
    pub fn new(home: i32, visitor: i32) -> TournamentResult<Self> {
        if home < 0 || visitor < 0 {
            return Err(TournamentError::NegativeGoals { home, visitor });
        }
        Ok(Self {
            home: home as u32,
            visitor: visitor as u32,
        })
    }

    pub fn is_tie(&self) -> bool {
        self.home == self.visitor
    }

    /// Goals of the given side, then goals conceded by it.
    pub fn goals_for(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home, self.visitor),
            Side::Visitor => (self.visitor, self.home),
        }
    }
}

/// Point weights used to compute standings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRule {
    pub points_per_win: f64,
    pub points_per_draw: f64,
    pub points_per_loss: f64,
    pub points_per_goal: f64,
}

impl Default for PointRule {
    fn default() -> Self {
        Self {
            points_per_win: 3.0,
            points_per_draw: 1.0,
            points_per_loss: 0.0,
            points_per_goal: 0.0,
        }
    }
}

/// Kickoff scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Kickoff of the first match of every pool
    pub start_time: DateTime<Utc>,
    /// Duration of a single match in minutes
    pub match_duration_mins: u32,
    /// Break between two consecutive matches in minutes
    pub break_duration_mins: u32,
}

impl ScheduleConfig {
    pub fn new(start_time: DateTime<Utc>, match_duration_mins: u32, break_duration_mins: u32) -> Self {
        Self {
            start_time,
            match_duration_mins,
            break_duration_mins,
        }
    }

    /// Time between two consecutive kickoffs
    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.match_duration_mins) + i64::from(self.break_duration_mins))
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Competitor names in seeding order
    pub competitors: Vec<String>,
    /// Number of pools
    pub pool_count: u32,
    /// Standings point weights
    pub point_rule: PointRule,
    /// Kickoff scheduling
    pub schedule: ScheduleConfig,
    /// Placement matches, slots referencing pool ranks or other matches
    #[serde(default)]
    pub bracket: Vec<BracketMatchTemplate>,
}

impl TournamentConfig {
    /// Create a configuration with `count` placeholder competitors named "Team 1".."Team n"
    pub fn with_competitor_count(
        name: String,
        count: usize,
        pool_count: u32,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            name,
            competitors: (1..=count).map(|i| format!("Team {i}")).collect(),
            pool_count,
            point_rule: PointRule::default(),
            schedule,
            bracket: Vec::new(),
        }
    }

    pub fn with_point_rule(mut self, point_rule: PointRule) -> Self {
        self.point_rule = point_rule;
        self
    }

    pub fn with_bracket(mut self, bracket: Vec<BracketMatchTemplate>) -> Self {
        self.bracket = bracket;
        self
    }
}

/// A team or player taking part in the tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    pub pool_index: PoolIndex,
}

/// A group of competitors that all play each other once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub index: PoolIndex,
    pub name: String,
    /// Members in creation order
    pub competitor_ids: Vec<CompetitorId>,
}

/// Name of the pool with the given 1-based index ("A", "B", ...)
pub fn pool_name(index: PoolIndex) -> String {
    match index {
        1..=26 => char::from(b'A' + (index - 1) as u8).to_string(),
        _ => index.to_string(),
    }
}

/// A round robin match inside a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMatch {
    pub id: MatchId,
    pub pool_index: PoolIndex,
    pub kickoff: DateTime<Utc>,
    pub home: CompetitorId,
    pub visitor: CompetitorId,
    pub score: Option<Score>,
}

impl PoolMatch {
    /// Side played by the competitor, if it takes part in this match
    pub fn side_of(&self, competitor: CompetitorId) -> Option<Side> {
        if self.home == competitor {
            Some(Side::Home)
        } else if self.visitor == competitor {
            Some(Side::Visitor)
        } else {
            None
        }
    }
}

/// Complete tournament state: the aggregate every operation works on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub point_rule: PointRule,
    pub schedule: ScheduleConfig,
    pub created_at: DateTime<Utc>,
    pub competitors: Vec<Competitor>,
    pub pools: Vec<Pool>,
    /// Pool matches, in schedule order within each pool
    pub pool_matches: Vec<PoolMatch>,
    pub bracket: BracketGraph,
}

/// Tournament listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub pool_count: usize,
    pub competitor_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Tournament> for TournamentSummary {
    fn from(tournament: &Tournament) -> Self {
        Self {
            id: tournament.id,
            name: tournament.name.clone(),
            pool_count: tournament.pools.len(),
            competitor_count: tournament.competitors.len(),
            created_at: tournament.created_at,
        }
    }
}
