//! Bracket data models: slots, placement matches and their templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tournament::models::{CompetitorId, PoolIndex, Score, Side, pool_name};

/// How the participant of a bracket slot is determined
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotRef {
    /// Competitor finishing at `rank` in pool `pool_index`
    PoolRank { pool_index: PoolIndex, rank: u32 },
    /// Winner (or loser) of another bracket match
    MatchOutcome { match_key: String, wants_winner: bool },
}

impl SlotRef {
    pub fn pool_rank(pool_index: PoolIndex, rank: u32) -> Self {
        SlotRef::PoolRank { pool_index, rank }
    }

    pub fn winner_of(match_key: impl Into<String>) -> Self {
        SlotRef::MatchOutcome {
            match_key: match_key.into(),
            wants_winner: true,
        }
    }

    pub fn loser_of(match_key: impl Into<String>) -> Self {
        SlotRef::MatchOutcome {
            match_key: match_key.into(),
            wants_winner: false,
        }
    }

    /// Placeholder label shown while the slot is unresolved
    pub fn label(&self) -> String {
        match self {
            SlotRef::PoolRank { pool_index, rank } => {
                format!("{} of pool {}", ordinal(*rank), pool_name(*pool_index))
            }
            SlotRef::MatchOutcome {
                match_key,
                wants_winner,
            } => {
                let prefix = if *wants_winner { "Winner" } else { "Loser" };
                format!("{prefix} of match {match_key}")
            }
        }
    }
}

/// English ordinal of a rank ("1st", "2nd", "3rd", "4th", ...)
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Resolution lifecycle of a slot. Once resolved, it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "competitor_id", rename_all = "snake_case")]
pub enum SlotState {
    #[default]
    Unresolved,
    Resolved(CompetitorId),
}

impl SlotState {
    pub fn competitor(&self) -> Option<CompetitorId> {
        match self {
            SlotState::Unresolved => None,
            SlotState::Resolved(id) => Some(*id),
        }
    }
}

/// One side of a bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub source: SlotRef,
    pub state: SlotState,
}

impl BracketSlot {
    pub fn unresolved(source: SlotRef) -> Self {
        Self {
            source,
            state: SlotState::Unresolved,
        }
    }

    pub fn competitor(&self) -> Option<CompetitorId> {
        self.state.competitor()
    }
}

/// Winner and loser of a decided bracket match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: CompetitorId,
    pub loser: CompetitorId,
}

/// A placement or knockout match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub key: String,
    pub kickoff: DateTime<Utc>,
    pub home: BracketSlot,
    pub visitor: BracketSlot,
    pub score: Option<Score>,
    /// Shoot-out winner, present only when the score is tied
    pub penalty_winner: Option<Side>,
    pub winner_final_rank: Option<u32>,
    pub loser_final_rank: Option<u32>,
}

impl BracketMatch {
    pub fn slot(&self, side: Side) -> &BracketSlot {
        match side {
            Side::Home => &self.home,
            Side::Visitor => &self.visitor,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut BracketSlot {
        match side {
            Side::Home => &mut self.home,
            Side::Visitor => &mut self.visitor,
        }
    }

    /// Both participants are known
    pub fn is_playable(&self) -> bool {
        self.home.competitor().is_some() && self.visitor.competitor().is_some()
    }

    /// Winner and loser, once both slots are resolved and a score is recorded
    pub fn outcome(&self) -> Option<MatchOutcome> {
        let home = self.home.competitor()?;
        let visitor = self.visitor.competitor()?;
        let winning_side = winning_side(self.score?, self.penalty_winner)?;
        Some(match winning_side {
            Side::Home => MatchOutcome {
                winner: home,
                loser: visitor,
            },
            Side::Visitor => MatchOutcome {
                winner: visitor,
                loser: home,
            },
        })
    }

    /// Competitor holding the given final rank, if this match assigns it and is decided
    pub fn final_rank_holder(&self, rank: u32) -> Option<CompetitorId> {
        let outcome = self.outcome()?;
        if self.winner_final_rank == Some(rank) {
            Some(outcome.winner)
        } else if self.loser_final_rank == Some(rank) {
            Some(outcome.loser)
        } else {
            None
        }
    }
}

/// Side that wins a bracket match, by goals or by penalty shoot-out on a tie
pub fn winning_side(score: Score, penalty_winner: Option<Side>) -> Option<Side> {
    if score.home > score.visitor {
        Some(Side::Home)
    } else if score.home < score.visitor {
        Some(Side::Visitor)
    } else {
        penalty_winner
    }
}

/// Setup description of a bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatchTemplate {
    pub key: String,
    pub kickoff: DateTime<Utc>,
    pub home: SlotRef,
    pub visitor: SlotRef,
    #[serde(default)]
    pub winner_final_rank: Option<u32>,
    #[serde(default)]
    pub loser_final_rank: Option<u32>,
}

impl BracketMatchTemplate {
    pub fn new(key: impl Into<String>, kickoff: DateTime<Utc>, home: SlotRef, visitor: SlotRef) -> Self {
        Self {
            key: key.into(),
            kickoff,
            home,
            visitor,
            winner_final_rank: None,
            loser_final_rank: None,
        }
    }

    /// Assign final ranks to the winner and loser of this match
    pub fn with_final_ranks(mut self, winner: u32, loser: u32) -> Self {
        self.winner_final_rank = Some(winner);
        self.loser_final_rank = Some(loser);
        self
    }
}

impl From<BracketMatchTemplate> for BracketMatch {
    fn from(template: BracketMatchTemplate) -> Self {
        Self {
            key: template.key,
            kickoff: template.kickoff,
            home: BracketSlot::unresolved(template.home),
            visitor: BracketSlot::unresolved(template.visitor),
            score: None,
            penalty_winner: None,
            winner_final_rank: template.winner_final_rank,
            loser_final_rank: template.loser_final_rank,
        }
    }
}
