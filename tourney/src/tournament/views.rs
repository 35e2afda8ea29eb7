//! Read-only projections handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{TournamentError, TournamentResult};
use super::models::{CompetitorId, MatchId, PoolIndex, PoolMatch, Score, Side, Tournament};
use crate::bracket::{BracketMatch, BracketSlot};
use crate::standings::StandingsRow;

/// Pool match with competitor names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMatchView {
    pub id: MatchId,
    pub pool_index: PoolIndex,
    pub kickoff: DateTime<Utc>,
    pub home_id: CompetitorId,
    pub home_name: String,
    pub visitor_id: CompetitorId,
    pub visitor_name: String,
    pub score: Option<Score>,
}

/// Ordered schedule of one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSchedule {
    pub pool_index: PoolIndex,
    pub pool_name: String,
    pub matches: Vec<PoolMatchView>,
}

/// Standings table of one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStandings {
    pub pool_index: PoolIndex,
    pub pool_name: String,
    pub rows: Vec<StandingsRow>,
}

/// Bracket slot as displayed: the competitor name once resolved, a placeholder before
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub name: String,
    pub competitor_id: Option<CompetitorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketMatchView {
    pub key: String,
    pub kickoff: DateTime<Utc>,
    pub home: SlotView,
    pub visitor: SlotView,
    /// Both participants are known
    pub playable: bool,
    pub score: Option<Score>,
    pub penalty_winner: Option<Side>,
    pub winner_final_rank: Option<u32>,
    pub loser_final_rank: Option<u32>,
}

/// One line of the final ranking; `name` is `None` until the rank is decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRankingEntry {
    pub rank: u32,
    pub competitor_id: Option<CompetitorId>,
    pub name: Option<String>,
    /// Holder's name, or a placeholder such as "Winner of match F"
    pub label: String,
}

/// Every match of a tournament: pool schedules followed by the bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchesView {
    pub pools: Vec<PoolSchedule>,
    pub bracket: Vec<BracketMatchView>,
}

impl Tournament {
    fn competitor_name(&self, id: CompetitorId) -> TournamentResult<String> {
        self.competitor(id)
            .map(|competitor| competitor.name.clone())
            .map_err(|_| TournamentError::Inconsistent(format!("unknown competitor {id}")))
    }

    fn pool_match_view(&self, pool_match: &PoolMatch) -> TournamentResult<PoolMatchView> {
        Ok(PoolMatchView {
            id: pool_match.id,
            pool_index: pool_match.pool_index,
            kickoff: pool_match.kickoff,
            home_id: pool_match.home,
            home_name: self.competitor_name(pool_match.home)?,
            visitor_id: pool_match.visitor,
            visitor_name: self.competitor_name(pool_match.visitor)?,
            score: pool_match.score,
        })
    }

    pub fn pool_schedule(&self, index: PoolIndex) -> TournamentResult<PoolSchedule> {
        let pool = self.pool(index)?;
        let matches = self
            .pool_matches_of(index)
            .map(|pool_match| self.pool_match_view(pool_match))
            .collect::<TournamentResult<Vec<_>>>()?;
        Ok(PoolSchedule {
            pool_index: index,
            pool_name: pool.name.clone(),
            matches,
        })
    }

    /// Schedules of all pools, by pool index
    pub fn pool_schedules(&self) -> TournamentResult<Vec<PoolSchedule>> {
        self.pools
            .iter()
            .map(|pool| self.pool_schedule(pool.index))
            .collect()
    }

    pub fn pool_standings(&self, index: PoolIndex) -> TournamentResult<PoolStandings> {
        let pool = self.pool(index)?;
        Ok(PoolStandings {
            pool_index: index,
            pool_name: pool.name.clone(),
            rows: self.standings(index)?,
        })
    }

    pub fn all_standings(&self) -> TournamentResult<Vec<PoolStandings>> {
        self.pools
            .iter()
            .map(|pool| self.pool_standings(pool.index))
            .collect()
    }

    fn slot_view(&self, slot: &BracketSlot) -> TournamentResult<SlotView> {
        let name = match slot.competitor() {
            Some(id) => self.competitor_name(id)?,
            None => slot.source.label(),
        };
        Ok(SlotView {
            name,
            competitor_id: slot.competitor(),
        })
    }

    fn bracket_match_view(&self, bracket_match: &BracketMatch) -> TournamentResult<BracketMatchView> {
        Ok(BracketMatchView {
            key: bracket_match.key.clone(),
            kickoff: bracket_match.kickoff,
            home: self.slot_view(&bracket_match.home)?,
            visitor: self.slot_view(&bracket_match.visitor)?,
            playable: bracket_match.is_playable(),
            score: bracket_match.score,
            penalty_winner: bracket_match.penalty_winner,
            winner_final_rank: bracket_match.winner_final_rank,
            loser_final_rank: bracket_match.loser_final_rank,
        })
    }

    /// Bracket matches in template order with display names
    pub fn bracket_view(&self) -> TournamentResult<Vec<BracketMatchView>> {
        self.bracket
            .matches()
            .iter()
            .map(|bracket_match| self.bracket_match_view(bracket_match))
            .collect()
    }

    /// Final ranks ascending, with the holder's name once decided
    pub fn final_ranking(&self) -> TournamentResult<Vec<FinalRankingEntry>> {
        self.bracket
            .final_ranking()
            .into_iter()
            .map(|final_rank| {
                let name = final_rank
                    .competitor_id
                    .map(|id| self.competitor_name(id))
                    .transpose()?;
                Ok(FinalRankingEntry {
                    rank: final_rank.rank,
                    competitor_id: final_rank.competitor_id,
                    label: name.clone().unwrap_or_else(|| final_rank.source.label()),
                    name,
                })
            })
            .collect()
    }

    pub fn matches_view(&self) -> TournamentResult<MatchesView> {
        Ok(MatchesView {
            pools: self.pool_schedules()?,
            bracket: self.bracket_view()?,
        })
    }
}
