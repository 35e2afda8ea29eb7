//! Tournament setup and score reporting.
//!
//! Every mutating operation validates first and either applies completely or
//! leaves the tournament unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Competitor, CompetitorId, MatchId, Pool, PoolIndex, PoolMatch, Score, Side, Tournament,
    TournamentConfig, TournamentId, pool_name,
};
use crate::bracket::{BracketGraph, BracketMatch, MatchOutcome};
use crate::schedule::{kickoff_times, round_robin};
use crate::standings::{StandingsRow, compute_standings};

/// Minimum number of competitors in a pool
pub const MIN_POOL_SIZE: usize = 2;

/// Longest match or break, in minutes
pub const MAX_DURATION_MINS: u32 = i32::MAX as u32;

/// Result of a pool match score report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolScoreReport {
    pub pool_match: PoolMatch,
    /// The pool has no unscored match left and its ranks were propagated
    pub pool_completed: bool,
    /// Bracket matches whose slots were resolved by the propagation
    pub updated_bracket_matches: Vec<BracketMatch>,
}

/// Result of a bracket match score report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketScoreReport {
    pub outcome: MatchOutcome,
    /// The scored match first, then every match whose slots were resolved
    pub updated_bracket_matches: Vec<BracketMatch>,
}

/// Competitor counts per pool: the first `n % p` pools get one extra competitor
pub fn pool_sizes(competitor_count: usize, pool_count: usize) -> Vec<usize> {
    if pool_count == 0 {
        return Vec::new();
    }
    let base = competitor_count / pool_count;
    let extra = competitor_count % pool_count;
    (0..pool_count)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

impl Tournament {
    /// Set up a tournament: pools, round robin schedules and bracket.
    ///
    /// Competitors are assigned to pools in order, ids start at 1. The pool
    /// matches of every pool start at the configured start time.
    pub fn create(
        id: TournamentId,
        config: TournamentConfig,
        created_at: DateTime<Utc>,
    ) -> TournamentResult<Self> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidSetup(
                "tournament name cannot be empty".to_string(),
            ));
        }
        if config.pool_count == 0 {
            return Err(TournamentError::InvalidSetup(
                "at least one pool is required".to_string(),
            ));
        }
        let rule = &config.point_rule;
        if ![
            rule.points_per_win,
            rule.points_per_draw,
            rule.points_per_loss,
            rule.points_per_goal,
        ]
        .iter()
        .all(|weight| weight.is_finite())
        {
            return Err(TournamentError::InvalidSetup(
                "point weights must be finite numbers".to_string(),
            ));
        }
        let schedule = &config.schedule;
        if schedule.match_duration_mins > MAX_DURATION_MINS
            || schedule.break_duration_mins > MAX_DURATION_MINS
        {
            return Err(TournamentError::InvalidSetup(format!(
                "match and break durations cannot exceed {MAX_DURATION_MINS} minutes"
            )));
        }

        let sizes = pool_sizes(config.competitors.len(), config.pool_count as usize);
        if sizes.iter().any(|&size| size < MIN_POOL_SIZE) {
            return Err(TournamentError::InvalidSetup(format!(
                "{} competitors cannot fill {} pools of at least {} competitors",
                config.competitors.len(),
                config.pool_count,
                MIN_POOL_SIZE
            )));
        }

        let mut names = config.competitors.iter();
        let mut competitors = Vec::with_capacity(config.competitors.len());
        let mut pools = Vec::with_capacity(sizes.len());
        let mut pool_matches = Vec::new();
        let mut next_match_id: MatchId = 1;

        for (offset, &size) in sizes.iter().enumerate() {
            let index = offset as PoolIndex + 1;
            let mut competitor_ids = Vec::with_capacity(size);
            for name in names.by_ref().take(size) {
                let name = name.trim();
                if name.is_empty() {
                    return Err(TournamentError::EmptyCompetitorName);
                }
                let id = competitors.len() as CompetitorId + 1;
                competitors.push(Competitor {
                    id,
                    name: name.to_string(),
                    pool_index: index,
                });
                competitor_ids.push(id);
            }

            let pairings = round_robin(&competitor_ids);
            let kickoffs = kickoff_times(&config.schedule, pairings.len())?;
            for (pairing, kickoff) in pairings.into_iter().zip(kickoffs) {
                pool_matches.push(PoolMatch {
                    id: next_match_id,
                    pool_index: index,
                    kickoff,
                    home: pairing.home,
                    visitor: pairing.visitor,
                    score: None,
                });
                next_match_id += 1;
            }

            pools.push(Pool {
                index,
                name: pool_name(index),
                competitor_ids,
            });
        }
        check_unique_names(&competitors)?;

        let pool_sizes: BTreeMap<PoolIndex, usize> = pools
            .iter()
            .map(|pool| (pool.index, pool.competitor_ids.len()))
            .collect();
        let bracket = BracketGraph::from_template(config.bracket, &pool_sizes)?;

        Ok(Self {
            id,
            name: name.to_string(),
            point_rule: config.point_rule,
            schedule: config.schedule,
            created_at,
            competitors,
            pools,
            pool_matches,
            bracket,
        })
    }

    pub fn pool(&self, index: PoolIndex) -> TournamentResult<&Pool> {
        self.pools
            .iter()
            .find(|pool| pool.index == index)
            .ok_or(TournamentError::PoolNotFound(index))
    }

    pub fn competitor(&self, id: CompetitorId) -> TournamentResult<&Competitor> {
        self.competitors
            .iter()
            .find(|competitor| competitor.id == id)
            .ok_or(TournamentError::CompetitorNotFound(id))
    }

    /// Pool matches of one pool, in schedule order
    pub fn pool_matches_of(&self, index: PoolIndex) -> impl Iterator<Item = &PoolMatch> {
        self.pool_matches
            .iter()
            .filter(move |pool_match| pool_match.pool_index == index)
    }

    /// Whether every match of the pool has a score
    pub fn is_pool_complete(&self, index: PoolIndex) -> bool {
        self.pool_matches_of(index)
            .all(|pool_match| pool_match.score.is_some())
    }

    /// Ranked standings of one pool, computed from its scored matches
    pub fn standings(&self, index: PoolIndex) -> TournamentResult<Vec<StandingsRow>> {
        let pool = self.pool(index)?;
        let members = pool
            .competitor_ids
            .iter()
            .map(|&id| self.competitor(id))
            .collect::<TournamentResult<Vec<_>>>()?;
        Ok(compute_standings(
            members,
            &self.pool_matches,
            &self.point_rule,
        ))
    }

    /// Store the score of a pool match and, once the pool has no unscored
    /// match left, propagate its final ranks into the bracket.
    ///
    /// Re-entering a score overwrites it. When the pool is complete the ranks
    /// are propagated again; a re-score that changes a rank already used by
    /// the bracket is rejected and the previous score is kept. Re-entering the
    /// identical score is a no-op for the bracket, even when a rename has
    /// since flipped a name tie-break.
    pub fn report_pool_match_score(
        &mut self,
        match_id: MatchId,
        home_goals: i32,
        visitor_goals: i32,
    ) -> TournamentResult<PoolScoreReport> {
        let score = Score::new(home_goals, visitor_goals)?;
        let position = self
            .pool_matches
            .iter()
            .position(|pool_match| pool_match.id == match_id)
            .ok_or(TournamentError::PoolMatchNotFound(match_id))?;

        let pool_index = self.pool_matches[position].pool_index;
        let previous = self.pool_matches[position].score.replace(score);

        let pool_completed = self.is_pool_complete(pool_index);
        let mut updated_keys = Vec::new();
        if pool_completed && previous != Some(score) {
            let propagated = self
                .standings(pool_index)
                .and_then(|standings| self.bracket.resolve_pool_ranks(pool_index, &standings));
            match propagated {
                Ok(keys) => updated_keys = keys,
                Err(err) => {
                    self.pool_matches[position].score = previous;
                    return Err(err);
                }
            }
            log::info!(
                "Pool {} of tournament {} completed, {} bracket matches updated",
                pool_name(pool_index),
                self.id,
                updated_keys.len()
            );
        }

        Ok(PoolScoreReport {
            pool_match: self.pool_matches[position].clone(),
            pool_completed,
            updated_bracket_matches: self.bracket_matches_for(&updated_keys),
        })
    }

    /// Store the score of a bracket match and resolve the slots depending on
    /// its winner and loser.
    ///
    /// A tied score needs the shoot-out winner; a decided score must not carry one.
    pub fn report_bracket_match_score(
        &mut self,
        match_key: &str,
        home_goals: i32,
        visitor_goals: i32,
        penalty_winner: Option<Side>,
    ) -> TournamentResult<BracketScoreReport> {
        let score = Score::new(home_goals, visitor_goals)?;
        let outcome = self.bracket.record_score(match_key, score, penalty_winner)?;
        let resolved = self.bracket.resolve_match_outcome(match_key, outcome)?;

        let mut keys = vec![match_key.to_string()];
        keys.extend(resolved);
        Ok(BracketScoreReport {
            outcome,
            updated_bracket_matches: self.bracket_matches_for(&keys),
        })
    }

    /// Rename competitors. Names are trimmed and must stay unique within each pool.
    ///
    /// Returns the renamed competitors.
    pub fn rename_competitors(
        &mut self,
        names: &BTreeMap<CompetitorId, String>,
    ) -> TournamentResult<Vec<Competitor>> {
        let mut renamed = self.competitors.clone();
        for (&id, name) in names {
            let name = name.trim();
            if name.is_empty() {
                return Err(TournamentError::EmptyCompetitorName);
            }
            let competitor = renamed
                .iter_mut()
                .find(|competitor| competitor.id == id)
                .ok_or(TournamentError::CompetitorNotFound(id))?;
            competitor.name = name.to_string();
        }
        check_unique_names(&renamed)?;

        self.competitors = renamed;
        Ok(self
            .competitors
            .iter()
            .filter(|competitor| names.contains_key(&competitor.id))
            .cloned()
            .collect())
    }

    fn bracket_matches_for(&self, keys: &[String]) -> Vec<BracketMatch> {
        keys.iter()
            .filter_map(|key| self.bracket.get(key))
            .cloned()
            .collect()
    }
}

fn check_unique_names(competitors: &[Competitor]) -> TournamentResult<()> {
    let mut seen = HashSet::new();
    for competitor in competitors {
        if !seen.insert((competitor.pool_index, competitor.name.as_str())) {
            return Err(TournamentError::DuplicateCompetitorName {
                pool_index: competitor.pool_index,
                name: competitor.name.clone(),
            });
        }
    }
    Ok(())
}
