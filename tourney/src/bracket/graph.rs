//! Dependency-driven resolution of bracket slots.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::models::{BracketMatch, BracketMatchTemplate, MatchOutcome, SlotRef, SlotState};
use crate::standings::StandingsRow;
use crate::tournament::errors::{TournamentError, TournamentResult};
use crate::tournament::models::{CompetitorId, PoolIndex, Score, Side};

/// Largest final rank a template may assign
pub const MAX_FINAL_RANK: u32 = i32::MAX as u32;

/// A planned slot transition: match position, side, competitor
type Resolution = (usize, Side, CompetitorId);

/// Final rank and the competitor holding it, if already decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRank {
    pub rank: u32,
    pub competitor_id: Option<CompetitorId>,
    /// Match outcome that assigns the rank
    pub source: SlotRef,
}

/// Graph of placement matches whose slots reference pool ranks or other matches.
///
/// Slots are filled by two events:
/// - pool completion ([`BracketGraph::resolve_pool_ranks`])
/// - a decided bracket match ([`BracketGraph::resolve_match_outcome`])
///
/// Both are idempotent. A resolved slot never changes: an event that would
/// resolve it to a different competitor is rejected without touching any slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BracketMatch>", into = "Vec<BracketMatch>")]
pub struct BracketGraph {
    matches: Vec<BracketMatch>,
    index: HashMap<String, usize>,
}

impl From<Vec<BracketMatch>> for BracketGraph {
    fn from(matches: Vec<BracketMatch>) -> Self {
        Self::from_matches(matches)
    }
}

impl From<BracketGraph> for Vec<BracketMatch> {
    fn from(graph: BracketGraph) -> Self {
        graph.matches
    }
}

impl BracketGraph {
    /// Build the graph from stored matches, trusted to be valid
    pub fn from_matches(matches: Vec<BracketMatch>) -> Self {
        let index = matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.key.clone(), i))
            .collect();
        Self { matches, index }
    }

    /// Validate a bracket template against the pool sizes and build the graph
    /// with every slot unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::InvalidBracket`] for duplicate or empty keys,
    /// unknown pools, ranks outside the pool, unknown source matches, identical
    /// home and visitor slots, a zero final rank, or a dependency cycle.
    pub fn from_template(
        templates: Vec<BracketMatchTemplate>,
        pool_sizes: &BTreeMap<PoolIndex, usize>,
    ) -> TournamentResult<Self> {
        let mut keys = HashSet::new();
        for template in &templates {
            if template.key.trim().is_empty() {
                return Err(TournamentError::InvalidBracket(
                    "match key cannot be empty".to_string(),
                ));
            }
            if !keys.insert(template.key.as_str()) {
                return Err(TournamentError::InvalidBracket(format!(
                    "duplicate match key {}",
                    template.key
                )));
            }
        }

        for template in &templates {
            if template.home == template.visitor {
                return Err(TournamentError::InvalidBracket(format!(
                    "match {}: home and visitor slots are identical",
                    template.key
                )));
            }
            for rank in [template.winner_final_rank, template.loser_final_rank]
                .into_iter()
                .flatten()
            {
                if rank == 0 || rank > MAX_FINAL_RANK {
                    return Err(TournamentError::InvalidBracket(format!(
                        "match {}: final rank {} outside 1..={}",
                        template.key, rank, MAX_FINAL_RANK
                    )));
                }
            }
            for source in [&template.home, &template.visitor] {
                match source {
                    SlotRef::PoolRank { pool_index, rank } => {
                        let size = pool_sizes.get(pool_index).ok_or_else(|| {
                            TournamentError::InvalidBracket(format!(
                                "match {}: unknown pool {}",
                                template.key, pool_index
                            ))
                        })?;
                        if *rank == 0 || *rank as usize > *size {
                            return Err(TournamentError::InvalidBracket(format!(
                                "match {}: pool {} has no rank {}",
                                template.key, pool_index, rank
                            )));
                        }
                    }
                    SlotRef::MatchOutcome { match_key, .. } => {
                        if !keys.contains(match_key.as_str()) {
                            return Err(TournamentError::InvalidBracket(format!(
                                "match {}: unknown source match {}",
                                template.key, match_key
                            )));
                        }
                    }
                }
            }
        }

        let graph = Self::from_matches(templates.into_iter().map(BracketMatch::from).collect());
        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> TournamentResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            graph: &BracketGraph,
            position: usize,
            marks: &mut HashMap<usize, Mark>,
        ) -> TournamentResult<()> {
            match marks.get(&position) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(TournamentError::InvalidBracket(format!(
                        "dependency cycle through match {}",
                        graph.matches[position].key
                    )));
                }
                None => {}
            }
            marks.insert(position, Mark::Visiting);
            let bracket_match = &graph.matches[position];
            for source in [&bracket_match.home.source, &bracket_match.visitor.source] {
                if let SlotRef::MatchOutcome { match_key, .. } = source {
                    if let Some(&dependency) = graph.index.get(match_key) {
                        visit(graph, dependency, marks)?;
                    }
                }
            }
            marks.insert(position, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for position in 0..self.matches.len() {
            visit(self, position, &mut marks)?;
        }
        Ok(())
    }

    pub fn matches(&self) -> &[BracketMatch] {
        &self.matches
    }

    pub fn get(&self, key: &str) -> Option<&BracketMatch> {
        self.index.get(key).map(|&i| &self.matches[i])
    }

    /// Replace the stored match with the same key
    pub fn replace_match(&mut self, bracket_match: BracketMatch) -> TournamentResult<()> {
        let position = *self
            .index
            .get(&bracket_match.key)
            .ok_or_else(|| TournamentError::BracketMatchNotFound(bracket_match.key.clone()))?;
        self.matches[position] = bracket_match;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Pool completion event: resolve every slot referencing a rank of the pool.
    ///
    /// Returns the keys of the matches whose slots changed.
    pub fn resolve_pool_ranks(
        &mut self,
        pool_index: PoolIndex,
        standings: &[StandingsRow],
    ) -> TournamentResult<Vec<String>> {
        let plan = self.plan(|source| match source {
            SlotRef::PoolRank {
                pool_index: index,
                rank,
            } if *index == pool_index => standings
                .iter()
                .find(|row| row.rank == *rank)
                .map(|row| Some(row.competitor_id))
                .ok_or_else(|| {
                    TournamentError::Inconsistent(format!(
                        "pool {pool_index} standings have no rank {rank}"
                    ))
                }),
            _ => Ok(None),
        })?;
        Ok(self.apply(plan))
    }

    /// Match result event: resolve every slot referencing the outcome of `match_key`.
    ///
    /// Returns the keys of the matches whose slots changed.
    pub fn resolve_match_outcome(
        &mut self,
        match_key: &str,
        outcome: MatchOutcome,
    ) -> TournamentResult<Vec<String>> {
        if !self.index.contains_key(match_key) {
            return Err(TournamentError::BracketMatchNotFound(match_key.to_string()));
        }
        let plan = self.plan(|source| Ok(outcome_target(source, match_key, outcome)))?;
        Ok(self.apply(plan))
    }

    /// Validate and store the score of a bracket match, returning its outcome.
    ///
    /// Nothing is stored when the score is rejected. The outcome is not
    /// propagated; fire [`BracketGraph::resolve_match_outcome`] afterwards.
    ///
    /// # Errors
    ///
    /// - [`TournamentError::BracketMatchNotFound`] for an unknown key
    /// - [`TournamentError::MissingPenaltyDecision`] for a tie without shoot-out winner
    /// - [`TournamentError::UnexpectedPenaltyDecision`] for a shoot-out winner on a decided score
    /// - [`TournamentError::UnresolvedSlot`] while a participant is unknown
    /// - [`TournamentError::ConflictingResolution`] when a re-score changes an
    ///   outcome that downstream slots already used
    pub fn record_score(
        &mut self,
        match_key: &str,
        score: Score,
        penalty_winner: Option<Side>,
    ) -> TournamentResult<MatchOutcome> {
        let position = *self
            .index
            .get(match_key)
            .ok_or_else(|| TournamentError::BracketMatchNotFound(match_key.to_string()))?;

        match (score.is_tie(), penalty_winner) {
            (true, None) => return Err(TournamentError::MissingPenaltyDecision),
            (false, Some(_)) => return Err(TournamentError::UnexpectedPenaltyDecision),
            _ => {}
        }

        let bracket_match = &self.matches[position];
        for side in [Side::Home, Side::Visitor] {
            if bracket_match.slot(side).competitor().is_none() {
                return Err(TournamentError::UnresolvedSlot {
                    match_key: match_key.to_string(),
                    side,
                });
            }
        }

        let mut decided = bracket_match.clone();
        decided.score = Some(score);
        decided.penalty_winner = penalty_winner;
        let outcome = decided.outcome().ok_or_else(|| {
            TournamentError::Inconsistent(format!("match {match_key} has no outcome"))
        })?;

        // Reject before storing if downstream slots already hold another outcome
        self.plan(|source| Ok(outcome_target(source, match_key, outcome)))?;

        self.matches[position] = decided;
        Ok(outcome)
    }

    /// Final ranks assigned by terminal matches, ascending.
    ///
    /// Each distinct rank appears once. When several matches assign the same
    /// rank, the first decided one in match order holds it; an undecided rank
    /// points at the first match assigning it.
    pub fn final_ranking(&self) -> Vec<FinalRank> {
        let mut ranks: BTreeMap<u32, FinalRank> = BTreeMap::new();
        for bracket_match in &self.matches {
            let assigned = [
                (bracket_match.winner_final_rank, true),
                (bracket_match.loser_final_rank, false),
            ];
            for (rank, wants_winner) in assigned {
                let Some(rank) = rank else { continue };
                let candidate = FinalRank {
                    rank,
                    competitor_id: bracket_match.final_rank_holder(rank),
                    source: SlotRef::MatchOutcome {
                        match_key: bracket_match.key.clone(),
                        wants_winner,
                    },
                };
                let entry = ranks.entry(rank).or_insert_with(|| candidate.clone());
                if entry.competitor_id.is_none() && candidate.competitor_id.is_some() {
                    *entry = candidate;
                }
            }
        }
        ranks.into_values().collect()
    }

    /// Collect the slot transitions an event would cause, failing on any conflict.
    fn plan<F>(&self, mut target: F) -> TournamentResult<Vec<Resolution>>
    where
        F: FnMut(&SlotRef) -> TournamentResult<Option<CompetitorId>>,
    {
        let mut plan = Vec::new();
        for (position, bracket_match) in self.matches.iter().enumerate() {
            for side in [Side::Home, Side::Visitor] {
                let slot = bracket_match.slot(side);
                let Some(competitor) = target(&slot.source)? else {
                    continue;
                };
                match slot.state {
                    SlotState::Unresolved => plan.push((position, side, competitor)),
                    SlotState::Resolved(resolved) if resolved == competitor => {}
                    SlotState::Resolved(resolved) => {
                        return Err(TournamentError::ConflictingResolution {
                            match_key: bracket_match.key.clone(),
                            side,
                            resolved,
                            requested: competitor,
                        });
                    }
                }
            }
        }
        Ok(plan)
    }

    fn apply(&mut self, plan: Vec<Resolution>) -> Vec<String> {
        let mut changed: Vec<String> = Vec::new();
        for (position, side, competitor) in plan {
            let bracket_match = &mut self.matches[position];
            bracket_match.slot_mut(side).state = SlotState::Resolved(competitor);
            log::debug!(
                "Resolved {} slot of match {} to competitor {}",
                side,
                bracket_match.key,
                competitor
            );
            if changed.last() != Some(&bracket_match.key) {
                changed.push(bracket_match.key.clone());
            }
        }
        changed
    }
}

/// Competitor a slot receives from the outcome of `match_key`, if it references it
fn outcome_target(source: &SlotRef, match_key: &str, outcome: MatchOutcome) -> Option<CompetitorId> {
    match source {
        SlotRef::MatchOutcome {
            match_key: key,
            wants_winner,
        } if key == match_key => Some(if *wants_winner {
            outcome.winner
        } else {
            outcome.loser
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap()
    }

    fn pool_sizes() -> BTreeMap<PoolIndex, usize> {
        BTreeMap::from([(1, 3), (2, 3)])
    }

    /// Semi-finals between the top two of two pools, then a final and a third place match
    fn knockout_template() -> Vec<BracketMatchTemplate> {
        vec![
            BracketMatchTemplate::new("SF1", kickoff(), SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 2)),
            BracketMatchTemplate::new("SF2", kickoff(), SlotRef::pool_rank(2, 1), SlotRef::pool_rank(1, 2)),
            BracketMatchTemplate::new("P3", kickoff(), SlotRef::loser_of("SF1"), SlotRef::loser_of("SF2"))
                .with_final_ranks(3, 4),
            BracketMatchTemplate::new("F", kickoff(), SlotRef::winner_of("SF1"), SlotRef::winner_of("SF2"))
                .with_final_ranks(1, 2),
        ]
    }

    fn standings(ranked: &[CompetitorId]) -> Vec<StandingsRow> {
        ranked
            .iter()
            .enumerate()
            .map(|(i, &id)| StandingsRow {
                competitor_id: id,
                name: format!("Team {id}"),
                played: 0,
                wins: 0,
                draws: 0,
                losses: 0,
                goals_scored: 0,
                goal_balance: 0,
                points: 0.0,
                rank: i as u32 + 1,
            })
            .collect()
    }

    fn graph() -> BracketGraph {
        BracketGraph::from_template(knockout_template(), &pool_sizes()).unwrap()
    }

    #[test]
    fn test_pool_completion_resolves_only_that_pool() {
        let mut graph = graph();
        let changed = graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        assert_eq!(changed, vec!["SF1", "SF2"]);

        let sf1 = graph.get("SF1").unwrap();
        assert_eq!(sf1.home.state, SlotState::Resolved(11));
        assert_eq!(sf1.visitor.state, SlotState::Unresolved);
        let sf2 = graph.get("SF2").unwrap();
        assert_eq!(sf2.home.state, SlotState::Unresolved);
        assert_eq!(sf2.visitor.state, SlotState::Resolved(12));
        assert!(graph.get("F").unwrap().home.state == SlotState::Unresolved);
    }

    #[test]
    fn test_pool_completion_is_idempotent() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        let snapshot = graph.clone();

        let changed = graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        assert!(changed.is_empty());
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn test_conflicting_pool_completion_is_rejected_without_changes() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        let snapshot = graph.clone();

        let err = graph
            .resolve_pool_ranks(1, &standings(&[12, 11, 13]))
            .unwrap_err();
        assert!(matches!(err, TournamentError::ConflictingResolution { .. }));
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn test_match_result_resolves_only_dependent_slots() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();

        let outcome = graph
            .record_score("SF1", Score::new(2, 0).unwrap(), None)
            .unwrap();
        assert_eq!(outcome, MatchOutcome { winner: 11, loser: 22 });

        let changed = graph.resolve_match_outcome("SF1", outcome).unwrap();
        assert_eq!(changed, vec!["P3", "F"]);
        assert_eq!(graph.get("F").unwrap().home.state, SlotState::Resolved(11));
        assert_eq!(graph.get("P3").unwrap().home.state, SlotState::Resolved(22));
        assert_eq!(graph.get("F").unwrap().visitor.state, SlotState::Unresolved);
        assert_eq!(graph.get("P3").unwrap().visitor.state, SlotState::Unresolved);

        // Idempotent
        assert!(graph.resolve_match_outcome("SF1", outcome).unwrap().is_empty());
    }

    #[test]
    fn test_tied_score_requires_penalty_decision() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();

        let err = graph
            .record_score("SF1", Score::new(1, 1).unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, TournamentError::MissingPenaltyDecision));
        assert_eq!(graph.get("SF1").unwrap().score, None);

        let outcome = graph
            .record_score("SF1", Score::new(1, 1).unwrap(), Some(Side::Visitor))
            .unwrap();
        assert_eq!(outcome, MatchOutcome { winner: 22, loser: 11 });
        assert_eq!(graph.get("SF1").unwrap().penalty_winner, Some(Side::Visitor));
    }

    #[test]
    fn test_penalty_decision_rejected_on_decided_score() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();

        let err = graph
            .record_score("SF1", Score::new(3, 1).unwrap(), Some(Side::Home))
            .unwrap_err();
        assert!(matches!(err, TournamentError::UnexpectedPenaltyDecision));
    }

    #[test]
    fn test_score_with_unresolved_slot_is_rejected() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();

        let err = graph
            .record_score("SF1", Score::new(1, 0).unwrap(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::UnresolvedSlot {
                side: Side::Visitor,
                ..
            }
        ));
        assert_eq!(graph.get("SF1").unwrap().score, None);
    }

    #[test]
    fn test_rescore_changing_used_outcome_is_rejected() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();
        let outcome = graph
            .record_score("SF1", Score::new(2, 0).unwrap(), None)
            .unwrap();
        graph.resolve_match_outcome("SF1", outcome).unwrap();

        // Same winner with another score is fine
        graph
            .record_score("SF1", Score::new(3, 0).unwrap(), None)
            .unwrap();

        let err = graph
            .record_score("SF1", Score::new(0, 1).unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, TournamentError::ConflictingResolution { .. }));
        assert_eq!(graph.get("SF1").unwrap().score, Some(Score::new(3, 0).unwrap()));
    }

    #[test]
    fn test_unknown_match_key() {
        let mut graph = graph();
        assert!(matches!(
            graph.record_score("QF9", Score::new(1, 0).unwrap(), None),
            Err(TournamentError::BracketMatchNotFound(_))
        ));
        assert!(matches!(
            graph.resolve_match_outcome("QF9", MatchOutcome { winner: 1, loser: 2 }),
            Err(TournamentError::BracketMatchNotFound(_))
        ));
    }

    #[test]
    fn test_final_ranking_sorted_with_placeholders() {
        let mut graph = graph();
        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();
        for (key, score) in [("SF1", (2, 0)), ("SF2", (0, 1))] {
            let outcome = graph
                .record_score(key, Score::new(score.0, score.1).unwrap(), None)
                .unwrap();
            graph.resolve_match_outcome(key, outcome).unwrap();
        }
        let outcome = graph.record_score("F", Score::new(1, 0).unwrap(), None).unwrap();
        graph.resolve_match_outcome("F", outcome).unwrap();

        let ranking = graph.final_ranking();
        assert_eq!(
            ranking,
            vec![
                FinalRank { rank: 1, competitor_id: Some(11), source: SlotRef::winner_of("F") },
                FinalRank { rank: 2, competitor_id: Some(12), source: SlotRef::loser_of("F") },
                FinalRank { rank: 3, competitor_id: None, source: SlotRef::winner_of("P3") },
                FinalRank { rank: 4, competitor_id: None, source: SlotRef::loser_of("P3") },
            ]
        );
    }

    #[test]
    fn test_template_rejects_unknown_pool_and_rank() {
        let bad_pool = vec![BracketMatchTemplate::new(
            "X",
            kickoff(),
            SlotRef::pool_rank(3, 1),
            SlotRef::pool_rank(1, 1),
        )];
        assert!(matches!(
            BracketGraph::from_template(bad_pool, &pool_sizes()),
            Err(TournamentError::InvalidBracket(_))
        ));

        let bad_rank = vec![BracketMatchTemplate::new(
            "X",
            kickoff(),
            SlotRef::pool_rank(1, 4),
            SlotRef::pool_rank(2, 1),
        )];
        assert!(BracketGraph::from_template(bad_rank, &pool_sizes()).is_err());
    }

    #[test]
    fn test_template_rejects_cycles_and_unknown_sources() {
        let cycle = vec![
            BracketMatchTemplate::new("A", kickoff(), SlotRef::winner_of("B"), SlotRef::pool_rank(1, 1)),
            BracketMatchTemplate::new("B", kickoff(), SlotRef::winner_of("A"), SlotRef::pool_rank(2, 1)),
        ];
        let err = BracketGraph::from_template(cycle, &pool_sizes()).unwrap_err();
        assert!(err.to_string().contains("cycle"));

        let self_loop = vec![BracketMatchTemplate::new(
            "A",
            kickoff(),
            SlotRef::winner_of("A"),
            SlotRef::pool_rank(1, 1),
        )];
        assert!(BracketGraph::from_template(self_loop, &pool_sizes()).is_err());

        let unknown = vec![BracketMatchTemplate::new(
            "A",
            kickoff(),
            SlotRef::winner_of("Z"),
            SlotRef::pool_rank(1, 1),
        )];
        assert!(BracketGraph::from_template(unknown, &pool_sizes()).is_err());
    }

    #[test]
    fn test_template_rejects_out_of_range_final_ranks() {
        for (winner, loser) in [(0, 2), (1, MAX_FINAL_RANK + 1), (u32::MAX, 2)] {
            let template = vec![
                BracketMatchTemplate::new("F", kickoff(), SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 1))
                    .with_final_ranks(winner, loser),
            ];
            assert!(matches!(
                BracketGraph::from_template(template, &pool_sizes()),
                Err(TournamentError::InvalidBracket(_))
            ));
        }

        let widest = vec![
            BracketMatchTemplate::new("F", kickoff(), SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 1))
                .with_final_ranks(1, MAX_FINAL_RANK),
        ];
        assert!(BracketGraph::from_template(widest, &pool_sizes()).is_ok());
    }

    #[test]
    fn test_duplicate_final_rank_goes_to_first_decided_match() {
        let template = vec![
            BracketMatchTemplate::new("A", kickoff(), SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 1))
                .with_final_ranks(1, 2),
            BracketMatchTemplate::new("B", kickoff(), SlotRef::pool_rank(1, 2), SlotRef::pool_rank(2, 2))
                .with_final_ranks(1, 2),
        ];
        let mut graph = BracketGraph::from_template(template, &pool_sizes()).unwrap();
        assert_eq!(graph.final_ranking()[0].source, SlotRef::winner_of("A"));

        graph.resolve_pool_ranks(1, &standings(&[11, 12, 13])).unwrap();
        graph.resolve_pool_ranks(2, &standings(&[21, 22, 23])).unwrap();
        let outcome = graph.record_score("B", Score::new(0, 3).unwrap(), None).unwrap();
        graph.resolve_match_outcome("B", outcome).unwrap();

        let ranking = graph.final_ranking();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].competitor_id, Some(22));
        assert_eq!(ranking[0].source, SlotRef::winner_of("B"));
        assert_eq!(ranking[1].competitor_id, Some(12));
    }

    #[test]
    fn test_template_rejects_duplicate_keys_and_identical_slots() {
        let duplicate = vec![
            BracketMatchTemplate::new("A", kickoff(), SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 1)),
            BracketMatchTemplate::new("A", kickoff(), SlotRef::pool_rank(1, 2), SlotRef::pool_rank(2, 2)),
        ];
        assert!(BracketGraph::from_template(duplicate, &pool_sizes()).is_err());

        let identical = vec![BracketMatchTemplate::new(
            "A",
            kickoff(),
            SlotRef::pool_rank(1, 1),
            SlotRef::pool_rank(1, 1),
        )];
        assert!(BracketGraph::from_template(identical, &pool_sizes()).is_err());
    }

    #[test]
    fn test_serde_round_trip_rebuilds_index() {
        let graph = graph();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: BracketGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, graph);
        assert!(restored.get("P3").is_some());
    }
}
