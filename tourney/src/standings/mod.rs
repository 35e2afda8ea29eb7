//! Pool standings computed from played pool matches.
//!
//! Standings are a derived view: they are recomputed on demand from the pool
//! matches that have a score and are never stored.
//!
//! Ranking order is points descending, then goal balance descending, then
//! name ascending. Names are unique within a pool, so every competitor gets
//! a distinct rank.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::tournament::models::{Competitor, CompetitorId, PointRule, PoolMatch};

/// One line of a pool standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_scored: u64,
    pub goal_balance: i64,
    pub points: f64,
    /// 1-based rank
    pub rank: u32,
}

impl StandingsRow {
    fn empty(competitor: &Competitor) -> Self {
        Self {
            competitor_id: competitor.id,
            name: competitor.name.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_scored: 0,
            goal_balance: 0,
            points: 0.0,
            rank: 0,
        }
    }
}

/// Compute the ranked standings of one pool.
///
/// `competitors` lists every pool member so that competitors without a
/// played match still appear. Matches without a score are ignored.
pub fn compute_standings<'a>(
    competitors: impl IntoIterator<Item = &'a Competitor>,
    matches: &[PoolMatch],
    point_rule: &PointRule,
) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = competitors
        .into_iter()
        .map(|competitor| {
            let mut row = StandingsRow::empty(competitor);
            for pool_match in matches {
                let (Some(score), Some(side)) = (pool_match.score, pool_match.side_of(competitor.id))
                else {
                    continue;
                };
                let (scored, conceded) = score.goals_for(side);
                row.played += 1;
                match scored.cmp(&conceded) {
                    Ordering::Greater => row.wins += 1,
                    Ordering::Equal => row.draws += 1,
                    Ordering::Less => row.losses += 1,
                }
                row.goals_scored += u64::from(scored);
                row.goal_balance += i64::from(scored) - i64::from(conceded);
            }
            row.points = f64::from(row.wins) * point_rule.points_per_win
                + f64::from(row.draws) * point_rule.points_per_draw
                + f64::from(row.losses) * point_rule.points_per_loss
                + row.goals_scored as f64 * point_rule.points_per_goal;
            row
        })
        .collect();

    rows.sort_by(ranking_order);
    for (position, row) in rows.iter_mut().enumerate() {
        row.rank = position as u32 + 1;
    }
    rows
}

/// Sort order of standings rows, best first
fn ranking_order(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .total_cmp(&a.points)
        .then_with(|| b.goal_balance.cmp(&a.goal_balance))
        .then_with(|| a.name.cmp(&b.name))
}
