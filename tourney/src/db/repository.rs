//! Repository trait for tournament persistence, with the PostgreSQL implementation.
//!
//! The manager works on whole [`Tournament`] aggregates: it loads one, lets
//! the engine mutate it, then saves only the records that changed.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::bracket::{BracketGraph, BracketMatch, BracketSlot};
use crate::tournament::{
    Competitor, PointRule, Pool, PoolIndex, PoolMatch, ScheduleConfig, Score, Side, Tournament,
    TournamentError, TournamentId, TournamentResult, TournamentSummary,
};

/// Storage collaborator of the tournament manager
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Store a freshly created tournament with all its records
    async fn insert_tournament(&self, tournament: &Tournament) -> TournamentResult<()>;

    /// Load a complete tournament
    async fn load_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// List all tournaments, oldest first
    async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>>;

    /// Save a pool match score and the bracket matches its propagation changed, atomically
    async fn save_pool_match_score(
        &self,
        id: TournamentId,
        pool_match: &PoolMatch,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()>;

    /// Save bracket matches (score and slots), atomically
    async fn save_bracket_matches(
        &self,
        id: TournamentId,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()>;

    /// Save competitor names, atomically
    async fn save_competitor_names(
        &self,
        id: TournamentId,
        competitors: &[Competitor],
    ) -> TournamentResult<()>;

    /// Delete a tournament and every record of it. Returns false if it did not exist.
    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool>;
}

/// Default PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_bracket_matches(
        tx: &mut Transaction<'_, Postgres>,
        id: TournamentId,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()> {
        for bracket_match in bracket_matches {
            let (home_goals, visitor_goals) = goals(bracket_match.score)?;
            let result = sqlx::query(
                r#"
                UPDATE bracket_matches
                SET home_slot = $3, visitor_slot = $4, home_goals = $5, visitor_goals = $6,
                    penalty_winner = $7
                WHERE tournament_id = $1 AND match_key = $2
                "#,
            )
            .bind(id)
            .bind(&bracket_match.key)
            .bind(Json(&bracket_match.home))
            .bind(Json(&bracket_match.visitor))
            .bind(home_goals)
            .bind(visitor_goals)
            .bind(bracket_match.penalty_winner.map(|side| side.to_string()))
            .execute(&mut **tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(TournamentError::BracketMatchNotFound(
                    bracket_match.key.clone(),
                ));
            }
        }
        Ok(())
    }
}

/// Integer column value; out of range values are encode errors, never wrapped
fn to_db_int<T>(value: T) -> TournamentResult<i32>
where
    T: TryInto<i32>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    value
        .try_into()
        .map_err(|e| TournamentError::Database(sqlx::Error::Encode(Box::new(e))))
}

fn from_db_int(value: i32) -> TournamentResult<u32> {
    u32::try_from(value).map_err(|e| TournamentError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn goals(score: Option<Score>) -> TournamentResult<(Option<i32>, Option<i32>)> {
    match score {
        Some(score) => Ok((Some(to_db_int(score.home)?), Some(to_db_int(score.visitor)?))),
        None => Ok((None, None)),
    }
}

fn score_from_row(row: &PgRow) -> TournamentResult<Option<Score>> {
    let home: Option<i32> = row.try_get("home_goals")?;
    let visitor: Option<i32> = row.try_get("visitor_goals")?;
    match (home, visitor) {
        (Some(home), Some(visitor)) => Ok(Some(Score::new(home, visitor)?)),
        _ => Ok(None),
    }
}

fn bracket_match_from_row(row: &PgRow) -> TournamentResult<BracketMatch> {
    let penalty_winner = row
        .try_get::<Option<String>, _>("penalty_winner")?
        .map(|side| side.parse::<Side>())
        .transpose()?;
    Ok(BracketMatch {
        key: row.try_get("match_key")?,
        kickoff: row.try_get("kickoff")?,
        home: row.try_get::<Json<BracketSlot>, _>("home_slot")?.0,
        visitor: row.try_get::<Json<BracketSlot>, _>("visitor_slot")?.0,
        score: score_from_row(row)?,
        penalty_winner,
        winner_final_rank: row
            .try_get::<Option<i32>, _>("winner_final_rank")?
            .map(from_db_int)
            .transpose()?,
        loser_final_rank: row
            .try_get::<Option<i32>, _>("loser_final_rank")?
            .map(from_db_int)
            .transpose()?,
    })
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn insert_tournament(&self, tournament: &Tournament) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tournaments (id, name, points_per_win, points_per_draw, points_per_loss,
                                     points_per_goal, start_time, match_duration_mins,
                                     break_duration_mins, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(tournament.point_rule.points_per_win)
        .bind(tournament.point_rule.points_per_draw)
        .bind(tournament.point_rule.points_per_loss)
        .bind(tournament.point_rule.points_per_goal)
        .bind(tournament.schedule.start_time)
        .bind(to_db_int(tournament.schedule.match_duration_mins)?)
        .bind(to_db_int(tournament.schedule.break_duration_mins)?)
        .bind(tournament.created_at)
        .execute(&mut *tx)
        .await?;

        for pool in &tournament.pools {
            sqlx::query("INSERT INTO pools (tournament_id, pool_index, name) VALUES ($1, $2, $3)")
                .bind(tournament.id)
                .bind(to_db_int(pool.index)?)
                .bind(&pool.name)
                .execute(&mut *tx)
                .await?;
        }

        for competitor in &tournament.competitors {
            sqlx::query(
                "INSERT INTO competitors (tournament_id, id, name, pool_index) VALUES ($1, $2, $3, $4)",
            )
            .bind(tournament.id)
            .bind(competitor.id)
            .bind(&competitor.name)
            .bind(to_db_int(competitor.pool_index)?)
            .execute(&mut *tx)
            .await?;
        }

        for pool_match in &tournament.pool_matches {
            let (home_goals, visitor_goals) = goals(pool_match.score)?;
            sqlx::query(
                r#"
                INSERT INTO pool_matches (tournament_id, id, pool_index, kickoff, home_id,
                                          visitor_id, home_goals, visitor_goals)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(tournament.id)
            .bind(pool_match.id)
            .bind(to_db_int(pool_match.pool_index)?)
            .bind(pool_match.kickoff)
            .bind(pool_match.home)
            .bind(pool_match.visitor)
            .bind(home_goals)
            .bind(visitor_goals)
            .execute(&mut *tx)
            .await?;
        }

        for (position, bracket_match) in tournament.bracket.matches().iter().enumerate() {
            let (home_goals, visitor_goals) = goals(bracket_match.score)?;
            sqlx::query(
                r#"
                INSERT INTO bracket_matches (tournament_id, match_key, position, kickoff,
                                             home_slot, visitor_slot, home_goals, visitor_goals,
                                             penalty_winner, winner_final_rank, loser_final_rank)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(tournament.id)
            .bind(&bracket_match.key)
            .bind(to_db_int(position)?)
            .bind(bracket_match.kickoff)
            .bind(Json(&bracket_match.home))
            .bind(Json(&bracket_match.visitor))
            .bind(home_goals)
            .bind(visitor_goals)
            .bind(bracket_match.penalty_winner.map(|side| side.to_string()))
            .bind(bracket_match.winner_final_rank.map(to_db_int).transpose()?)
            .bind(bracket_match.loser_final_rank.map(to_db_int).transpose()?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, name, points_per_win, points_per_draw, points_per_loss, points_per_goal,
                   start_time, match_duration_mins, break_duration_mins, created_at
            FROM tournaments WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let competitors = sqlx::query(
            "SELECT id, name, pool_index FROM competitors WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| -> TournamentResult<Competitor> {
            Ok(Competitor {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
                pool_index: from_db_int(r.try_get("pool_index")?)?,
            })
        })
        .collect::<TournamentResult<Vec<_>>>()?;

        let pools = sqlx::query(
            "SELECT pool_index, name FROM pools WHERE tournament_id = $1 ORDER BY pool_index",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| -> TournamentResult<Pool> {
            let index: PoolIndex = from_db_int(r.try_get("pool_index")?)?;
            Ok(Pool {
                index,
                name: r.try_get("name")?,
                competitor_ids: competitors
                    .iter()
                    .filter(|competitor| competitor.pool_index == index)
                    .map(|competitor| competitor.id)
                    .collect(),
            })
        })
        .collect::<TournamentResult<Vec<_>>>()?;

        let pool_matches = sqlx::query(
            r#"
            SELECT id, pool_index, kickoff, home_id, visitor_id, home_goals, visitor_goals
            FROM pool_matches WHERE tournament_id = $1 ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| -> TournamentResult<PoolMatch> {
            Ok(PoolMatch {
                id: r.try_get("id")?,
                pool_index: from_db_int(r.try_get("pool_index")?)?,
                kickoff: r.try_get("kickoff")?,
                home: r.try_get("home_id")?,
                visitor: r.try_get("visitor_id")?,
                score: score_from_row(r)?,
            })
        })
        .collect::<TournamentResult<Vec<_>>>()?;

        let bracket_matches = sqlx::query(
            r#"
            SELECT match_key, kickoff, home_slot, visitor_slot, home_goals, visitor_goals,
                   penalty_winner, winner_final_rank, loser_final_rank
            FROM bracket_matches WHERE tournament_id = $1 ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(bracket_match_from_row)
        .collect::<TournamentResult<Vec<_>>>()?;

        Ok(Some(Tournament {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            point_rule: PointRule {
                points_per_win: row.try_get("points_per_win")?,
                points_per_draw: row.try_get("points_per_draw")?,
                points_per_loss: row.try_get("points_per_loss")?,
                points_per_goal: row.try_get("points_per_goal")?,
            },
            schedule: ScheduleConfig::new(
                row.try_get("start_time")?,
                from_db_int(row.try_get("match_duration_mins")?)?,
                from_db_int(row.try_get("break_duration_mins")?)?,
            ),
            created_at: row.try_get("created_at")?,
            competitors,
            pools,
            pool_matches,
            bracket: BracketGraph::from_matches(bracket_matches),
        }))
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at,
                   (SELECT COUNT(*) FROM pools p WHERE p.tournament_id = t.id) AS pool_count,
                   (SELECT COUNT(*) FROM competitors c WHERE c.tournament_id = t.id) AS competitor_count
            FROM tournaments t
            ORDER BY t.created_at, t.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> TournamentResult<TournamentSummary> {
                Ok(TournamentSummary {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    pool_count: r.try_get::<i64, _>("pool_count")? as usize,
                    competitor_count: r.try_get::<i64, _>("competitor_count")? as usize,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn save_pool_match_score(
        &self,
        id: TournamentId,
        pool_match: &PoolMatch,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        let (home_goals, visitor_goals) = goals(pool_match.score)?;
        let result = sqlx::query(
            r#"
            UPDATE pool_matches SET home_goals = $3, visitor_goals = $4
            WHERE tournament_id = $1 AND id = $2
            "#,
        )
        .bind(id)
        .bind(pool_match.id)
        .bind(home_goals)
        .bind(visitor_goals)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TournamentError::PoolMatchNotFound(pool_match.id));
        }

        Self::update_bracket_matches(&mut tx, id, bracket_matches).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_bracket_matches(
        &self,
        id: TournamentId,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::update_bracket_matches(&mut tx, id, bracket_matches).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_competitor_names(
        &self,
        id: TournamentId,
        competitors: &[Competitor],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        for competitor in competitors {
            let result =
                sqlx::query("UPDATE competitors SET name = $3 WHERE tournament_id = $1 AND id = $2")
                    .bind(id)
                    .bind(competitor.id)
                    .bind(&competitor.name)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(TournamentError::CompetitorNotFound(competitor.id));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
