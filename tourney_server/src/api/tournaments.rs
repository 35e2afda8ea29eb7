//! Tournament API handlers.
//!
//! Request bodies are plain JSON; responses are the engine's own projection
//! types, serialized as they are.
//!
//! # Examples
//!
//! Create a tournament of eight placeholder teams in two pools:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Summer Cup", "competitor_count": 8, "pool_count": 2,
//!        "schedule": {"start_time": "2024-06-01T09:00:00Z",
//!                     "match_duration_mins": 10, "break_duration_mins": 5}}'
//! ```
//!
//! Report a bracket score decided on penalties:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/ID/bracket/F/score \
//!   -H "Content-Type: application/json" \
//!   -d '{"home_goals": 1, "visitor_goals": 1, "penalty_winner": "visitor"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tourney::bracket::BracketMatchTemplate;
use tourney::standings::StandingsRow;
use tourney::tournament::{
    BracketMatchView, BracketScoreReport, Competitor, CompetitorId, FinalRankingEntry, MatchId,
    MatchesView, PointRule, PoolIndex, PoolSchedule, PoolScoreReport, PoolStandings,
    ScheduleConfig, Side, Tournament, TournamentConfig, TournamentId, TournamentSummary,
};

use super::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    /// Competitor names in seeding order; takes precedence over `competitor_count`
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Number of placeholder competitors named "Team 1".."Team n"
    pub competitor_count: Option<usize>,
    pub pool_count: u32,
    #[serde(default)]
    pub point_rule: PointRule,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub bracket: Vec<BracketMatchTemplate>,
}

impl From<CreateTournamentRequest> for TournamentConfig {
    fn from(request: CreateTournamentRequest) -> Self {
        let config = if request.competitors.is_empty() {
            TournamentConfig::with_competitor_count(
                request.name,
                request.competitor_count.unwrap_or(0),
                request.pool_count,
                request.schedule,
            )
        } else {
            TournamentConfig {
                name: request.name,
                competitors: request.competitors,
                pool_count: request.pool_count,
                point_rule: PointRule::default(),
                schedule: request.schedule,
                bracket: Vec::new(),
            }
        };
        config
            .with_point_rule(request.point_rule)
            .with_bracket(request.bracket)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: TournamentId,
}

#[derive(Debug, Deserialize)]
pub struct RenameCompetitorsRequest {
    /// New name per competitor id
    pub names: BTreeMap<CompetitorId, String>,
}

#[derive(Debug, Deserialize)]
pub struct PoolScoreRequest {
    pub home_goals: i32,
    pub visitor_goals: i32,
}

#[derive(Debug, Deserialize)]
pub struct BracketScoreRequest {
    pub home_goals: i32,
    pub visitor_goals: i32,
    /// "home" or "visitor", only for a tied score
    pub penalty_winner: Option<String>,
}

/// List every tournament.
pub async fn list_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TournamentSummary>>> {
    Ok(Json(state.manager.list_tournaments().await?))
}

/// Create a tournament: pools, schedules and bracket.
///
/// # Response
///
/// Returns `201 Created` with the new tournament id:
/// ```json
/// { "id": "7f9c2ba4-e88f-4a2c-9d6b-1f6f4b5a3c2e" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: invalid name, pool count or competitor names
/// - `400 Bad Request`: invalid bracket template
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.manager.create_tournament(request.into()).await?;
    tracing::info!(tournament_id = %id, "Tournament created via API");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Full tournament state.
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(state.manager.get_tournament(id).await?))
}

/// Delete a tournament and every record of it.
pub async fn delete_tournament(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<StatusCode> {
    state.manager.delete_tournament(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename competitors; returns the renamed competitors.
///
/// # Errors
///
/// - `404 Not Found`: unknown competitor id
/// - `422 Unprocessable Entity`: empty name, or a name already used in the pool
pub async fn rename_competitors(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(request): Json<RenameCompetitorsRequest>,
) -> ApiResult<Json<Vec<Competitor>>> {
    let renamed = state
        .manager
        .rename_competitors(id, &request.names)
        .await?;
    Ok(Json(renamed))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<PoolSchedule>>> {
    Ok(Json(state.manager.get_schedule(id).await?))
}

pub async fn get_pool_schedule(
    State(state): State<AppState>,
    Path((id, pool_index)): Path<(TournamentId, PoolIndex)>,
) -> ApiResult<Json<PoolSchedule>> {
    Ok(Json(state.manager.get_pool_schedule(id, pool_index).await?))
}

pub async fn get_all_standings(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<PoolStandings>>> {
    Ok(Json(state.manager.get_all_standings(id).await?))
}

pub async fn get_pool_standings(
    State(state): State<AppState>,
    Path((id, pool_index)): Path<(TournamentId, PoolIndex)>,
) -> ApiResult<Json<Vec<StandingsRow>>> {
    Ok(Json(state.manager.get_standings(id, pool_index).await?))
}

/// Report the score of a pool match.
///
/// When the report completes the pool, its final ranks are propagated into
/// the bracket and the response lists the bracket matches that changed.
///
/// # Errors
///
/// - `404 Not Found`: unknown tournament or pool match
/// - `422 Unprocessable Entity`: negative goals
/// - `409 Conflict`: a re-score that would change an already used pool rank
pub async fn report_pool_match_score(
    State(state): State<AppState>,
    Path((id, match_id)): Path<(TournamentId, MatchId)>,
    Json(request): Json<PoolScoreRequest>,
) -> ApiResult<Json<PoolScoreReport>> {
    let report = state
        .manager
        .report_pool_match_score(id, match_id, request.home_goals, request.visitor_goals)
        .await?;
    if report.pool_completed {
        tracing::info!(
            tournament_id = %id,
            pool_index = report.pool_match.pool_index,
            updated = report.updated_bracket_matches.len(),
            "Pool completed"
        );
    }
    Ok(Json(report))
}

pub async fn get_bracket(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<BracketMatchView>>> {
    Ok(Json(state.manager.get_bracket_view(id).await?))
}

/// Report the score of a bracket match.
///
/// # Errors
///
/// - `404 Not Found`: unknown tournament or match key
/// - `422 Unprocessable Entity`: negative goals, or a penalty decision that is
///   missing for a tie, present for a non-tie, or not "home"/"visitor"
/// - `409 Conflict`: a slot of the match is not resolved yet, or the new
///   outcome contradicts slots already resolved from it
pub async fn report_bracket_match_score(
    State(state): State<AppState>,
    Path((id, key)): Path<(TournamentId, String)>,
    Json(request): Json<BracketScoreRequest>,
) -> ApiResult<Json<BracketScoreReport>> {
    let penalty_winner = request
        .penalty_winner
        .map(|side| side.parse::<Side>())
        .transpose()?;
    let report = state
        .manager
        .report_bracket_match_score(
            id,
            &key,
            request.home_goals,
            request.visitor_goals,
            penalty_winner,
        )
        .await?;
    Ok(Json(report))
}

pub async fn get_final_ranking(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<Vec<FinalRankingEntry>>> {
    Ok(Json(state.manager.get_final_ranking(id).await?))
}

/// Every match of the tournament: pool schedules, then the bracket.
pub async fn get_matches(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> ApiResult<Json<MatchesView>> {
    Ok(Json(state.manager.get_matches(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> CreateTournamentRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_create_request_with_count() {
        let config: TournamentConfig = request(serde_json::json!({
            "name": "Summer Cup",
            "competitor_count": 3,
            "pool_count": 1,
            "schedule": {
                "start_time": "2024-06-01T09:00:00Z",
                "match_duration_mins": 10,
                "break_duration_mins": 5
            }
        }))
        .into();

        assert_eq!(config.competitors, vec!["Team 1", "Team 2", "Team 3"]);
        assert_eq!(config.point_rule, PointRule::default());
        assert!(config.bracket.is_empty());
    }

    #[test]
    fn test_create_request_names_win_over_count() {
        let config: TournamentConfig = request(serde_json::json!({
            "name": "Summer Cup",
            "competitors": ["Rovers", "United"],
            "competitor_count": 6,
            "pool_count": 1,
            "point_rule": {
                "points_per_win": 2.0,
                "points_per_draw": 1.0,
                "points_per_loss": 0.0,
                "points_per_goal": 0.5
            },
            "schedule": {
                "start_time": "2024-06-01T09:00:00Z",
                "match_duration_mins": 10,
                "break_duration_mins": 5
            },
            "bracket": [{
                "key": "F",
                "kickoff": "2024-06-01T12:00:00Z",
                "home": {"type": "pool_rank", "pool_index": 1, "rank": 1},
                "visitor": {"type": "pool_rank", "pool_index": 1, "rank": 2},
                "winner_final_rank": 1,
                "loser_final_rank": 2
            }]
        }))
        .into();

        assert_eq!(config.competitors, vec!["Rovers", "United"]);
        assert_eq!(config.point_rule.points_per_goal, 0.5);
        assert_eq!(config.bracket.len(), 1);
        assert_eq!(config.bracket[0].winner_final_rank, Some(1));
    }
}
