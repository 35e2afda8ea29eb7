//! HTTP/JSON API for the tournament engine.
//!
//! Every handler is glue: it decodes the request, calls the
//! [`TournamentManager`] and encodes the result. Errors are mapped from
//! [`ErrorKind`] onto HTTP status codes in one place, [`ApiError`].
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                                         - Health check
//! GET    /api/v1/tournaments                             - List tournaments
//! POST   /api/v1/tournaments                             - Create a tournament
//! GET    /api/v1/tournaments/{id}                        - Full tournament state
//! DELETE /api/v1/tournaments/{id}                        - Delete a tournament
//! PUT    /api/v1/tournaments/{id}/competitors            - Rename competitors
//! GET    /api/v1/tournaments/{id}/schedule               - Schedules of every pool
//! GET    /api/v1/tournaments/{id}/standings              - Standings of every pool
//! GET    /api/v1/tournaments/{id}/pools/{pool}/schedule  - Schedule of one pool
//! GET    /api/v1/tournaments/{id}/pools/{pool}/standings - Standings of one pool
//! POST   /api/v1/tournaments/{id}/pool-matches/{match}/score
//!                                                        - Report a pool match score
//! GET    /api/v1/tournaments/{id}/bracket                - Bracket view
//! POST   /api/v1/tournaments/{id}/bracket/{key}/score    - Report a bracket match score
//! GET    /api/v1/tournaments/{id}/final-ranking          - Final ranking
//! GET    /api/v1/tournaments/{id}/matches                - Every match of the tournament
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use serde_json::json;
use tourney::tournament::{ErrorKind, TournamentError, TournamentManager};
use tower_http::cors::CorsLayer;

use crate::logging::log_rejected_request;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the manager is a handle over shared state.
#[derive(Clone)]
pub struct AppState {
    pub manager: TournamentManager,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// A tournament error on its way to the client
#[derive(Debug)]
pub struct ApiError(pub TournamentError);

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Configuration => StatusCode::BAD_REQUEST,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::State => "state",
        ErrorKind::Configuration => "configuration",
        ErrorKind::Storage => "storage",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        log_rejected_request(kind_name(kind), status.as_u16(), &self.0.to_string());

        let body = ErrorResponse {
            error: self.0.client_message(),
            kind: kind_name(kind),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type of every handler
pub type ApiResult<T> = Result<T, ApiError>;

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use tourney_server::api::{create_router, AppState};
/// # use tourney::db::InMemoryTournamentRepository;
/// # use tourney::tournament::TournamentManager;
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = TournamentManager::new(Arc::new(InMemoryTournamentRepository::new()));
/// let app = create_router(AppState { manager });
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Versioned tournament endpoints
fn create_v1_router() -> Router<AppState> {
    use tournaments::*;

    Router::new()
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route(
            "/tournaments/{id}",
            get(get_tournament).delete(delete_tournament),
        )
        .route("/tournaments/{id}/competitors", put(rename_competitors))
        .route("/tournaments/{id}/schedule", get(get_schedule))
        .route("/tournaments/{id}/standings", get(get_all_standings))
        .route(
            "/tournaments/{id}/pools/{pool_index}/schedule",
            get(get_pool_schedule),
        )
        .route(
            "/tournaments/{id}/pools/{pool_index}/standings",
            get(get_pool_standings),
        )
        .route(
            "/tournaments/{id}/pool-matches/{match_id}/score",
            post(report_pool_match_score),
        )
        .route("/tournaments/{id}/bracket", get(get_bracket))
        .route(
            "/tournaments/{id}/bracket/{key}/score",
            post(report_bracket_match_score),
        )
        .route("/tournaments/{id}/final-ranking", get(get_final_ranking))
        .route("/tournaments/{id}/matches", get(get_matches))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the storage backend answers a listing, or
/// `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = state.manager.list_tournaments().await.is_ok();

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(TournamentError::NegativeGoals { home: -1, visitor: 0 }.kind()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(TournamentError::BracketMatchNotFound("F".to_string()).kind()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(TournamentError::Inconsistent("x".to_string()).kind()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(TournamentError::InvalidBracket("cycle".to_string()).kind()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_errors_are_sanitized() {
        let cause = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ApiError(TournamentError::Serialization(cause));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
