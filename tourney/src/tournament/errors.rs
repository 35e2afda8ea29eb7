//! Tournament error types.

use thiserror::Error;

use super::models::{CompetitorId, MatchId, PoolIndex, Side, TournamentId};

/// Broad category of a [`TournamentError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input, safe to re-prompt the user
    Validation,
    /// Unknown tournament, pool, match or competitor
    NotFound,
    /// Operation not allowed in the current resolution state
    State,
    /// Invalid bracket template, detected at setup
    Configuration,
    /// Failure of the persistence collaborator
    Storage,
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Goals cannot be negative (got {home}-{visitor})")]
    NegativeGoals { home: i32, visitor: i32 },

    #[error("A tied score requires a penalty shoot-out winner")]
    MissingPenaltyDecision,

    #[error("A penalty shoot-out winner is only allowed for a tied score")]
    UnexpectedPenaltyDecision,

    #[error("Invalid penalty shoot-out winner: {0}")]
    InvalidPenaltyDecision(String),

    #[error("Competitor name cannot be empty")]
    EmptyCompetitorName,

    #[error("Duplicate competitor name in pool {pool_index}: {name}")]
    DuplicateCompetitorName { pool_index: PoolIndex, name: String },

    #[error("Invalid tournament setup: {0}")]
    InvalidSetup(String),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Pool not found: {0}")]
    PoolNotFound(PoolIndex),

    #[error("Pool match not found: {0}")]
    PoolMatchNotFound(MatchId),

    #[error("Bracket match not found: {0}")]
    BracketMatchNotFound(String),

    #[error("Competitor not found: {0}")]
    CompetitorNotFound(CompetitorId),

    #[error("Match {match_key}: {side} slot is not resolved yet")]
    UnresolvedSlot { match_key: String, side: Side },

    #[error(
        "Match {match_key}: {side} slot already resolved to {resolved}, refusing {requested}"
    )]
    ConflictingResolution {
        match_key: String,
        side: Side,
        resolved: CompetitorId,
        requested: CompetitorId,
    },

    #[error("Inconsistent tournament data: {0}")]
    Inconsistent(String),

    #[error("Invalid bracket template: {0}")]
    InvalidBracket(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TournamentError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::NegativeGoals { .. }
            | TournamentError::MissingPenaltyDecision
            | TournamentError::UnexpectedPenaltyDecision
            | TournamentError::InvalidPenaltyDecision(_)
            | TournamentError::EmptyCompetitorName
            | TournamentError::DuplicateCompetitorName { .. }
            | TournamentError::InvalidSetup(_) => ErrorKind::Validation,
            TournamentError::TournamentNotFound(_)
            | TournamentError::PoolNotFound(_)
            | TournamentError::PoolMatchNotFound(_)
            | TournamentError::BracketMatchNotFound(_)
            | TournamentError::CompetitorNotFound(_) => ErrorKind::NotFound,
            TournamentError::UnresolvedSlot { .. }
            | TournamentError::ConflictingResolution { .. }
            | TournamentError::Inconsistent(_) => ErrorKind::State,
            TournamentError::InvalidBracket(_) => ErrorKind::Configuration,
            TournamentError::Database(_) | TournamentError::Serialization(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::Serialization(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TournamentError::MissingPenaltyDecision.kind(),
            ErrorKind::Validation
        );
        assert_eq!(TournamentError::PoolNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            TournamentError::UnresolvedSlot {
                match_key: "F".to_string(),
                side: Side::Home
            }
            .kind(),
            ErrorKind::State
        );
        assert_eq!(
            TournamentError::InvalidBracket("cycle".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TournamentError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err = TournamentError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");

        let err = TournamentError::MissingPenaltyDecision;
        assert_eq!(err.client_message(), err.to_string());
    }
}
