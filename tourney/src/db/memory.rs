//! In-memory tournament repository, used by tests and by servers running
//! without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::repository::TournamentRepository;
use crate::bracket::BracketMatch;
use crate::tournament::{
    Competitor, PoolMatch, Tournament, TournamentError, TournamentId, TournamentResult,
    TournamentSummary,
};

/// Tournaments kept in a shared map; every save applies completely or not at all
#[derive(Clone, Default)]
pub struct InMemoryTournamentRepository {
    tournaments: Arc<RwLock<HashMap<TournamentId, Tournament>>>,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_bracket_matches(
    tournament: &mut Tournament,
    bracket_matches: &[BracketMatch],
) -> TournamentResult<()> {
    for bracket_match in bracket_matches {
        tournament.bracket.replace_match(bracket_match.clone())?;
    }
    Ok(())
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn insert_tournament(&self, tournament: &Tournament) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        if tournaments.contains_key(&tournament.id) {
            return Err(TournamentError::Inconsistent(format!(
                "tournament {} already exists",
                tournament.id
            )));
        }
        tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn load_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.tournaments.read().await.get(&id).cloned())
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>> {
        let tournaments = self.tournaments.read().await;
        let mut summaries: Vec<TournamentSummary> =
            tournaments.values().map(TournamentSummary::from).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn save_pool_match_score(
        &self,
        id: TournamentId,
        pool_match: &PoolMatch,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;

        let mut updated = stored.clone();
        let slot = updated
            .pool_matches
            .iter_mut()
            .find(|m| m.id == pool_match.id)
            .ok_or(TournamentError::PoolMatchNotFound(pool_match.id))?;
        *slot = pool_match.clone();
        apply_bracket_matches(&mut updated, bracket_matches)?;

        *stored = updated;
        Ok(())
    }

    async fn save_bracket_matches(
        &self,
        id: TournamentId,
        bracket_matches: &[BracketMatch],
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;

        let mut updated = stored.clone();
        apply_bracket_matches(&mut updated, bracket_matches)?;
        *stored = updated;
        Ok(())
    }

    async fn save_competitor_names(
        &self,
        id: TournamentId,
        competitors: &[Competitor],
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;

        let mut updated = stored.clone();
        for competitor in competitors {
            let slot = updated
                .competitors
                .iter_mut()
                .find(|c| c.id == competitor.id)
                .ok_or(TournamentError::CompetitorNotFound(competitor.id))?;
            slot.name = competitor.name.clone();
        }
        *stored = updated;
        Ok(())
    }

    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool> {
        Ok(self.tournaments.write().await.remove(&id).is_some())
    }
}
