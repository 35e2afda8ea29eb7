//! Tournament manager: the control surface over stored tournaments.
//!
//! Every operation on a tournament runs under that tournament's lock: load,
//! apply the engine, save. A score report and its propagation therefore
//! complete before any other operation on the same tournament sees its
//! state. Different tournaments never wait on each other.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::engine::{BracketScoreReport, PoolScoreReport};
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Competitor, CompetitorId, MatchId, PoolIndex, Side, Tournament, TournamentConfig,
    TournamentId, TournamentSummary,
};
use super::views::{
    BracketMatchView, FinalRankingEntry, MatchesView, PoolSchedule, PoolStandings,
};
use crate::db::TournamentRepository;
use crate::standings::StandingsRow;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    /// Storage collaborator
    repository: Arc<dyn TournamentRepository>,

    /// One lock per tournament, created on first use
    locks: Arc<RwLock<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repository: Arc<dyn TournamentRepository>) -> Self {
        Self {
            repository,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, id: TournamentId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&id) {
            return Arc::clone(lock);
        }
        Arc::clone(self.locks.write().await.entry(id).or_default())
    }

    /// Lock the tournament and load it
    async fn load_locked(
        &self,
        id: TournamentId,
    ) -> TournamentResult<(OwnedMutexGuard<()>, Tournament)> {
        let guard = self.lock_for(id).await.lock_owned().await;
        match self.repository.load_tournament(id).await? {
            Some(tournament) => Ok((guard, tournament)),
            None => {
                drop(guard);
                self.locks.write().await.remove(&id);
                Err(TournamentError::TournamentNotFound(id))
            }
        }
    }

    /// Run a read-only projection on a consistent snapshot
    async fn read<T>(
        &self,
        id: TournamentId,
        project: impl FnOnce(&Tournament) -> TournamentResult<T>,
    ) -> TournamentResult<T> {
        let (_guard, tournament) = self.load_locked(id).await?;
        project(&tournament)
    }

    /// Create a tournament: pools, schedules and bracket
    pub async fn create_tournament(
        &self,
        config: TournamentConfig,
    ) -> TournamentResult<TournamentId> {
        let tournament = Tournament::create(Uuid::new_v4(), config, Utc::now())?;
        self.repository.insert_tournament(&tournament).await?;

        log::info!(
            "Created tournament {} '{}' with {} competitors in {} pools",
            tournament.id,
            tournament.name,
            tournament.competitors.len(),
            tournament.pools.len()
        );
        Ok(tournament.id)
    }

    /// Report the score of a pool match, propagating pool completion into the bracket
    pub async fn report_pool_match_score(
        &self,
        id: TournamentId,
        match_id: MatchId,
        home_goals: i32,
        visitor_goals: i32,
    ) -> TournamentResult<PoolScoreReport> {
        let (_guard, mut tournament) = self.load_locked(id).await?;

        let report = tournament
            .report_pool_match_score(match_id, home_goals, visitor_goals)
            .inspect_err(|e| {
                log::warn!("Rejected score for pool match {match_id} of tournament {id}: {e}")
            })?;

        self.repository
            .save_pool_match_score(id, &report.pool_match, &report.updated_bracket_matches)
            .await?;
        Ok(report)
    }

    /// Report the score of a bracket match, propagating its winner and loser
    pub async fn report_bracket_match_score(
        &self,
        id: TournamentId,
        match_key: &str,
        home_goals: i32,
        visitor_goals: i32,
        penalty_winner: Option<Side>,
    ) -> TournamentResult<BracketScoreReport> {
        let (_guard, mut tournament) = self.load_locked(id).await?;

        let report = tournament
            .report_bracket_match_score(match_key, home_goals, visitor_goals, penalty_winner)
            .inspect_err(|e| {
                log::warn!("Rejected score for bracket match {match_key} of tournament {id}: {e}")
            })?;

        self.repository
            .save_bracket_matches(id, &report.updated_bracket_matches)
            .await?;
        Ok(report)
    }

    /// Rename competitors, returning them with their new names
    pub async fn rename_competitors(
        &self,
        id: TournamentId,
        names: &BTreeMap<CompetitorId, String>,
    ) -> TournamentResult<Vec<Competitor>> {
        let (_guard, mut tournament) = self.load_locked(id).await?;

        let renamed = tournament.rename_competitors(names)?;
        self.repository.save_competitor_names(id, &renamed).await?;
        Ok(renamed)
    }

    /// Delete a tournament and all its records
    pub async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        let guard = self.lock_for(id).await.lock_owned().await;
        let deleted = self.repository.delete_tournament(id).await?;
        drop(guard);
        self.locks.write().await.remove(&id);

        if !deleted {
            return Err(TournamentError::TournamentNotFound(id));
        }
        log::info!("Deleted tournament {}", id);
        Ok(())
    }

    pub async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.read(id, |tournament| Ok(tournament.clone())).await
    }

    pub async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>> {
        self.repository.list_tournaments().await
    }

    /// Ordered schedules of every pool
    pub async fn get_schedule(&self, id: TournamentId) -> TournamentResult<Vec<PoolSchedule>> {
        self.read(id, Tournament::pool_schedules).await
    }

    pub async fn get_pool_schedule(
        &self,
        id: TournamentId,
        pool_index: PoolIndex,
    ) -> TournamentResult<PoolSchedule> {
        self.read(id, |tournament| tournament.pool_schedule(pool_index))
            .await
    }

    /// Ranked standings of one pool
    pub async fn get_standings(
        &self,
        id: TournamentId,
        pool_index: PoolIndex,
    ) -> TournamentResult<Vec<StandingsRow>> {
        self.read(id, |tournament| tournament.standings(pool_index))
            .await
    }

    pub async fn get_all_standings(&self, id: TournamentId) -> TournamentResult<Vec<PoolStandings>> {
        self.read(id, Tournament::all_standings).await
    }

    /// Bracket matches with resolved or placeholder slot names
    pub async fn get_bracket_view(
        &self,
        id: TournamentId,
    ) -> TournamentResult<Vec<BracketMatchView>> {
        self.read(id, Tournament::bracket_view).await
    }

    pub async fn get_final_ranking(
        &self,
        id: TournamentId,
    ) -> TournamentResult<Vec<FinalRankingEntry>> {
        self.read(id, Tournament::final_ranking).await
    }

    /// Pool schedules and bracket in one view
    pub async fn get_matches(&self, id: TournamentId) -> TournamentResult<MatchesView> {
        self.read(id, Tournament::matches_view).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTournamentRepository;
    use crate::tournament::ScheduleConfig;
    use chrono::TimeZone;

    fn manager() -> TournamentManager {
        TournamentManager::new(Arc::new(InMemoryTournamentRepository::new()))
    }

    fn config() -> TournamentConfig {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        TournamentConfig::with_competitor_count(
            "Spring Cup".to_string(),
            6,
            2,
            ScheduleConfig::new(start, 10, 5),
        )
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let manager = manager();
        let id = manager.create_tournament(config()).await.unwrap();

        let tournament = manager.get_tournament(id).await.unwrap();
        assert_eq!(tournament.name, "Spring Cup");
        assert_eq!(manager.get_schedule(id).await.unwrap().len(), 2);
        assert_eq!(manager.get_standings(id, 1).await.unwrap().len(), 3);
        assert_eq!(manager.list_tournaments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_report_is_persisted() {
        let manager = manager();
        let id = manager.create_tournament(config()).await.unwrap();

        manager.report_pool_match_score(id, 1, 4, 2).await.unwrap();
        let schedule = manager.get_pool_schedule(id, 1).await.unwrap();
        assert_eq!(schedule.matches[0].score.map(|s| (s.home, s.visitor)), Some((4, 2)));
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let manager = manager();
        let id = Uuid::new_v4();
        assert!(matches!(
            manager.get_standings(id, 1).await,
            Err(TournamentError::TournamentNotFound(_))
        ));
        assert!(matches!(
            manager.delete_tournament(id).await,
            Err(TournamentError::TournamentNotFound(_))
        ));
        assert!(manager.locks.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_tournament() {
        let manager = manager();
        let id = manager.create_tournament(config()).await.unwrap();
        manager.delete_tournament(id).await.unwrap();
        assert!(manager.get_tournament(id).await.is_err());
        assert!(manager.list_tournaments().await.unwrap().is_empty());
    }
}
