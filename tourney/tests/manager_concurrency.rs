//! Concurrency tests for the tournament manager
//!
//! Reports for one tournament are serialized: each report and its
//! propagation finish before the next one starts.

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tourney::bracket::{BracketMatchTemplate, SlotRef, SlotState};
use tourney::db::InMemoryTournamentRepository;
use tourney::tournament::{ScheduleConfig, TournamentConfig, TournamentManager};

fn config(name: &str, competitors: usize, pool_count: u32) -> TournamentConfig {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    TournamentConfig::with_competitor_count(
        name.to_string(),
        competitors,
        pool_count,
        ScheduleConfig::new(start, 10, 5),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_complete_pool_once() {
    let manager = TournamentManager::new(Arc::new(InMemoryTournamentRepository::new()));
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
    let config = config("Crowded Cup", 10, 1).with_bracket(vec![
        BracketMatchTemplate::new("F", start, SlotRef::pool_rank(1, 1), SlotRef::pool_rank(1, 2))
            .with_final_ranks(1, 2),
    ]);
    let id = manager.create_tournament(config).await.unwrap();

    let matches = manager.get_pool_schedule(id, 1).await.unwrap().matches;
    assert_eq!(matches.len(), 45);

    let mut handles = Vec::new();
    for m in matches {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .report_pool_match_score(id, m.id, (m.id % 4) as i32, 1)
                .await
        }));
    }

    let mut completions = 0;
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        if report.pool_completed {
            completions += 1;
        }
    }
    assert_eq!(completions, 1);

    let tournament = manager.get_tournament(id).await.unwrap();
    assert!(tournament.pool_matches.iter().all(|m| m.score.is_some()));

    let standings = manager.get_standings(id, 1).await.unwrap();
    let final_match = tournament.bracket.get("F").unwrap();
    assert_eq!(
        final_match.home.state,
        SlotState::Resolved(standings[0].competitor_id)
    );
    assert_eq!(
        final_match.visitor.state,
        SlotState::Resolved(standings[1].competitor_id)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tournaments_are_independent() {
    let manager = TournamentManager::new(Arc::new(InMemoryTournamentRepository::new()));
    let first = manager.create_tournament(config("North Cup", 6, 2)).await.unwrap();
    let second = manager.create_tournament(config("South Cup", 6, 2)).await.unwrap();

    let mut handles = Vec::new();
    for id in [first, second] {
        for match_id in 1..=6 {
            let reporter = manager.clone();
            handles.push(tokio::spawn(async move {
                reporter
                    .report_pool_match_score(id, match_id, 2, 0)
                    .await
                    .map(|_| ())
            }));
            let reader = manager.clone();
            handles.push(tokio::spawn(async move {
                reader.get_all_standings(id).await.map(|_| ())
            }));
        }
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    for id in [first, second] {
        let tournament = manager.get_tournament(id).await.unwrap();
        assert!(tournament.pool_matches.iter().all(|m| m.score.is_some()));
    }
    assert_eq!(manager.list_tournaments().await.unwrap().len(), 2);
}
