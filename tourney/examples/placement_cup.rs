//! Placement Cup Example
//!
//! Runs a small tournament from setup to final ranking without a database.

use chrono::{Duration, Utc};
use tourney::bracket::{BracketMatchTemplate, SlotRef};
use tourney::tournament::{ScheduleConfig, Side, Tournament, TournamentConfig, TournamentResult};
use uuid::Uuid;

fn main() -> TournamentResult<()> {
    println!("=== Placement Cup Example ===\n");

    let start = Utc::now();
    let finals = start + Duration::hours(2);
    let config = TournamentConfig::with_competitor_count(
        "Placement Cup".to_string(),
        6,
        2,
        ScheduleConfig::new(start, 12, 3),
    )
    .with_bracket(vec![
        BracketMatchTemplate::new("F", finals, SlotRef::pool_rank(1, 1), SlotRef::pool_rank(2, 1))
            .with_final_ranks(1, 2),
        BracketMatchTemplate::new("P3", finals, SlotRef::pool_rank(1, 2), SlotRef::pool_rank(2, 2))
            .with_final_ranks(3, 4),
    ]);

    let mut tournament = Tournament::create(Uuid::new_v4(), config, start)?;

    println!("Schedule:");
    for pool in tournament.pool_schedules()? {
        for m in &pool.matches {
            println!(
                "  Pool {} {} {} vs {}",
                pool.pool_name,
                m.kickoff.format("%H:%M"),
                m.home_name,
                m.visitor_name
            );
        }
    }

    // Home side wins every pool match
    let ids: Vec<i64> = tournament.pool_matches.iter().map(|m| m.id).collect();
    for id in ids {
        let report = tournament.report_pool_match_score(id, 2, 1)?;
        if report.pool_completed {
            println!("\nPool {} completed", report.pool_match.pool_index);
        }
    }

    for pool in tournament.all_standings()? {
        println!("\nStandings pool {}:", pool.pool_name);
        for row in &pool.rows {
            println!(
                "  {}. {:<8} P{} W{} D{} L{} GB{:+} {} pts",
                row.rank, row.name, row.played, row.wins, row.draws, row.losses, row.goal_balance, row.points
            );
        }
    }

    tournament.report_bracket_match_score("F", 1, 1, Some(Side::Visitor))?;
    tournament.report_bracket_match_score("P3", 3, 0, None)?;

    println!("\nBracket:");
    for m in tournament.bracket_view()? {
        println!("  {}: {} vs {} {:?}", m.key, m.home.name, m.visitor.name, m.score);
    }

    println!("\nFinal ranking:");
    for entry in tournament.final_ranking()? {
        println!("  {}. {}", entry.rank, entry.label);
    }

    Ok(())
}
