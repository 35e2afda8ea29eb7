//! Sequential kickoff time assignment.

use chrono::{DateTime, Utc};

use crate::tournament::errors::{TournamentError, TournamentResult};
use crate::tournament::models::ScheduleConfig;

/// Kickoff times for `count` back-to-back matches.
///
/// The first match starts at the configured start time; every following one
/// starts one match duration plus one break later.
///
/// # Errors
///
/// Returns [`TournamentError::InvalidSetup`] when a kickoff falls outside the
/// representable date range.
pub fn kickoff_times(
    schedule: &ScheduleConfig,
    count: usize,
) -> TournamentResult<Vec<DateTime<Utc>>> {
    let step = schedule.slot_length();
    let mut kickoffs = Vec::with_capacity(count);
    let mut next = schedule.start_time;
    for k in 0..count {
        if k > 0 {
            next = next.checked_add_signed(step).ok_or_else(|| {
                TournamentError::InvalidSetup(format!(
                    "kickoff of match {} is out of the supported date range",
                    k + 1
                ))
            })?;
        }
        kickoffs.push(next);
    }
    Ok(kickoffs)
}
