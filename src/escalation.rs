//! Escalation Resolver
//!
//! Turns the most recent check-in record into this run's escalation level.
//! The ladder climbs only on consecutive stagnant check-ins spaced at most
//! four days apart; any wider gap or any non-stagnant result resets it.

use chrono::{DateTime, Utc};

use crate::models::history::PlanHistoryEntry;
use crate::trend::TrendStatus;

/// Maximum spacing (whole days) between stagnant check-ins for the ladder to climb
pub const ESCALATION_WINDOW_DAYS: i64 = 4;

/// Top of the ladder
pub const MAX_ESCALATION_LEVEL: u8 = 2;

/// Resolve the escalation level for a check-in happening at `now`.
///
/// The prior entry is an explicit parameter so the resolver stays pure; the
/// caller supplies the latest stored history row (or None on a fresh
/// profile).
pub fn resolve_escalation(prior: Option<&PlanHistoryEntry>, now: DateTime<Utc>) -> u8 {
    match prior {
        Some(entry)
            if entry.status == TrendStatus::Stagnant
                && (now - entry.created_at).num_days() <= ESCALATION_WINDOW_DAYS =>
        {
            (entry.level + 1).min(MAX_ESCALATION_LEVEL)
        }
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
