//! Weekly Adherence Aggregator
//!
//! Accumulates completed cardio sessions into per-week counters keyed by the
//! ISO week start. Counters only ever grow within a week; a new week starts a
//! fresh zero record. The check-in screen reads the current week back to warn
//! before calories are cut while the cardio plan is still unmet.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::db::CoachError;
use crate::models::profile::CheckinPlan;

/// Per-week adherence counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adherence {
    pub week_start: NaiveDate,
    pub liss_minutes: i64,
    pub liss_sessions: i64,
    pub sessions_total: i64,
}

impl Adherence {
    pub fn empty(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            liss_minutes: 0,
            liss_sessions: 0,
            sessions_total: 0,
        }
    }

    /// True when the week is behind the cardio prescription, either on
    /// accumulated LISS minutes or on session count
    pub fn under_target(&self, plan: &CheckinPlan) -> bool {
        let weekly_minutes_goal = plan.liss_min_per_session * plan.liss_sessions_per_week;
        self.liss_minutes < weekly_minutes_goal || self.liss_sessions < plan.liss_sessions_per_week
    }
}

/// Monday of the ISO week containing `date`
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Whole minutes from seconds
pub fn minutes_from_seconds(seconds: i64) -> i64 {
    seconds / 60
}

// ---------------------------------------------------------------------------
/// Adherence Store
// ---------------------------------------------------------------------------

/// Load the record for a week, zero if nothing has been folded in yet
pub async fn load_week(pool: &SqlitePool, week_start: NaiveDate) -> Result<Adherence, CoachError> {
    let row = sqlx::query(
        "SELECT liss_minutes, liss_sessions, sessions_total FROM adherence WHERE week_start = ?1",
    )
    .bind(week_start)
    .fetch_optional(pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to load adherence: {}", e)))?;

    Ok(match row {
        Some(row) => Adherence {
            week_start,
            liss_minutes: row.get("liss_minutes"),
            liss_sessions: row.get("liss_sessions"),
            sessions_total: row.get("sessions_total"),
        },
        None => Adherence::empty(week_start),
    })
}

/// Fold one completed cardio session into its week.
///
/// `sessions_total` always increments. LISS minutes are added only for
/// LISS-eligible sessions, and the session counts toward `liss_sessions`
/// only when those minutes meet the per-session threshold in force at write
/// time. The additive UPSERT makes concurrent folds from two devices merge
/// instead of overwriting each other.
pub async fn record_session(
    pool: &SqlitePool,
    week_start: NaiveDate,
    total_time_sec: i64,
    liss_eligible: bool,
    liss_min_threshold: i64,
) -> Result<Adherence, CoachError> {
    let minutes = minutes_from_seconds(total_time_sec.max(0));
    let liss_minutes = if liss_eligible { minutes } else { 0 };
    let liss_sessions = i64::from(liss_eligible && minutes >= liss_min_threshold);

    sqlx::query(
        r#"
        INSERT INTO adherence (week_start, liss_minutes, liss_sessions, sessions_total)
        VALUES (?1, ?2, ?3, 1)
        ON CONFLICT(week_start) DO UPDATE SET
          liss_minutes = liss_minutes + excluded.liss_minutes,
          liss_sessions = liss_sessions + excluded.liss_sessions,
          sessions_total = sessions_total + excluded.sessions_total
        "#,
    )
    .bind(week_start)
    .bind(liss_minutes)
    .bind(liss_sessions)
    .execute(pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to record session: {}", e)))?;

    load_week(pool, week_start).await
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
