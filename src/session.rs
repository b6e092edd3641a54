//! Cardio Interval Session Engine
//!
//! Drives a live cardio workout through its planned intervals: a 1 Hz timer
//! advances the current interval, user actions (start/pause, skip, prev,
//! finish) reshape the run, and every planned interval accumulates a log the
//! user can correct while the session is live. The finished session is scored
//! for LISS qualification and folded into the weekly adherence record, which
//! the next check-in reads back.
//!
//! One mutable session exists per live workout. Aborting the workout is
//! expressed by dropping the session without calling [`complete_session`];
//! nothing is persisted in that case.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::adherence::{self, week_start_for, Adherence};
use crate::db::CoachError;
use crate::models::profile::load_profile;

/// Timer cadence driving automatic interval advancement
pub const TICK_SECONDS: u64 = 1;

/// Modes whose single-interval steady sessions count as LISS without an
/// explicit flag or label
pub const STEADY_STATE_MODES: [&str; 6] =
    ["treadmill", "stairmaster", "bike", "run", "row", "rower"];

// ---------------------------------------------------------------------------
/// Plan Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Steady,
    Interval,
}

/// Target heart-rate band for an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrRange {
    pub min: i64,
    pub max: i64,
}

impl HrRange {
    pub fn midpoint(&self) -> i64 {
        (self.min + self.max) / 2
    }
}

/// One planned interval of a cardio workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioInterval {
    pub kind: IntervalKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub duration_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hr: Option<HrRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_incline_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_level: Option<i64>,
}

impl CardioInterval {
    /// A plain steady block with no targets
    pub fn steady(duration_sec: f64, label: Option<String>) -> Self {
        Self {
            kind: IntervalKind::Steady,
            label,
            duration_sec,
            target_hr: None,
            target_speed_kmh: None,
            target_incline_pct: None,
            target_level: None,
        }
    }

    /// Planned duration in whole seconds; malformed values collapse to 0 so
    /// a live session never stalls on bad data
    pub fn planned_duration_sec(&self) -> i64 {
        if self.duration_sec.is_finite() && self.duration_sec > 0.0 {
            self.duration_sec.round() as i64
        } else {
            0
        }
    }
}

/// A workout template. Immutable during a session; the engine works on its
/// own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioPlan {
    pub mode: String,
    pub intervals: Vec<CardioInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_sec: Option<f64>,
}

impl CardioPlan {
    /// The intervals a session actually runs: the planned list plus the
    /// implicit cooldown block when one is configured
    fn session_intervals(&self) -> Vec<CardioInterval> {
        let mut intervals = self.intervals.clone();
        if let Some(cooldown) = self.cooldown_sec {
            intervals.push(CardioInterval::steady(cooldown, Some("Cooldown".into())));
        }
        intervals
    }
}

// ---------------------------------------------------------------------------
/// Session State
// ---------------------------------------------------------------------------

/// Per-interval log. Editable fields start prefilled from the planned
/// targets and may be corrected while the session is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedInterval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub actual_time_sec: i64,
    pub avg_hr: Option<i64>,
    pub speed_kmh: Option<f64>,
    pub incline_pct: Option<f64>,
    pub level: Option<i64>,
}

impl LoggedInterval {
    fn prefilled(interval: &CardioInterval) -> Self {
        Self {
            label: interval.label.clone(),
            actual_time_sec: 0,
            avg_hr: interval.target_hr.map(|hr| hr.midpoint()),
            speed_kmh: interval.target_speed_kmh,
            incline_pct: interval.target_incline_pct,
            level: interval.target_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    Paused,
    Complete,
}

/// Computed totals for a finished (or finishing) session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_time_sec: i64,
    pub total_distance_km: f64,
    pub avg_hr: Option<i64>,
}

/// Runtime state of one live cardio workout.
///
/// Single-threaded cooperative: the timer tick and every user action mutate
/// the session through one `&mut` owner (behind a mutex when driven by
/// [`drive_session`]).
#[derive(Debug, Clone)]
pub struct CardioSession {
    plan: CardioPlan,
    intervals: Vec<CardioInterval>,
    index: usize,
    elapsed_sec: i64,
    phase: SessionPhase,
    logs: Vec<LoggedInterval>,
    count_as_liss: bool,
}

impl CardioSession {
    pub fn new(plan: CardioPlan) -> Self {
        let intervals = plan.session_intervals();
        let logs = intervals.iter().map(LoggedInterval::prefilled).collect();
        Self {
            plan,
            intervals,
            index: 0,
            elapsed_sec: 0,
            phase: SessionPhase::Idle,
            logs,
            count_as_liss: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn elapsed_sec(&self) -> i64 {
        self.elapsed_sec
    }

    pub fn current_interval(&self) -> Option<&CardioInterval> {
        self.intervals.get(self.index)
    }

    pub fn logs(&self) -> &[LoggedInterval] {
        &self.logs
    }

    pub fn mode(&self) -> &str {
        &self.plan.mode
    }

    /// Explicitly count this session as LISS regardless of its shape
    pub fn set_count_as_liss(&mut self, flag: bool) {
        self.count_as_liss = flag;
    }

    /// Manual correction of a logged interval. Logs freeze once the session
    /// completes.
    pub fn log_mut(&mut self, index: usize) -> Option<&mut LoggedInterval> {
        if self.phase == SessionPhase::Complete {
            return None;
        }
        self.logs.get_mut(index)
    }

    /// Start/Pause toggle
    pub fn toggle(&mut self) {
        self.phase = match self.phase {
            SessionPhase::Idle | SessionPhase::Paused => SessionPhase::Running,
            SessionPhase::Running => SessionPhase::Paused,
            SessionPhase::Complete => SessionPhase::Complete,
        };
    }

    /// One second of wall clock. Only advances while running; at the planned
    /// duration the interval is finalized at that duration (never the
    /// overshoot) and the pointer moves on.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let Some(interval) = self.intervals.get(self.index) else {
            self.phase = SessionPhase::Complete;
            return;
        };

        self.elapsed_sec += 1;

        let planned = interval.planned_duration_sec();
        if self.elapsed_sec >= planned {
            self.finalize_current(planned);
            self.advance();
        }
    }

    /// Finalize the current interval at its elapsed time and move on
    pub fn skip(&mut self) {
        if self.phase == SessionPhase::Complete {
            return;
        }
        self.finalize_current(self.elapsed_sec);
        self.advance();
    }

    /// Step back one interval and re-run it from zero
    pub fn prev(&mut self) {
        if self.phase == SessionPhase::Complete || self.index == 0 {
            return;
        }
        self.index -= 1;
        self.elapsed_sec = 0;
        if let Some(log) = self.logs.get_mut(self.index) {
            log.actual_time_sec = 0;
        }
    }

    /// End the workout from any state, keeping whatever was done so far
    pub fn finish(&mut self) {
        if self.phase == SessionPhase::Complete {
            return;
        }
        self.finalize_current(self.elapsed_sec);
        self.phase = SessionPhase::Complete;
    }

    fn finalize_current(&mut self, at_sec: i64) {
        if let Some(log) = self.logs.get_mut(self.index) {
            log.actual_time_sec = at_sec.max(0);
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        self.elapsed_sec = 0;
        if self.index >= self.intervals.len() {
            self.phase = SessionPhase::Complete;
        }
    }

    /// Totals over the logged intervals. Distance counts only intervals with
    /// a known speed; average HR is the time-weighted mean over intervals
    /// reporting one.
    pub fn summary(&self) -> SessionSummary {
        let total_time_sec: i64 = self.logs.iter().map(|l| l.actual_time_sec).sum();

        let total_distance_km: f64 = self
            .logs
            .iter()
            .filter_map(|l| l.speed_kmh.map(|s| s * l.actual_time_sec as f64 / 3600.0))
            .sum();

        let (hr_weighted, hr_time) = self
            .logs
            .iter()
            .filter_map(|l| l.avg_hr.map(|hr| (hr as f64 * l.actual_time_sec as f64, l.actual_time_sec)))
            .fold((0.0, 0_i64), |(w, t), (hw, ht)| (w + hw, t + ht));

        let avg_hr = if total_time_sec == 0 || hr_time == 0 {
            None
        } else {
            Some((hr_weighted / hr_time as f64).round() as i64)
        };

        SessionSummary {
            total_time_sec,
            total_distance_km,
            avg_hr,
        }
    }

    /// LISS qualification: the explicit flag, a single steady interval in a
    /// steady-state mode, or any interval labeled "liss"
    pub fn qualifies_as_liss(&self) -> bool {
        if self.count_as_liss {
            return true;
        }

        let mode = self.plan.mode.to_lowercase();
        if self.plan.intervals.len() == 1
            && self.plan.intervals[0].kind == IntervalKind::Steady
            && STEADY_STATE_MODES.contains(&mode.as_str())
        {
            return true;
        }

        self.intervals.iter().any(|i| {
            i.label
                .as_ref()
                .is_some_and(|label| label.to_lowercase().contains("liss"))
        })
    }
}

// ---------------------------------------------------------------------------
/// Timer Driver
// ---------------------------------------------------------------------------

/// Drive a session at the 1 Hz tick cadence until it completes.
///
/// The mutex is the single mutable-state owner: user actions lock the same
/// session, so no tick and no action ever interleave mid-mutation. Aborting
/// the driving task cancels the workout; state is simply dropped.
pub async fn drive_session(session: Arc<Mutex<CardioSession>>) {
    let mut ticker = interval(Duration::from_secs(TICK_SECONDS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; consume it so ticking starts one
    // period from now
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let mut session = session.lock().await;
        if session.is_complete() {
            break;
        }
        session.tick();
    }
}

// ---------------------------------------------------------------------------
/// Session Completion
// ---------------------------------------------------------------------------

/// Result of persisting a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    pub counted_as_liss: bool,
    pub adherence: Adherence,
}

/// Persist a finished session: append the summary row and fold the outcome
/// into the week's adherence record, using the LISS-minute threshold in
/// force at write time.
pub async fn complete_session(
    pool: &SqlitePool,
    session: &CardioSession,
    finished_at: DateTime<Utc>,
) -> Result<SessionOutcome, CoachError> {
    if !session.is_complete() {
        return Err(CoachError::InvalidInput(
            "session must be finished before it is recorded".into(),
        ));
    }

    let summary = session.summary();
    let counted_as_liss = session.qualifies_as_liss();

    let logs_json = serde_json::to_string(session.logs())
        .map_err(|e| CoachError::InvalidInput(format!("Failed to serialize logs: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO session_summaries
            (completed_at, mode, total_time_seconds, total_distance_km, avg_hr, counted_as_liss, logs_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(finished_at.to_rfc3339())
    .bind(session.mode())
    .bind(summary.total_time_sec)
    .bind(summary.total_distance_km)
    .bind(summary.avg_hr)
    .bind(counted_as_liss)
    .bind(&logs_json)
    .execute(pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to save session: {}", e)))?;

    let threshold = load_profile(pool)
        .await?
        .plan
        .map(|p| p.liss_min_per_session)
        .unwrap_or(0);

    let week_start = week_start_for(finished_at.date_naive());
    let adherence = adherence::record_session(
        pool,
        week_start,
        summary.total_time_sec,
        counted_as_liss,
        threshold,
    )
    .await?;

    tracing::info!(
        mode = session.mode(),
        total_time_sec = summary.total_time_sec,
        counted_as_liss,
        "cardio session recorded"
    );

    Ok(SessionOutcome {
        summary,
        counted_as_liss,
        adherence,
    })
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
