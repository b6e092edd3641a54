//! Check-in orchestration
//!
//! One check-in runs the full decision chain: classify the weight trend,
//! resolve the escalation level from the latest history entry, look up the
//! adjustment proposal, apply it to the stored prescription, and append an
//! immutable history entry. Aborts before any proposal when the profile is
//! incomplete; persists nothing on insufficient weight data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::adherence::{load_week, week_start_for};
use crate::apply::apply_adjustment;
use crate::db::CoachError;
use crate::escalation::resolve_escalation;
use crate::models::history::{PlanHistoryEntry, PlanSnapshot};
use crate::models::profile::{load_profile, save_targets_and_plan, CheckinPlan, Goal, Targets};
use crate::proposal::{propose_adjustment, AdjustmentProposal, Drift};
use crate::trend::{analyze_weight_trend, load_recent_weights, TrendStatus};

/// Everything the check-in screen needs to render the result
#[derive(Debug, Clone, Serialize)]
pub struct CheckinOutcome {
    pub status: TrendStatus,
    pub delta_kg: f64,
    pub level: u8,
    pub proposal: AdjustmentProposal,
    /// Prescription after application (unchanged for a zero proposal)
    pub targets: Targets,
    pub plan: CheckinPlan,
    /// Set when the trend is stagnant but the week's cardio is behind plan
    pub adherence_warning: Option<String>,
    /// Whether a history entry was appended
    pub recorded: bool,
}

/// Execute one check-in at `now`
pub async fn run_checkin(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<CheckinOutcome, CoachError> {
    let profile = load_profile(pool).await?;
    let goal = profile
        .goal
        .ok_or_else(|| CoachError::IncompleteProfile("no goal set".into()))?;
    let targets = profile
        .targets
        .ok_or_else(|| CoachError::IncompleteProfile("no nutrition targets computed".into()))?;
    let plan = profile
        .plan
        .ok_or_else(|| CoachError::IncompleteProfile("no check-in plan computed".into()))?;

    let today = now.date_naive();
    let entries = load_recent_weights(pool, today).await?;
    let trend = analyze_weight_trend(&entries, goal, today);

    if trend.status == TrendStatus::Insufficient {
        tracing::debug!("check-in skipped: fewer than two weight entries in window");
        return Ok(CheckinOutcome {
            status: trend.status,
            delta_kg: 0.0,
            level: 0,
            proposal: AdjustmentProposal::zero(),
            targets,
            plan,
            adherence_warning: None,
            recorded: false,
        });
    }

    let prior = latest_history_entry(pool).await?;
    let level = resolve_escalation(prior.as_ref(), now);

    // Drift picks the Maintenance branch of the policy table
    let drift = if goal == Goal::Maintenance && trend.status == TrendStatus::Stagnant {
        Some(if trend.delta_kg > 0.0 {
            Drift::Up
        } else {
            Drift::Down
        })
    } else {
        None
    };

    let proposal = propose_adjustment(trend.status, goal, level, drift);
    let (new_targets, new_plan) = apply_adjustment(&targets, &plan, &proposal, goal);

    if !proposal.is_zero() {
        save_targets_and_plan(pool, &new_targets, &new_plan).await?;
    }

    // A zero-delta stagnant (or too-fast) check-in is still recorded; the
    // entry is what drives the escalation ladder
    let recorded = !proposal.is_zero() || trend.status != TrendStatus::OnTrack;
    if recorded {
        let snapshot = PlanSnapshot {
            targets: new_targets.clone(),
            checkin: new_plan.clone(),
        };
        append_history(pool, now, trend.status, level, trend.delta_kg, &proposal, &snapshot)
            .await?;
        tracing::info!(
            status = %trend.status,
            level,
            calories_delta = proposal.calories_delta,
            cardio_minutes_delta = proposal.cardio_minutes_delta,
            steps_delta = proposal.steps_delta,
            "check-in executed"
        );
    }

    let week = load_week(pool, week_start_for(today)).await?;
    let adherence_warning = (trend.status == TrendStatus::Stagnant && week.under_target(&plan))
        .then(|| {
            format!(
                "Cardio is behind plan this week ({} of {} LISS sessions, {} of {} minutes); \
                 complete the cardio plan before cutting calories further",
                week.liss_sessions,
                plan.liss_sessions_per_week,
                week.liss_minutes,
                plan.liss_min_per_session * plan.liss_sessions_per_week
            )
        });

    Ok(CheckinOutcome {
        status: trend.status,
        delta_kg: trend.delta_kg,
        level,
        proposal,
        targets: new_targets,
        plan: new_plan,
        adherence_warning,
        recorded,
    })
}

// ---------------------------------------------------------------------------
// History Store
// ---------------------------------------------------------------------------

/// Load the most recent check-in entry, if any
pub async fn latest_history_entry(
    pool: &SqlitePool,
) -> Result<Option<PlanHistoryEntry>, CoachError> {
    let row = sqlx::query(
        r#"
        SELECT id, created_at, status, level, delta_kg,
               calories_delta, cardio_minutes_delta, steps_delta, macro_shift,
               snapshot_json
        FROM plan_history
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to load history: {}", e)))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoachError::Database(format!("Malformed history timestamp: {}", e)))?;

    let status: String = row.get("status");
    let status = status
        .parse()
        .map_err(|e| CoachError::Database(format!("Malformed history row: {}", e)))?;

    let macro_shift: String = row.get("macro_shift");
    let macro_shift = macro_shift
        .parse()
        .map_err(|e| CoachError::Database(format!("Malformed history row: {}", e)))?;

    let level: i64 = row.get("level");
    let snapshot_json: Option<String> = row.get("snapshot_json");

    Ok(Some(PlanHistoryEntry {
        id: row.get("id"),
        created_at,
        status,
        level: level.clamp(0, 2) as u8,
        delta_kg: row.get("delta_kg"),
        proposal: AdjustmentProposal {
            calories_delta: row.get("calories_delta"),
            cardio_minutes_delta: row.get("cardio_minutes_delta"),
            steps_delta: row.get("steps_delta"),
            macro_shift,
        },
        snapshot: snapshot_json.and_then(|json| PlanSnapshot::from_json(&json).ok()),
    }))
}

/// Append one executed check-in to the log
pub async fn append_history(
    pool: &SqlitePool,
    created_at: DateTime<Utc>,
    status: TrendStatus,
    level: u8,
    delta_kg: f64,
    proposal: &AdjustmentProposal,
    snapshot: &PlanSnapshot,
) -> Result<(), CoachError> {
    sqlx::query(
        r#"
        INSERT INTO plan_history
            (created_at, status, level, delta_kg,
             calories_delta, cardio_minutes_delta, steps_delta, macro_shift,
             snapshot_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(created_at.to_rfc3339())
    .bind(status.to_string())
    .bind(level as i64)
    .bind(delta_kg)
    .bind(proposal.calories_delta)
    .bind(proposal.cardio_minutes_delta)
    .bind(proposal.steps_delta)
    .bind(proposal.macro_shift.to_string())
    .bind(snapshot.to_json())
    .execute(pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to append history: {}", e)))?;

    Ok(())
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
