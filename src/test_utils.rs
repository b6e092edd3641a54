//! Test utilities and helpers
//!
//! Shared infrastructure for the store and orchestration tests: in-memory
//! database setup/teardown, profile seeding, and float assertions.

use sqlx::SqlitePool;

use crate::models::profile::{
  save_profile_info, save_targets_and_plan, ActivityLevel, CheckinPlan, Goal, Sex, Targets,
  UserProfile,
};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Seed Helpers
/// ---------------------------------------------------------------------------

/// Seed a complete fat-loss profile with computed targets and plan
pub async fn seed_test_profile(pool: &SqlitePool) {
  seed_test_profile_with_goal(pool, Goal::FatLoss).await;
}

/// Seed a complete profile with the given goal.
///
/// Targets: 2240 kcal / 144 P / 277 C / 62 F; plan: 10000 steps,
/// 20 min LISS x 3 per week.
pub async fn seed_test_profile_with_goal(pool: &SqlitePool, goal: Goal) {
  let profile = UserProfile {
    goal: Some(goal),
    activity_level: Some(ActivityLevel::Moderate),
    sex: Some(Sex::Male),
    birth_date: chrono::NaiveDate::from_ymd_opt(1995, 6, 1),
    height_cm: Some(178.0),
    targets: None,
    plan: None,
  };
  save_profile_info(pool, &profile)
    .await
    .expect("Failed to seed profile info");

  let targets = Targets {
    calories: 2240.0,
    protein_g: 144.0,
    carbs_g: 277.0,
    fats_g: 62.0,
  };
  let plan = CheckinPlan {
    step_target: 10000,
    liss_min_per_session: 20,
    liss_sessions_per_week: 3,
  };
  save_targets_and_plan(pool, &targets, &plan)
    .await
    .expect("Failed to seed targets");
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN \
       ('user_profile', 'weight_entries', 'plan_history', 'adherence', 'session_summaries')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seeded_profile_is_complete() {
    let pool = setup_test_db().await;
    seed_test_profile(&pool).await;

    let profile = crate::models::profile::load_profile(&pool)
      .await
      .expect("Should load seeded profile");

    assert_eq!(profile.goal, Some(Goal::FatLoss));
    assert!(profile.targets.is_some());
    assert!(profile.plan.is_some());

    teardown_test_db(pool).await;
  }
}
