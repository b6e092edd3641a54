//! Weight trend classification
//!
//! Classifies the trailing week of body-weight entries against the user's
//! goal. Pure and deterministic; re-run on every weight write and on every
//! check-in render.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::CoachError;
use crate::models::profile::Goal;

/// Days of history (inclusive) considered by the analyzer
pub const TREND_WINDOW_DAYS: i64 = 7;

/// Weight changes within this band are noise, not a trend
pub const STAGNANT_BAND_KG: f64 = 0.1;

/// Maintenance-goal band before a change counts as too fast
pub const MAINTENANCE_BAND_KG: f64 = 0.3;

/// ---------------------------------------------------------------------------
/// Weight Entries
/// ---------------------------------------------------------------------------

/// One logged weight per calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeightEntry {
  pub date: NaiveDate,
  pub kg: f64,
}

/// ---------------------------------------------------------------------------
/// Trend Classification
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendStatus {
  /// Fewer than two entries in the window
  Insufficient,
  /// Weight is not moving (or moving against the goal too slowly to count)
  Stagnant,
  OnTrack,
  /// Maintenance only: gaining faster than the band allows
  GainTooFast,
  /// Maintenance only: losing faster than the band allows
  LossTooFast,
}

impl std::fmt::Display for TrendStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Insufficient => write!(f, "insufficient"),
      Self::Stagnant => write!(f, "stagnant"),
      Self::OnTrack => write!(f, "onTrack"),
      Self::GainTooFast => write!(f, "gainTooFast"),
      Self::LossTooFast => write!(f, "lossTooFast"),
    }
  }
}

impl std::str::FromStr for TrendStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "insufficient" => Ok(Self::Insufficient),
      "stagnant" => Ok(Self::Stagnant),
      "onTrack" => Ok(Self::OnTrack),
      "gainTooFast" => Ok(Self::GainTooFast),
      "lossTooFast" => Ok(Self::LossTooFast),
      _ => Err(format!("Unknown trend status: {}", s)),
    }
  }
}

/// Analyzer output: classification plus the raw weekly delta
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTrend {
  pub status: TrendStatus,
  pub delta_kg: f64,
}

/// Classify the trailing-week weight trend against the goal.
///
/// Entries outside `today - TREND_WINDOW_DAYS ..= today` are ignored, so the
/// full history can be passed. Delta is newest minus oldest within the
/// window.
pub fn analyze_weight_trend(entries: &[WeightEntry], goal: Goal, today: NaiveDate) -> WeightTrend {
  let mut window: Vec<&WeightEntry> = entries
    .iter()
    .filter(|e| e.date <= today && (today - e.date).num_days() <= TREND_WINDOW_DAYS)
    .collect();
  window.sort_by_key(|e| e.date);

  if window.len() < 2 {
    return WeightTrend {
      status: TrendStatus::Insufficient,
      delta_kg: 0.0,
    };
  }

  let oldest = window[0].kg;
  let newest = window[window.len() - 1].kg;
  let delta_kg = newest - oldest;

  let status = if delta_kg.abs() <= STAGNANT_BAND_KG {
    TrendStatus::Stagnant
  } else {
    match goal {
      Goal::Maintenance => {
        if delta_kg > MAINTENANCE_BAND_KG {
          TrendStatus::GainTooFast
        } else if delta_kg < -MAINTENANCE_BAND_KG {
          TrendStatus::LossTooFast
        } else {
          TrendStatus::OnTrack
        }
      }
      Goal::FatLoss => {
        if delta_kg >= -STAGNANT_BAND_KG {
          TrendStatus::Stagnant
        } else {
          TrendStatus::OnTrack
        }
      }
      Goal::MuscleGain | Goal::StrengthConditioning => {
        if delta_kg <= STAGNANT_BAND_KG {
          TrendStatus::Stagnant
        } else {
          TrendStatus::OnTrack
        }
      }
    }
  };

  WeightTrend { status, delta_kg }
}

/// ---------------------------------------------------------------------------
/// Weight Store
/// ---------------------------------------------------------------------------

/// Upsert the day's weight entry (one per calendar day, overwrite on re-log)
pub async fn log_weight(pool: &SqlitePool, date: NaiveDate, kg: f64) -> Result<(), CoachError> {
  if !kg.is_finite() || kg <= 0.0 {
    return Err(CoachError::InvalidInput(format!(
      "weight must be positive, got {}",
      kg
    )));
  }

  sqlx::query(
    r#"
    INSERT INTO weight_entries (date, kg, created_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(date) DO UPDATE SET kg = excluded.kg
    "#,
  )
  .bind(date)
  .bind(kg)
  .bind(Utc::now().to_rfc3339())
  .execute(pool)
  .await
  .map_err(|e| CoachError::Database(format!("Failed to log weight: {}", e)))?;

  Ok(())
}

/// Load the entries inside the analyzer window, oldest first
pub async fn load_recent_weights(
  pool: &SqlitePool,
  today: NaiveDate,
) -> Result<Vec<WeightEntry>, CoachError> {
  let since = today - chrono::Duration::days(TREND_WINDOW_DAYS);

  sqlx::query_as::<_, WeightEntry>(
    "SELECT date, kg FROM weight_entries WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC",
  )
  .bind(since)
  .bind(today)
  .fetch_all(pool)
  .await
  .map_err(|e| CoachError::Database(format!("Failed to load weights: {}", e)))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
  }

  fn entries(points: &[(u32, f64)]) -> Vec<WeightEntry> {
    points
      .iter()
      .map(|&(d, kg)| WeightEntry { date: day(d), kg })
      .collect()
  }

  #[test]
  fn test_insufficient_with_fewer_than_two_entries() {
    let trend = analyze_weight_trend(&entries(&[(10, 80.0)]), Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::Insufficient);
    assert_eq!(trend.delta_kg, 0.0);

    let trend = analyze_weight_trend(&[], Goal::Maintenance, day(10));
    assert_eq!(trend.status, TrendStatus::Insufficient);
  }

  #[test]
  fn test_small_delta_is_stagnant_for_every_goal() {
    let history = entries(&[(8, 80.0), (10, 80.05)]);
    for goal in [
      Goal::FatLoss,
      Goal::StrengthConditioning,
      Goal::MuscleGain,
      Goal::Maintenance,
    ] {
      let trend = analyze_weight_trend(&history, goal, day(10));
      assert_eq!(trend.status, TrendStatus::Stagnant, "goal {:?}", goal);
    }
  }

  #[test]
  fn test_fat_loss_classification() {
    // Losing 0.5 kg over the week: on track
    let trend = analyze_weight_trend(&entries(&[(4, 80.5), (10, 80.0)]), Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::OnTrack);
    assert!((trend.delta_kg - -0.5).abs() < 1e-9);

    // Losing only 0.05 kg: stagnant
    let trend = analyze_weight_trend(&entries(&[(4, 80.05), (10, 80.0)]), Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::Stagnant);

    // Gaining on a cut is stagnation, not progress
    let trend = analyze_weight_trend(&entries(&[(4, 80.0), (10, 80.5)]), Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::Stagnant);
  }

  #[test]
  fn test_muscle_gain_classification() {
    let trend = analyze_weight_trend(&entries(&[(4, 80.0), (10, 80.3)]), Goal::MuscleGain, day(10));
    assert_eq!(trend.status, TrendStatus::OnTrack);

    // Losing while trying to gain: stagnant
    let trend = analyze_weight_trend(&entries(&[(4, 80.3), (10, 80.0)]), Goal::MuscleGain, day(10));
    assert_eq!(trend.status, TrendStatus::Stagnant);
  }

  #[test]
  fn test_maintenance_bands() {
    let trend =
      analyze_weight_trend(&entries(&[(4, 80.0), (10, 80.4)]), Goal::Maintenance, day(10));
    assert_eq!(trend.status, TrendStatus::GainTooFast);

    let trend =
      analyze_weight_trend(&entries(&[(4, 80.4), (10, 80.0)]), Goal::Maintenance, day(10));
    assert_eq!(trend.status, TrendStatus::LossTooFast);

    let trend =
      analyze_weight_trend(&entries(&[(4, 80.0), (10, 80.2)]), Goal::Maintenance, day(10));
    assert_eq!(trend.status, TrendStatus::OnTrack);
  }

  #[test]
  fn test_window_excludes_stale_and_future_entries() {
    // Entry from 9 days ago falls outside the window; only one remains
    let history = entries(&[(1, 82.0), (10, 80.0)]);
    let trend = analyze_weight_trend(&history, Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::Insufficient);

    // Future-dated entries are ignored
    let history = entries(&[(8, 80.5), (10, 80.0), (20, 75.0)]);
    let trend = analyze_weight_trend(&history, Goal::FatLoss, day(10));
    assert_eq!(trend.status, TrendStatus::OnTrack);
    assert!((trend.delta_kg - -0.5).abs() < 1e-9);
  }

  #[test]
  fn test_delta_uses_oldest_and_newest_not_extremes() {
    // A mid-week spike does not affect the endpoints
    let history = entries(&[(4, 80.5), (7, 81.5), (10, 80.0)]);
    let trend = analyze_weight_trend(&history, Goal::FatLoss, day(10));
    assert!((trend.delta_kg - -0.5).abs() < 1e-9);
  }

  #[tokio::test]
  async fn test_log_weight_overwrites_same_day() {
    let pool = crate::test_utils::setup_test_db().await;

    log_weight(&pool, day(10), 80.0).await.expect("Should log");
    log_weight(&pool, day(10), 79.6)
      .await
      .expect("Should overwrite");

    let weights = load_recent_weights(&pool, day(10))
      .await
      .expect("Should load");
    assert_eq!(weights.len(), 1);
    assert_eq!(weights[0].kg, 79.6);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_weight_rejects_invalid_values() {
    let pool = crate::test_utils::setup_test_db().await;

    assert!(log_weight(&pool, day(10), 0.0).await.is_err());
    assert!(log_weight(&pool, day(10), f64::NAN).await.is_err());
    assert!(log_weight(&pool, day(10), -5.0).await.is_err());

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_load_recent_weights_windowing() {
    let pool = crate::test_utils::setup_test_db().await;

    log_weight(&pool, day(1), 82.0).await.expect("Should log");
    log_weight(&pool, day(5), 81.0).await.expect("Should log");
    log_weight(&pool, day(10), 80.0).await.expect("Should log");

    let weights = load_recent_weights(&pool, day(10))
      .await
      .expect("Should load");

    // day 1 is outside the 7-day window
    assert_eq!(weights.len(), 2);
    assert_eq!(weights[0].date, day(5));
    assert_eq!(weights[1].date, day(10));

    crate::test_utils::teardown_test_db(pool).await;
  }
}
