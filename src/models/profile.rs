use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::db::CoachError;

/// ---------------------------------------------------------------------------
/// Goal / Body Data Enums
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  FatLoss,
  StrengthConditioning,
  MuscleGain,
  Maintenance,
}

impl std::fmt::Display for Goal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::FatLoss => write!(f, "fat_loss"),
      Self::StrengthConditioning => write!(f, "strength_conditioning"),
      Self::MuscleGain => write!(f, "muscle_gain"),
      Self::Maintenance => write!(f, "maintenance"),
    }
  }
}

impl std::str::FromStr for Goal {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "fat_loss" => Ok(Self::FatLoss),
      "strength_conditioning" => Ok(Self::StrengthConditioning),
      "muscle_gain" => Ok(Self::MuscleGain),
      "maintenance" => Ok(Self::Maintenance),
      _ => Err(format!("Unknown goal: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
  Male,
  Female,
}

impl std::str::FromStr for Sex {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" => Ok(Self::Male),
      "female" => Ok(Self::Female),
      _ => Err(format!("Unknown sex: {}", s)),
    }
  }
}

impl std::fmt::Display for Sex {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Male => write!(f, "male"),
      Self::Female => write!(f, "female"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
  Sedentary,
  Light,
  Moderate,
  Active,
}

impl ActivityLevel {
  /// TDEE multiplier applied to BMR
  pub fn multiplier(&self) -> f64 {
    match self {
      Self::Sedentary => 1.2,
      Self::Light => 1.375,
      Self::Moderate => 1.55,
      Self::Active => 1.725,
    }
  }
}

impl std::fmt::Display for ActivityLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Sedentary => write!(f, "sedentary"),
      Self::Light => write!(f, "light"),
      Self::Moderate => write!(f, "moderate"),
      Self::Active => write!(f, "active"),
    }
  }
}

impl std::str::FromStr for ActivityLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sedentary" => Ok(Self::Sedentary),
      "light" => Ok(Self::Light),
      "moderate" => Ok(Self::Moderate),
      "active" => Ok(Self::Active),
      _ => Err(format!("Unknown activity level: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Targets & Check-in Plan
/// ---------------------------------------------------------------------------

/// Current nutrition prescription. All fields are kept >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
  pub calories: f64,
  pub protein_g: f64,
  pub carbs_g: f64,
  pub fats_g: f64,
}

/// Current cardio/step prescription. All fields are kept >= 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinPlan {
  pub step_target: i64,
  pub liss_min_per_session: i64,
  pub liss_sessions_per_week: i64,
}

/// ---------------------------------------------------------------------------
/// User Profile
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
  pub goal: Option<Goal>,
  pub activity_level: Option<ActivityLevel>,
  pub sex: Option<Sex>,
  pub birth_date: Option<NaiveDate>,
  pub height_cm: Option<f64>,
  pub targets: Option<Targets>,
  pub plan: Option<CheckinPlan>,
}

impl UserProfile {
  /// Age in whole years on the given date
  pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
    self.birth_date.and_then(|b| date.years_since(b))
  }

  /// Compute the starting nutrition targets and cardio plan from body data.
  ///
  /// Mifflin-St Jeor BMR, activity-scaled TDEE, goal offset; protein 1.8 g/kg,
  /// fat 25% of calories, carbs the remainder. The only mutation path for
  /// `Targets` other than a check-in adjustment.
  pub fn initial_prescription(
    &self,
    weight_kg: f64,
    today: NaiveDate,
  ) -> Result<(Targets, CheckinPlan), CoachError> {
    let goal = self
      .goal
      .ok_or_else(|| CoachError::IncompleteProfile("no goal set".into()))?;
    let activity = self
      .activity_level
      .ok_or_else(|| CoachError::IncompleteProfile("no activity level set".into()))?;
    let sex = self
      .sex
      .ok_or_else(|| CoachError::IncompleteProfile("no sex set".into()))?;
    let height_cm = self
      .height_cm
      .ok_or_else(|| CoachError::IncompleteProfile("no height set".into()))?;
    let age = self
      .age_on(today)
      .ok_or_else(|| CoachError::IncompleteProfile("no birth date set".into()))?;

    if !weight_kg.is_finite() || weight_kg <= 0.0 {
      return Err(CoachError::InvalidInput(format!(
        "weight must be positive, got {}",
        weight_kg
      )));
    }

    let sex_term = match sex {
      Sex::Male => 5.0,
      Sex::Female => -161.0,
    };
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + sex_term;
    let tdee = bmr * activity.multiplier();

    let goal_offset = match goal {
      Goal::FatLoss => -500.0,
      Goal::MuscleGain => 300.0,
      Goal::StrengthConditioning => 150.0,
      Goal::Maintenance => 0.0,
    };

    let calories = (tdee + goal_offset).max(0.0).round();
    let protein_g = (1.8 * weight_kg).round();
    let fats_g = (calories * 0.25 / 9.0).round();
    let carbs_g = ((calories - protein_g * 4.0 - fats_g * 9.0) / 4.0)
      .max(0.0)
      .round();

    let targets = Targets {
      calories,
      protein_g,
      carbs_g,
      fats_g,
    };

    let plan = match goal {
      Goal::FatLoss => CheckinPlan {
        step_target: 10000,
        liss_min_per_session: 30,
        liss_sessions_per_week: 3,
      },
      Goal::StrengthConditioning => CheckinPlan {
        step_target: 9000,
        liss_min_per_session: 20,
        liss_sessions_per_week: 2,
      },
      Goal::MuscleGain | Goal::Maintenance => CheckinPlan {
        step_target: 8000,
        liss_min_per_session: 20,
        liss_sessions_per_week: 2,
      },
    };

    Ok((targets, plan))
  }
}

/// Compute the starting prescription from the stored profile and persist it.
/// Used once at onboarding; afterwards only check-in adjustments touch the
/// targets.
pub async fn initialize_prescription(
  pool: &SqlitePool,
  weight_kg: f64,
  today: NaiveDate,
) -> Result<(Targets, CheckinPlan), CoachError> {
  let profile = load_profile(pool).await?;
  let (targets, plan) = profile.initial_prescription(weight_kg, today)?;
  save_targets_and_plan(pool, &targets, &plan).await?;

  tracing::info!(
    calories = targets.calories,
    step_target = plan.step_target,
    "initial prescription computed"
  );

  Ok((targets, plan))
}

/// ---------------------------------------------------------------------------
/// Profile Store
/// ---------------------------------------------------------------------------

/// Load the profile row, or an empty profile if none has been written yet
pub async fn load_profile(pool: &SqlitePool) -> Result<UserProfile, CoachError> {
  let row = sqlx::query(
    r#"
    SELECT goal, activity_level, sex, birth_date, height_cm,
           calories, protein_g, carbs_g, fats_g,
           step_target, liss_min_per_session, liss_sessions_per_week
    FROM user_profile WHERE id = 1
    "#,
  )
  .fetch_optional(pool)
  .await
  .map_err(|e| CoachError::Database(format!("Failed to load profile: {}", e)))?;

  let Some(row) = row else {
    return Ok(UserProfile::default());
  };

  let goal: Option<String> = row.get("goal");
  let activity: Option<String> = row.get("activity_level");
  let sex: Option<String> = row.get("sex");
  let birth_date: Option<String> = row.get("birth_date");

  let calories: Option<f64> = row.get("calories");
  let protein_g: Option<f64> = row.get("protein_g");
  let carbs_g: Option<f64> = row.get("carbs_g");
  let fats_g: Option<f64> = row.get("fats_g");
  let targets = match (calories, protein_g, carbs_g, fats_g) {
    (Some(calories), Some(protein_g), Some(carbs_g), Some(fats_g)) => Some(Targets {
      calories,
      protein_g,
      carbs_g,
      fats_g,
    }),
    _ => None,
  };

  let step_target: Option<i64> = row.get("step_target");
  let liss_min: Option<i64> = row.get("liss_min_per_session");
  let liss_sessions: Option<i64> = row.get("liss_sessions_per_week");
  let plan = match (step_target, liss_min, liss_sessions) {
    (Some(step_target), Some(liss_min_per_session), Some(liss_sessions_per_week)) => {
      Some(CheckinPlan {
        step_target,
        liss_min_per_session,
        liss_sessions_per_week,
      })
    }
    _ => None,
  };

  Ok(UserProfile {
    goal: goal.and_then(|s| s.parse().ok()),
    activity_level: activity.and_then(|s| s.parse().ok()),
    sex: sex.and_then(|s| s.parse().ok()),
    birth_date: birth_date.and_then(|s| s.parse().ok()),
    height_cm: row.get("height_cm"),
    targets,
    plan,
  })
}

/// Upsert the descriptive profile fields (goal, activity, body data)
pub async fn save_profile_info(
  pool: &SqlitePool,
  profile: &UserProfile,
) -> Result<(), CoachError> {
  sqlx::query(
    r#"
    INSERT INTO user_profile (id, goal, activity_level, sex, birth_date, height_cm, updated_at)
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(id) DO UPDATE SET
      goal = excluded.goal,
      activity_level = excluded.activity_level,
      sex = excluded.sex,
      birth_date = excluded.birth_date,
      height_cm = excluded.height_cm,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(profile.goal.map(|g| g.to_string()))
  .bind(profile.activity_level.map(|a| a.to_string()))
  .bind(profile.sex.map(|s| s.to_string()))
  .bind(profile.birth_date.map(|d| d.to_string()))
  .bind(profile.height_cm)
  .bind(Utc::now().to_rfc3339())
  .execute(pool)
  .await
  .map_err(|e| CoachError::Database(format!("Failed to save profile: {}", e)))?;

  Ok(())
}

/// Write the current targets and check-in plan back to the profile row
pub async fn save_targets_and_plan(
  pool: &SqlitePool,
  targets: &Targets,
  plan: &CheckinPlan,
) -> Result<(), CoachError> {
  sqlx::query(
    r#"
    INSERT INTO user_profile (id, calories, protein_g, carbs_g, fats_g,
                              step_target, liss_min_per_session, liss_sessions_per_week,
                              updated_at)
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
      calories = excluded.calories,
      protein_g = excluded.protein_g,
      carbs_g = excluded.carbs_g,
      fats_g = excluded.fats_g,
      step_target = excluded.step_target,
      liss_min_per_session = excluded.liss_min_per_session,
      liss_sessions_per_week = excluded.liss_sessions_per_week,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(targets.calories)
  .bind(targets.protein_g)
  .bind(targets.carbs_g)
  .bind(targets.fats_g)
  .bind(plan.step_target)
  .bind(plan.liss_min_per_session)
  .bind(plan.liss_sessions_per_week)
  .bind(Utc::now().to_rfc3339())
  .execute(pool)
  .await
  .map_err(|e| CoachError::Database(format!("Failed to save targets: {}", e)))?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
