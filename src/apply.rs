//! Adjustment Applier
//!
//! Folds a proposal into the current targets and check-in plan, returning
//! fresh copies. Inputs are never mutated; every numeric field floors at 0.

use crate::models::profile::{CheckinPlan, Goal, Targets};
use crate::proposal::AdjustmentProposal;

/// Apply a proposal to the current prescription.
///
/// A non-zero calorie delta also shifts carbohydrates by a quarter of the
/// delta in grams (4 kcal per gram), whichever macro-shift tag the proposal
/// carries. The goal is accepted for symmetry with the proposer but does not
/// influence application.
pub fn apply_adjustment(
  targets: &Targets,
  plan: &CheckinPlan,
  proposal: &AdjustmentProposal,
  _goal: Goal,
) -> (Targets, CheckinPlan) {
  let mut new_targets = targets.clone();
  let mut new_plan = plan.clone();

  if proposal.calories_delta != 0 {
    new_targets.calories = (targets.calories + proposal.calories_delta as f64)
      .round()
      .max(0.0);

    let carb_shift = (proposal.calories_delta as f64 / 4.0).round();
    new_targets.carbs_g = (targets.carbs_g + carb_shift).max(0.0);
  }

  new_plan.liss_min_per_session =
    (plan.liss_min_per_session + proposal.cardio_minutes_delta).max(0);
  new_plan.step_target = (plan.step_target + proposal.steps_delta).max(0);

  (new_targets, new_plan)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
