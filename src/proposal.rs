//! Adjustment Proposer
//!
//! The numeric policy for what a check-in is allowed to change. Pure lookup:
//! `(status, goal, level, drift)` in, a delta proposal out. Only stagnation
//! ever produces a non-zero proposal; the ladder runs nudge-cardio (level 0),
//! adjust-calories (level 1), cut-steps (level 2).

use serde::{Deserialize, Serialize};

use crate::models::profile::Goal;
use crate::trend::TrendStatus;

// ---------------------------------------------------------------------------
/// Macro Shift Tag
// ---------------------------------------------------------------------------

/// Which macro absorbs a calorie change. Both tags currently route through
/// the same carbohydrate shift; the tag is carried for labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MacroShift {
    Carbs,
    #[default]
    None,
}

impl std::fmt::Display for MacroShift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Carbs => write!(f, "carbs"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for MacroShift {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carbs" => Ok(Self::Carbs),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown macro shift: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
/// Drift: Maintenance-only direction of the weekly delta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drift {
    Up,
    Down,
}

// ---------------------------------------------------------------------------
/// Adjustment Proposal
// ---------------------------------------------------------------------------

/// Ephemeral deltas produced and consumed within one check-in cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdjustmentProposal {
    pub calories_delta: i64,
    pub cardio_minutes_delta: i64,
    pub steps_delta: i64,
    pub macro_shift: MacroShift,
}

impl AdjustmentProposal {
    pub fn zero() -> Self {
        Self::default()
    }

    /// True when the proposal changes nothing (the tag alone does not count)
    pub fn is_zero(&self) -> bool {
        self.calories_delta == 0 && self.cardio_minutes_delta == 0 && self.steps_delta == 0
    }
}

/// Compute the adjustment for one check-in.
///
/// | status   | goal                | level          | kcal | cardio | steps | shift |
/// |----------|---------------------|----------------|------|--------|-------|-------|
/// | stagnant | FatLoss             | 0              |    0 |     +5 |     0 | none  |
/// | stagnant | MuscleGain/Strength | 0              |    0 |     -5 |     0 | none  |
/// | stagnant | FatLoss             | 1              | -100 |      0 |     0 | carbs |
/// | stagnant | MuscleGain/Strength | 1              | +100 |      0 |     0 | none  |
/// | stagnant | Maintenance         | 1, drift up    | +100 |      0 |     0 | none  |
/// | stagnant | Maintenance         | 1, drift down  | -100 |      0 |     0 | carbs |
/// | stagnant | non-Maintenance     | 2              |    0 |      0 |  -700 | none  |
///
/// Everything else is the zero proposal. `drift` is only meaningful for
/// Maintenance and is ignored otherwise.
pub fn propose_adjustment(
    status: TrendStatus,
    goal: Goal,
    level: u8,
    drift: Option<Drift>,
) -> AdjustmentProposal {
    if status != TrendStatus::Stagnant {
        return AdjustmentProposal::zero();
    }

    match (goal, level) {
        (Goal::FatLoss, 0) => AdjustmentProposal {
            cardio_minutes_delta: 5,
            ..Default::default()
        },
        (Goal::MuscleGain | Goal::StrengthConditioning, 0) => AdjustmentProposal {
            cardio_minutes_delta: -5,
            ..Default::default()
        },
        (Goal::FatLoss, 1) => AdjustmentProposal {
            calories_delta: -100,
            macro_shift: MacroShift::Carbs,
            ..Default::default()
        },
        (Goal::MuscleGain | Goal::StrengthConditioning, 1) => AdjustmentProposal {
            calories_delta: 100,
            ..Default::default()
        },
        (Goal::Maintenance, 1) => match drift {
            Some(Drift::Up) => AdjustmentProposal {
                calories_delta: 100,
                ..Default::default()
            },
            Some(Drift::Down) => AdjustmentProposal {
                calories_delta: -100,
                macro_shift: MacroShift::Carbs,
                ..Default::default()
            },
            None => AdjustmentProposal::zero(),
        },
        (Goal::FatLoss | Goal::MuscleGain | Goal::StrengthConditioning, 2) => {
            AdjustmentProposal {
                steps_delta: -700,
                ..Default::default()
            }
        }
        // Maintenance never reaches the step cut, and anything past the
        // ladder is a no-op
        _ => AdjustmentProposal::zero(),
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
