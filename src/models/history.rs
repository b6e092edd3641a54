use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::profile::{CheckinPlan, Targets};
use crate::proposal::AdjustmentProposal;
use crate::trend::TrendStatus;

/// Prescription state captured after a check-in was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
  pub targets: Targets,
  pub checkin: CheckinPlan,
}

impl PlanSnapshot {
  pub fn from_json(json: &str) -> Result<Self, String> {
    serde_json::from_str(json).map_err(|e| format!("Failed to parse plan snapshot: {}", e))
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string(self).unwrap_or_default()
  }
}

/// One executed check-in. Append-only; immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHistoryEntry {
  pub id: i64,
  pub created_at: DateTime<Utc>,
  pub status: TrendStatus,
  /// Escalation level the check-in ran at (0..=2)
  pub level: u8,
  /// Weekly weight delta the analyzer saw
  pub delta_kg: f64,
  pub proposal: AdjustmentProposal,
  pub snapshot: Option<PlanSnapshot>,
}
